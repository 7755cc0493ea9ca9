use std::fmt::Debug;

use log::*;

use crate::{
    booking_api::{
        booking_objects::{BookingDetails, ReconciliationOutcome},
        errors::{ReconciliationError, RejectionReason},
        number_generator::ReservationNumberGenerator,
    },
    db_types::{PaymentReference, Reservation, Tenant, TenantId},
    events::{EventProducers, ReservationCreatedEvent},
    traits::{BookingDatabase, PaymentGateway, RemoteSequence, ReservationStoreError, VerifiedPayment},
};

/// `ReconciliationApi` turns a payment into exactly one confirmed reservation.
///
/// Both entry points, the gateway webhook and the payer's confirmation call, go through [`Self::reconcile`]. The flow
/// is:
/// 1. **Verify.** The payment is fetched from the gateway. It must have succeeded, and the tenant marker in its
///    metadata must match the tenant the caller resolved. Caller-supplied claims are never trusted on their own.
/// 2. **Check.** If a reservation already exists for the payment, it is returned as `existing`.
/// 3. **Generate.** A reservation number is issued for the tenant.
/// 4. **Insert.** If the insert hits the payment reference uniqueness constraint, another caller won the race since
///    step 2. The winner's reservation is fetched and returned as `existing`.
/// 5. **Notify.** Only the call that inserted the reservation publishes a [`ReservationCreatedEvent`].
///
/// Every failure happens before the insert, so there is never anything to undo.
pub struct ReconciliationApi<B, G, R> {
    db: B,
    gateway: G,
    numbers: ReservationNumberGenerator<B, R>,
    producers: EventProducers,
}

impl<B, G, R> Debug for ReconciliationApi<B, G, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, G, R> ReconciliationApi<B, G, R>
where B: Clone
{
    pub fn new(db: B, gateway: G, remote: R, producers: EventProducers) -> Self {
        let numbers = ReservationNumberGenerator::new(db.clone(), remote);
        Self { db, gateway, numbers, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G, R> ReconciliationApi<B, G, R>
where
    B: BookingDatabase,
    G: PaymentGateway,
    R: RemoteSequence,
{
    /// Materialises the reservation for `reference`, or returns the one that already exists.
    ///
    /// `claimed_tenant` is the tenant the entry point resolved (from the webhook payload or the client's request). It
    /// is only accepted if it matches the tenant marker of the payment as reported by the gateway.
    pub async fn reconcile(
        &self,
        reference: &PaymentReference,
        claimed_tenant: &TenantId,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        trace!("🔄️ Reconciling payment {reference} for tenant {claimed_tenant}");
        let (payment, tenant) = self.verify_payment(reference, claimed_tenant).await?;
        if let Some(existing) = self.db.fetch_reservation_by_payment_reference(reference).await? {
            debug!("🔄️ Payment {reference} already has reservation {}", existing.reservation_number);
            return Ok(ReconciliationOutcome::existing(existing));
        }
        let details = BookingDetails::from_metadata(&payment.metadata).map_err(|e| {
            warn!("🔄️ Payment {reference} cannot be turned into a reservation. {e}");
            e
        })?;
        let number = self
            .numbers
            .next_number(&tenant)
            .await
            .map_err(|e| ReconciliationError::SequenceGenerationFailure(e.to_string()))?;
        let new_reservation =
            details.into_new_reservation(tenant.id.clone(), reference.clone(), number, payment.amount, payment.currency);
        match self.db.insert_reservation(new_reservation).await {
            Ok(reservation) => {
                info!("🔄️ Reservation {} created for payment {reference}", reservation.reservation_number);
                self.call_reservation_created_hook(&reservation, &tenant).await;
                Ok(ReconciliationOutcome::created(reservation))
            },
            Err(ReservationStoreError::DuplicatePaymentReference(_)) => {
                debug!("🔄️ Lost the race to insert a reservation for payment {reference}. Fetching the winner's.");
                let existing = self.db.fetch_reservation_by_payment_reference(reference).await?.ok_or_else(|| {
                    error!("🔄️ Payment {reference} hit the uniqueness constraint, but no reservation can be found.");
                    ReconciliationError::DatabaseError(format!("Reservation for {reference} vanished after a conflict"))
                })?;
                Ok(ReconciliationOutcome::existing(existing))
            },
            Err(ReservationStoreError::DuplicateReservationNumber(number)) => {
                error!("🔄️ Reservation number {number} was issued twice for tenant {}. Check the sequence source.", tenant.id);
                Err(ReconciliationError::SequenceGenerationFailure(format!("{number} has already been used")))
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches the payment from the gateway and checks that it succeeded and that it belongs to `claimed_tenant`.
    pub async fn verify_payment(
        &self,
        reference: &PaymentReference,
        claimed_tenant: &TenantId,
    ) -> Result<(VerifiedPayment, Tenant), ReconciliationError> {
        let payment = self.gateway.fetch_payment(reference).await.map_err(|e| {
            warn!("🔄️ Could not verify payment {reference}. {e}");
            ReconciliationError::from(e)
        })?;
        if !payment.is_succeeded() {
            info!("🔄️ Payment {reference} has status {}. No reservation will be made.", payment.status);
            return Err(ReconciliationError::RejectedPayment(RejectionReason::NotSucceeded(payment.status)));
        }
        let verified = payment.tenant_marker().ok_or_else(|| {
            warn!("🔄️ Payment {reference} has no tenant marker. Rejecting it.");
            ReconciliationError::RejectedPayment(RejectionReason::MissingTenantMarker)
        })?;
        if &verified != claimed_tenant {
            warn!("🔄️ Payment {reference} belongs to tenant {verified}, but {claimed_tenant} claimed it. Rejecting it.");
            return Err(ReconciliationError::RejectedPayment(RejectionReason::TenantMismatch {
                claimed: claimed_tenant.clone(),
                verified,
            }));
        }
        let tenant = self.db.fetch_tenant(&verified).await?.ok_or_else(|| {
            warn!("🔄️ Payment {reference} names tenant {verified}, which does not exist. Rejecting it.");
            ReconciliationError::RejectedPayment(RejectionReason::UnknownTenant(verified.clone()))
        })?;
        trace!("🔄️ Payment {reference} verified for tenant {}", tenant.id);
        Ok((payment, tenant))
    }

    /// Looks up the reservation for `reference` without touching the gateway.
    pub async fn fetch_reservation(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Reservation>, ReconciliationError> {
        let reservation = self.db.fetch_reservation_by_payment_reference(reference).await?;
        Ok(reservation)
    }

    async fn call_reservation_created_hook(&self, reservation: &Reservation, tenant: &Tenant) {
        for emitter in &self.producers.reservation_created_producer {
            debug!("🔄️ Notifying reservation created hook subscribers");
            let event = ReservationCreatedEvent::new(reservation.clone(), tenant.clone());
            emitter.publish_event(event).await;
        }
    }
}
