//! The bounded wait used when the payer's browser comes back from checkout.
//!
//! The gateway's webhook and the browser usually arrive within moments of each other. Waiting briefly for the
//! webhook to finish avoids a needless race for the insert. The wait is an optimisation only: once it runs out, the
//! regular reconciliation flow takes over, and that flow is safe under any interleaving.
use std::time::Duration;

use log::*;
use tokio::time::Instant;

use crate::{
    booking_api::{
        booking_objects::ReconciliationOutcome,
        errors::{ReconciliationError, RejectionReason},
        reconciliation_api::ReconciliationApi,
    },
    db_types::{PaymentReference, TenantId},
    traits::{BookingDatabase, PaymentGateway, RemoteSequence},
};

/// "Check now, wait `initial_delay`, then check every `interval`, at most `max_checks` more times, and never wait
/// longer than `deadline` in total."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub max_checks: u32,
    pub deadline: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1500),
            interval: Duration::from_millis(1000),
            max_checks: 5,
            deadline: Duration::from_secs(8),
        }
    }
}

impl PollSchedule {
    /// A schedule that never waits. The existence check runs once, then reconciliation proceeds.
    pub fn immediate() -> Self {
        Self { initial_delay: Duration::ZERO, interval: Duration::ZERO, max_checks: 0, deadline: Duration::ZERO }
    }

    /// The pauses before each re-check, cut short so that their sum never exceeds the deadline.
    pub fn delays(&self) -> Vec<Duration> {
        let mut result = Vec::with_capacity(self.max_checks as usize);
        let mut total = Duration::ZERO;
        for i in 0..self.max_checks {
            let delay = if i == 0 { self.initial_delay } else { self.interval };
            total += delay;
            if total > self.deadline {
                break;
            }
            result.push(delay);
        }
        result
    }
}

impl<B, G, R> ReconciliationApi<B, G, R>
where
    B: BookingDatabase,
    G: PaymentGateway,
    R: RemoteSequence,
{
    /// Handles a confirmation request from the payer's browser.
    ///
    /// Returns the existing reservation as soon as one shows up during the wait. Otherwise, once the schedule is
    /// exhausted, hands over to [`Self::reconcile`], which verifies the payment and creates the reservation if it has
    /// succeeded. A payment that has not completed yet comes back as a pending rejection
    /// ([`ReconciliationError::is_pending`]).
    pub async fn confirm_payment(
        &self,
        reference: &PaymentReference,
        claimed_tenant: &TenantId,
        schedule: &PollSchedule,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        let started = Instant::now();
        if let Some(outcome) = self.check_existing(reference, claimed_tenant).await? {
            return Ok(outcome);
        }
        for (i, delay) in schedule.delays().into_iter().enumerate() {
            if started.elapsed() + delay > schedule.deadline {
                debug!("⏳️ Confirmation wait for {reference} reached its deadline after {} checks", i + 1);
                break;
            }
            tokio::time::sleep(delay).await;
            if let Some(outcome) = self.check_existing(reference, claimed_tenant).await? {
                debug!("⏳️ Reservation for {reference} appeared after {:?}", started.elapsed());
                return Ok(outcome);
            }
        }
        debug!("⏳️ No reservation for {reference} after {:?}. Reconciling.", started.elapsed());
        self.reconcile(reference, claimed_tenant).await
    }

    async fn check_existing(
        &self,
        reference: &PaymentReference,
        claimed_tenant: &TenantId,
    ) -> Result<Option<ReconciliationOutcome>, ReconciliationError> {
        match self.fetch_reservation(reference).await? {
            Some(reservation) if &reservation.tenant_id != claimed_tenant => {
                warn!(
                    "⏳️ Tenant {claimed_tenant} asked to confirm payment {reference}, which belongs to {}",
                    reservation.tenant_id
                );
                Err(ReconciliationError::RejectedPayment(RejectionReason::TenantMismatch {
                    claimed: claimed_tenant.clone(),
                    verified: reservation.tenant_id,
                }))
            },
            Some(reservation) => Ok(Some(ReconciliationOutcome::existing(reservation))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn default_schedule() {
        let delays = PollSchedule::default().delays();
        assert_eq!(delays, vec![ms(1500), ms(1000), ms(1000), ms(1000), ms(1000)]);
    }

    #[test]
    fn deadline_cuts_the_schedule_short() {
        let schedule = PollSchedule { initial_delay: ms(200), interval: ms(100), max_checks: 10, deadline: ms(450) };
        assert_eq!(schedule.delays(), vec![ms(200), ms(100), ms(100)]);
    }

    #[test]
    fn immediate_schedule_never_waits() {
        assert!(PollSchedule::immediate().delays().is_empty());
        let schedule = PollSchedule { max_checks: 0, ..Default::default() };
        assert!(schedule.delays().is_empty());
    }
}
