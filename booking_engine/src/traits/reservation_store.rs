use thiserror::Error;

use crate::db_types::{NewReservation, PaymentReference, Reservation, ReservationNumber, TenantId};

/// Persistence boundary for reservations.
///
/// Implementations MUST enforce uniqueness of `payment_reference` at the storage level and report a violation as
/// [`ReservationStoreError::DuplicatePaymentReference`]. The reconciliation flow checks for an existing reservation
/// before inserting, but that check is advisory; the constraint is what keeps concurrent callers from creating two
/// reservations for one payment.
#[allow(async_fn_in_trait)]
pub trait ReservationStore: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the reservation created from the given payment, if there is one.
    async fn fetch_reservation_by_payment_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Reservation>, ReservationStoreError>;

    /// Inserts a new reservation and returns the stored record.
    ///
    /// This call is NOT idempotent. A second insert for the same payment fails with
    /// [`ReservationStoreError::DuplicatePaymentReference`].
    async fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation, ReservationStoreError>;

    /// All reservations for a tenant, oldest first.
    async fn fetch_reservations_for_tenant(&self, tenant: &TenantId) -> Result<Vec<Reservation>, ReservationStoreError>;

    /// Closes the database connection pool.
    async fn close(&mut self) -> Result<(), ReservationStoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum ReservationStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("A reservation for payment {0} already exists")]
    DuplicatePaymentReference(PaymentReference),
    #[error("Reservation number {0} has already been issued for this tenant")]
    DuplicateReservationNumber(ReservationNumber),
    #[error("Tenant {0} does not exist")]
    TenantNotFound(TenantId),
    #[error("The database schema does not support this deployment. {0}")]
    SchemaError(String),
}

impl From<sqlx::Error> for ReservationStoreError {
    fn from(e: sqlx::Error) -> Self {
        ReservationStoreError::DatabaseError(e.to_string())
    }
}
