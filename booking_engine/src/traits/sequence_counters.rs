use thiserror::Error;

use crate::db_types::{SequenceValue, Tenant, TenantId};

/// Locally persisted, per-tenant reservation counters.
#[allow(async_fn_in_trait)]
pub trait SequenceCounters {
    /// Atomically advances the tenant's counter and returns the new value, creating the counter on first use.
    ///
    /// Concurrent calls for the same tenant must never observe the same value. Implementations must use an atomic
    /// increment-and-return or a row lock; read-then-write is not acceptable.
    async fn increment_sequence(&self, tenant: &Tenant) -> Result<SequenceValue, SequenceError>;

    /// Records that `value` was issued for the tenant by another source, so that the local counter continues after it.
    ///
    /// Returns the new counter if it moved up to `value`, or `None` if it was already at or beyond `value`. The check
    /// and the write must be a single atomic step.
    async fn advance_sequence(&self, tenant: &Tenant, value: i64) -> Result<Option<SequenceValue>, SequenceError>;

    /// The last value issued for the tenant, if any.
    async fn fetch_sequence(&self, tenant: &TenantId) -> Result<Option<SequenceValue>, SequenceError>;
}

/// A remote atomic-increment service for reservation numbers.
///
/// Every call advances the remote counter, so callers must not call speculatively. The result is either a complete
/// reservation number or a bare counter value. An empty result counts as a failure.
#[allow(async_fn_in_trait)]
pub trait RemoteSequence {
    async fn next_reservation_number(&self, tenant: &TenantId) -> Result<String, SequenceError>;
}

/// A [`RemoteSequence`] for deployments without a remote counter. Every call fails, so numbers always come from the
/// local counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemoteSequence;

impl RemoteSequence for NoRemoteSequence {
    async fn next_reservation_number(&self, _tenant: &TenantId) -> Result<String, SequenceError> {
        Err(SequenceError::RemoteUnavailable("No remote sequence service is configured".into()))
    }
}

#[derive(Debug, Clone, Error)]
pub enum SequenceError {
    #[error("The remote sequence service is unavailable. {0}")]
    RemoteUnavailable(String),
    #[error("The remote sequence service returned an empty result")]
    EmptyResult,
    #[error("Could not update the local sequence counter. {0}")]
    LocalFailure(String),
}

impl From<sqlx::Error> for SequenceError {
    fn from(e: sqlx::Error) -> Self {
        SequenceError::LocalFailure(e.to_string())
    }
}
