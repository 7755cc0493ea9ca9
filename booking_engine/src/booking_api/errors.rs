use std::fmt::Display;

use thiserror::Error;

use crate::{
    db_types::{PaymentReference, TenantId},
    traits::{GatewayError, PaymentStatus, ReservationStoreError},
};

/// Why a payment was refused. Every variant is a security decision: no reservation is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    NotSucceeded(PaymentStatus),
    MissingTenantMarker,
    TenantMismatch { claimed: TenantId, verified: TenantId },
    UnknownTenant(TenantId),
}

impl Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::NotSucceeded(status) => write!(f, "the payment status is {status}"),
            RejectionReason::MissingTenantMarker => write!(f, "the payment does not carry a tenant marker"),
            RejectionReason::TenantMismatch { claimed, verified } => {
                write!(f, "the payment belongs to tenant {verified}, not {claimed}")
            },
            RejectionReason::UnknownTenant(id) => write!(f, "tenant {id} does not exist"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("The booking details attached to the payment are invalid. {0}")]
    ValidationError(String),
    #[error("The payment was rejected: {0}")]
    RejectedPayment(RejectionReason),
    #[error("The payment gateway has no record of payment {0}")]
    PaymentNotFound(PaymentReference),
    #[error("The payment gateway could not be reached. {0}")]
    GatewayUnreachable(String),
    #[error("Could not issue a reservation number. {0}")]
    SequenceGenerationFailure(String),
    #[error("Database error. {0}")]
    DatabaseError(String),
}

impl ReconciliationError {
    /// The payment exists but has not completed yet. Asking again later may succeed.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::RejectedPayment(RejectionReason::NotSucceeded(PaymentStatus::Pending)))
    }

    /// The failure is not a property of the payment, and retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::GatewayUnreachable(_) | Self::SequenceGenerationFailure(_) | Self::DatabaseError(_))
    }
}

impl From<GatewayError> for ReconciliationError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::GatewayUnreachable(s) => Self::GatewayUnreachable(s),
            GatewayError::PaymentNotFound(r) => Self::PaymentNotFound(r),
        }
    }
}

impl From<ReservationStoreError> for ReconciliationError {
    fn from(e: ReservationStoreError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
