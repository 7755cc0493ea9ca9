use std::{collections::HashMap, fmt::Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{PaymentReference, TenantId};

/// The metadata key that carries the owning tenant of a payment.
pub const TENANT_MARKER_KEY: &str = "tenant_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Succeeded,
    /// Not finished yet. It may still succeed.
    Pending,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Succeeded => write!(f, "succeeded"),
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A payment record as reported by the gateway itself, as opposed to whatever a caller claims about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    pub reference: PaymentReference,
    pub status: PaymentStatus,
    /// Amount in the currency's minor unit
    pub amount: i64,
    pub currency: String,
    /// The booking fields attached when the payment was created
    pub metadata: HashMap<String, String>,
}

impl VerifiedPayment {
    pub fn tenant_marker(&self) -> Option<TenantId> {
        self.metadata
            .get(TENANT_MARKER_KEY)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(TenantId::from)
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == PaymentStatus::Succeeded
    }
}

/// Retrieval of payment records from the payment gateway. This is a pure read.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    async fn fetch_payment(&self, reference: &PaymentReference) -> Result<VerifiedPayment, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway could not be reached. {0}")]
    GatewayUnreachable(String),
    #[error("The payment gateway has no record of payment {0}")]
    PaymentNotFound(PaymentReference),
}
