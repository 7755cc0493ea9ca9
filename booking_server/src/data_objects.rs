use booking_engine::{
    booking_objects::{CreatedBy, ReconciliationOutcome},
    db_types::{PaymentReference, ReservationNumber, TenantId},
};
use serde::{Deserialize, Serialize};

/// Sent by the payer's browser after it returns from checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_reference: PaymentReference,
    pub tenant_id: TenantId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPaymentResponse {
    pub success: bool,
    pub reservation_id: i64,
    pub reservation_number: ReservationNumber,
    pub created_by: CreatedBy,
}

impl From<ReconciliationOutcome> for ConfirmPaymentResponse {
    fn from(outcome: ReconciliationOutcome) -> Self {
        Self {
            success: true,
            reservation_id: outcome.reservation.id,
            reservation_number: outcome.reservation.reservation_number,
            created_by: outcome.created_by,
        }
    }
}

/// The acknowledgement returned to the gateway. The reservation fields are only present when the event produced (or
/// matched) a reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_number: Option<ReservationNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<CreatedBy>,
}

impl WebhookResponse {
    pub fn received() -> Self {
        Self { received: true, ..Default::default() }
    }
}

impl From<ReconciliationOutcome> for WebhookResponse {
    fn from(outcome: ReconciliationOutcome) -> Self {
        Self {
            received: true,
            reservation_id: Some(outcome.reservation.id),
            reservation_number: Some(outcome.reservation.reservation_number),
            created_by: Some(outcome.created_by),
        }
    }
}
