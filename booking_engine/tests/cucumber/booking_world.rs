use std::time::Duration;

use booking_engine::{
    booking_objects::ReconciliationOutcome,
    db_types::{PaymentReference, TenantId},
    events::ReservationCreatedEvent,
    PollSchedule,
    ReconciliationError,
};
use cucumber::World;

use crate::support::{TestApi, TestSystem};

pub type Response = Result<ReconciliationOutcome, ReconciliationError>;

#[derive(Default, Debug, World)]
pub struct BookingWorld {
    pub system: Option<TestSystem>,
    pub responses: Vec<Response>,
    /// Filled in once the system has been shut down
    pub created_events: Option<Vec<ReservationCreatedEvent>>,
}

impl BookingWorld {
    pub fn sys(&self) -> &TestSystem {
        self.system.as_ref().expect("The system has not been set up, or has been shut down")
    }

    pub fn api(&self) -> &TestApi {
        &self.sys().api
    }

    pub async fn created_events(&mut self) -> &[ReservationCreatedEvent] {
        if self.created_events.is_none() {
            let sys = self.system.take().expect("The system has not been set up");
            self.created_events = Some(sys.shutdown().await);
        }
        self.created_events.as_deref().unwrap_or_default()
    }
}

/// A confirmation schedule short enough for tests
pub fn test_schedule() -> PollSchedule {
    PollSchedule {
        initial_delay: Duration::from_millis(30),
        interval: Duration::from_millis(20),
        max_checks: 3,
        deadline: Duration::from_millis(500),
    }
}

/// A schedule that waits long enough for a webhook that is a few milliseconds behind
pub fn patient_schedule() -> PollSchedule {
    PollSchedule {
        initial_delay: Duration::from_millis(250),
        interval: Duration::from_millis(100),
        max_checks: 10,
        deadline: Duration::from_secs(3),
    }
}

pub fn reference(s: &str) -> PaymentReference {
    PaymentReference::from(s)
}

pub fn tenant(s: &str) -> TenantId {
    TenantId::from(s)
}

/// A short code for each failure, used by the feature files
pub fn error_code(e: &ReconciliationError) -> &'static str {
    use booking_engine::RejectionReason::*;
    match e {
        ReconciliationError::RejectedPayment(_) if e.is_pending() => "pending",
        ReconciliationError::RejectedPayment(NotSucceeded(_)) => "not_succeeded",
        ReconciliationError::RejectedPayment(MissingTenantMarker) => "missing_tenant",
        ReconciliationError::RejectedPayment(TenantMismatch { .. }) => "tenant_mismatch",
        ReconciliationError::RejectedPayment(UnknownTenant(_)) => "unknown_tenant",
        ReconciliationError::ValidationError(_) => "invalid",
        ReconciliationError::PaymentNotFound(_) => "not_found",
        ReconciliationError::GatewayUnreachable(_) => "gateway_unreachable",
        ReconciliationError::SequenceGenerationFailure(_) => "sequence_failure",
        ReconciliationError::DatabaseError(_) => "database_error",
    }
}
