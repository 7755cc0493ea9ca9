use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use booking_engine::{ReconciliationError, ReservationStoreError};
use log::*;
use thiserror::Error;

/// Errors that reach the HTTP boundary.
///
/// The payer-facing variants deliberately carry no detail. Gateway and database errors are logged where they are
/// converted and never end up in a response body.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("The payment could not be accepted for this booking.")]
    PaymentRejected,
    #[error("The payment could not be found.")]
    PaymentNotFound,
    #[error("The payment has not completed yet. Please check again shortly.")]
    PaymentPending,
    #[error("Your booking is being processed. Please check again shortly.")]
    Processing,
    #[error("Requests from this address are not accepted.")]
    ForbiddenPeer,
}

impl ServerError {
    /// The stable, machine-readable code sent to clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::PaymentRejected => "payment_rejected",
            Self::PaymentNotFound => "payment_not_found",
            Self::PaymentPending => "payment_pending",
            Self::Processing => "processing",
            Self::ForbiddenPeer => "forbidden",
            Self::InitializeError(_) | Self::ConfigurationError(_) | Self::IOError(_) | Self::Unspecified(_) => {
                "internal_error"
            },
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PaymentRejected => StatusCode::FORBIDDEN,
            Self::ForbiddenPeer => StatusCode::FORBIDDEN,
            Self::PaymentNotFound => StatusCode::NOT_FOUND,
            Self::PaymentPending => StatusCode::ACCEPTED,
            Self::Processing => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(
                serde_json::json!({ "success": false, "error": self.error_code(), "message": self.to_string() })
                    .to_string(),
            )
    }
}

impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        if e.is_pending() {
            return Self::PaymentPending;
        }
        match e {
            ReconciliationError::ValidationError(s) => Self::InvalidRequest(s),
            ReconciliationError::RejectedPayment(_) => Self::PaymentRejected,
            ReconciliationError::PaymentNotFound(_) => Self::PaymentNotFound,
            ReconciliationError::GatewayUnreachable(_) |
            ReconciliationError::SequenceGenerationFailure(_) |
            ReconciliationError::DatabaseError(_) => {
                error!("💻️ Request could not be completed and will need to be retried. {e}");
                Self::Processing
            },
        }
    }
}

impl From<ReservationStoreError> for ServerError {
    fn from(e: ReservationStoreError) -> Self {
        ReconciliationError::from(e).into()
    }
}
