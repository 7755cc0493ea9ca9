use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("{0} is not a valid object id")]
    InvalidObjectId(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The signature header is malformed. {0}")]
    InvalidSignatureHeader(String),
    #[error("No signature in the header matches the payload")]
    SignatureMismatch,
    #[error("The signature timestamp is {0}s away from the current time, which is outside the tolerance window")]
    TimestampOutsideTolerance(i64),
}

impl StripeApiError {
    /// True if the gateway reported that the requested object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::QueryError { status: 404, .. })
    }
}
