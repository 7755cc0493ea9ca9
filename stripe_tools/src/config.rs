use std::time::Duration;

use log::*;
use tbp_common::{env_duration_ms, Secret};

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// The base URL of the API, without the version segment. Overridable so that tests and sandboxes can point the
    /// client elsewhere.
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub request_timeout: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret_key: Secret::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("TBP_GATEWAY_API_URL").unwrap_or_else(|_| {
            debug!("TBP_GATEWAY_API_URL not set, using {DEFAULT_STRIPE_API_URL}");
            DEFAULT_STRIPE_API_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("TBP_GATEWAY_API_KEY").unwrap_or_else(|_| {
            warn!("TBP_GATEWAY_API_KEY not set. Payment verification calls will be rejected by the gateway.");
            String::default()
        }));
        let request_timeout = env_duration_ms("TBP_GATEWAY_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT);
        Self { api_url, secret_key, request_timeout }
    }
}
