//! Client for the remote reservation number service.
//!
//! The service exposes a single function, `next_reservation_number(tenant_id) -> string`. Every call advances the
//! tenant's counter on the remote side, so the engine only calls it when it is about to insert a reservation.
use std::sync::Arc;

use booking_engine::{db_types::TenantId, traits::RemoteSequence, SequenceError};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde_json::{json, Value};

use crate::{config::SequenceRpcConfig, errors::ServerError};

#[derive(Clone)]
pub struct SequenceRpcClient {
    url: Option<String>,
    client: Arc<Client>,
}

impl SequenceRpcClient {
    pub fn new(config: &SequenceRpcConfig) -> Result<Self, ServerError> {
        let mut headers = HeaderMap::with_capacity(2);
        if !config.api_key.is_empty() {
            let key = config.api_key.reveal();
            let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| ServerError::ConfigurationError(format!("Invalid TBP_SEQUENCE_RPC_KEY. {e}")))?;
            bearer.set_sensitive(true);
            headers.insert(AUTHORIZATION, bearer);
            let mut api_key = HeaderValue::from_str(key)
                .map_err(|e| ServerError::ConfigurationError(format!("Invalid TBP_SEQUENCE_RPC_KEY. {e}")))?;
            api_key.set_sensitive(true);
            headers.insert("apikey", api_key);
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not create the sequence RPC client. {e}")))?;
        Ok(Self { url: config.url.clone(), client: Arc::new(client) })
    }
}

impl RemoteSequence for SequenceRpcClient {
    async fn next_reservation_number(&self, tenant: &TenantId) -> Result<String, SequenceError> {
        let Some(url) = &self.url else {
            return Err(SequenceError::RemoteUnavailable("No sequence service is configured".into()));
        };
        trace!("🔢️ Requesting the next reservation number for {tenant} from {url}");
        let response = self
            .client
            .post(url)
            .json(&json!({ "tenant_id": tenant.as_str() }))
            .send()
            .await
            .map_err(|e| SequenceError::RemoteUnavailable(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| SequenceError::RemoteUnavailable(e.to_string()))?;
        if !status.is_success() {
            return Err(SequenceError::RemoteUnavailable(format!("The sequence service answered {status}. {body}")));
        }
        parse_rpc_result(&body)
    }
}

/// The service answers with a JSON string or number. Anything that is not JSON is taken as plain text.
pub fn parse_rpc_result(body: &str) -> Result<String, SequenceError> {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => s,
        Ok(Value::Number(n)) => n.to_string(),
        Ok(Value::Null) => String::new(),
        Ok(other) => {
            return Err(SequenceError::RemoteUnavailable(format!("Unexpected answer from the sequence service: {other}")))
        },
        Err(_) => body.to_string(),
    };
    let value = value.trim();
    if value.is_empty() {
        Err(SequenceError::EmptyResult)
    } else {
        Ok(value.to_string())
    }
}
