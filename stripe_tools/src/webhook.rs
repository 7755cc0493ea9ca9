//! Verification of the `Stripe-Signature` webhook header.
//!
//! The header has the form `t=1718000000,v1=5257a8...,v1=...`. Each `v1` entry is a hex-encoded HMAC-SHA256 over
//! `"{t}.{raw body}"` using the endpoint's signing secret. More than one `v1` entry may be present while a secret is
//! being rolled, and a match on any of them is sufficient.
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::StripeApiError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, StripeApiError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                let t = value
                    .parse::<i64>()
                    .map_err(|e| StripeApiError::InvalidSignatureHeader(format!("Invalid timestamp. {e}")))?;
                timestamp = Some(t);
            },
            // Undecodable entries can never match, so they are skipped rather than failing the whole header
            "v1" => {
                if let Ok(sig) = hex::decode(value) {
                    signatures.push(sig);
                }
            },
            _ => {},
        }
    }
    let timestamp = timestamp.ok_or_else(|| StripeApiError::InvalidSignatureHeader("No timestamp".into()))?;
    if signatures.is_empty() {
        return Err(StripeApiError::InvalidSignatureHeader("No v1 signatures".into()));
    }
    Ok(SignatureHeader { timestamp, signatures })
}

fn mac_for(payload: &[u8], timestamp: i64, secret: &str) -> Result<HmacSha256, StripeApiError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Produces the hex signature the gateway would send for `payload` at time `timestamp`.
pub fn compute_signature(payload: &[u8], timestamp: i64, secret: &str) -> Result<String, StripeApiError> {
    let mac = mac_for(payload, timestamp, secret)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Builds a complete header value. Mostly useful for tests and local tooling.
pub fn signature_header(payload: &[u8], timestamp: i64, secret: &str) -> Result<String, StripeApiError> {
    let sig = compute_signature(payload, timestamp, secret)?;
    Ok(format!("t={timestamp},v1={sig}"))
}

/// Checks `header` against the raw request body.
///
/// A signature is accepted if any `v1` entry matches and the signed timestamp lies within `tolerance_secs` of `now`.
/// Comparisons are constant-time.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: DateTime<Utc>,
) -> Result<(), StripeApiError> {
    let header = parse_header(header)?;
    let drift = (now.timestamp() - header.timestamp).abs();
    if drift > tolerance_secs {
        return Err(StripeApiError::TimestampOutsideTolerance(drift));
    }
    let mac = mac_for(payload, header.timestamp, secret)?;
    let matched = header.signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok());
    if matched {
        Ok(())
    } else {
        Err(StripeApiError::SignatureMismatch)
    }
}
