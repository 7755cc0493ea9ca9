use std::fmt::Display;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

//--------------------------------------       TenantId        ---------------------------------------------------------
/// Identifies a tour operator on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   PaymentReference    ---------------------------------------------------------
/// The gateway's identifier for a payment, e.g. `pi_3PQ...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentReference(pub String);

impl Display for PaymentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PaymentReference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PaymentReference {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PaymentReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   ReservationNumber   ---------------------------------------------------------
/// The human-readable, tenant-scoped reservation code, e.g. `T1P-000001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ReservationNumber(pub String);

impl ReservationNumber {
    /// Formats a counter value as `{prefix}-{value:06}`.
    pub fn format(prefix: &str, value: i64) -> Self {
        Self(format!("{prefix}-{value:06}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ReservationNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ReservationNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

//--------------------------------------   ReservationStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// The reservation was created from a verified payment
    Confirmed,
    /// The reservation was voided. Its number is never reissued.
    Cancelled,
}

impl Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Confirmed => write!(f, "confirmed"),
            ReservationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

//--------------------------------------      Reservation      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub tenant_id: TenantId,
    pub payment_reference: Option<PaymentReference>,
    pub reservation_number: ReservationNumber,
    pub status: ReservationStatus,
    pub activity_date: NaiveDate,
    pub activity: Option<String>,
    pub adults: i64,
    pub children: i64,
    pub contact_name: String,
    pub contact_email: String,
    // The optional columns below may be absent from older deployments, see `WriteCapabilities`
    #[sqlx(default)]
    pub contact_phone: Option<String>,
    #[sqlx(default)]
    pub pickup_location: Option<String>,
    #[sqlx(default)]
    pub pickup_time: Option<String>,
    /// Amount paid, in the currency's minor unit
    pub amount: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn guests(&self) -> i64 {
        self.adults + self.children
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub tenant_id: TenantId,
    pub payment_reference: PaymentReference,
    pub reservation_number: ReservationNumber,
    pub activity_date: NaiveDate,
    pub activity: Option<String>,
    pub adults: i64,
    pub children: i64,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub pickup_location: Option<String>,
    pub pickup_time: Option<String>,
    pub amount: i64,
    pub currency: String,
}

impl NewReservation {
    pub fn has_pickup_details(&self) -> bool {
        self.pickup_location.is_some() || self.pickup_time.is_some()
    }
}

//--------------------------------------         Tenant        ---------------------------------------------------------
#[derive(Clone, PartialEq, Eq, FromRow)]
pub struct Tenant {
    pub id: TenantId,
    pub display_name: String,
    /// Used as the reservation number prefix when present
    pub initials: Option<String>,
    /// The gateway's signing secret for this tenant's webhook endpoint
    pub webhook_secret: Option<String>,
    /// Comma-separated list of addresses that receive operational alerts
    pub alert_emails: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tenant")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("initials", &self.initials)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "****"))
            .field("alert_emails", &self.alert_emails)
            .finish()
    }
}

impl Tenant {
    pub fn alert_recipients(&self) -> Vec<String> {
        self.alert_emails
            .as_deref()
            .map(|s| s.split(',').map(str::trim).filter(|e| !e.is_empty()).map(String::from).collect())
            .unwrap_or_default()
    }

    /// The signing secret, if one is configured. Blank values count as "not configured".
    pub fn signing_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTenant {
    pub id: TenantId,
    pub display_name: String,
    pub initials: Option<String>,
    pub webhook_secret: Option<String>,
    pub alert_emails: Option<String>,
}

impl NewTenant {
    pub fn new<S: Into<String>>(id: TenantId, display_name: S) -> Self {
        Self { id, display_name: display_name.into(), initials: None, webhook_secret: None, alert_emails: None }
    }

    pub fn with_initials<S: Into<String>>(mut self, initials: S) -> Self {
        self.initials = Some(initials.into());
        self
    }

    pub fn with_webhook_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    pub fn with_alert_emails<S: Into<String>>(mut self, emails: S) -> Self {
        self.alert_emails = Some(emails.into());
        self
    }
}

//--------------------------------------     SequenceValue     ---------------------------------------------------------
/// The result of advancing a tenant's reservation counter.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SequenceValue {
    pub prefix: String,
    #[sqlx(rename = "last_value")]
    pub value: i64,
}

impl SequenceValue {
    pub fn reservation_number(&self) -> ReservationNumber {
        ReservationNumber::format(&self.prefix, self.value)
    }
}
