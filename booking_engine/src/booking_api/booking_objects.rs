use std::{collections::HashMap, fmt::Display};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    booking_api::errors::ReconciliationError,
    db_types::{NewReservation, PaymentReference, Reservation, ReservationNumber, TenantId},
};

/// Payment metadata keys that carry the prospective reservation's fields.
pub mod metadata_keys {
    pub const ACTIVITY_DATE: &str = "activity_date";
    pub const ACTIVITY: &str = "activity";
    pub const ADULTS: &str = "adults";
    pub const CHILDREN: &str = "children";
    pub const CUSTOMER_NAME: &str = "customer_name";
    pub const CUSTOMER_EMAIL: &str = "customer_email";
    pub const CUSTOMER_PHONE: &str = "customer_phone";
    pub const PICKUP_LOCATION: &str = "pickup_location";
    pub const PICKUP_TIME: &str = "pickup_time";
}

/// The booking fields carried in a verified payment's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDetails {
    pub activity_date: NaiveDate,
    pub activity: Option<String>,
    pub adults: i64,
    pub children: i64,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub pickup_location: Option<String>,
    pub pickup_time: Option<String>,
}

fn optional(metadata: &HashMap<String, String>, key: &str) -> Option<String> {
    metadata.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()).map(String::from)
}

fn required(metadata: &HashMap<String, String>, key: &str) -> Result<String, ReconciliationError> {
    optional(metadata, key).ok_or_else(|| ReconciliationError::ValidationError(format!("{key} is missing")))
}

fn guest_count(value: Option<String>, key: &str) -> Result<i64, ReconciliationError> {
    match value {
        None => Ok(0),
        Some(v) => match v.parse::<i64>() {
            Ok(n) if n >= 0 => Ok(n),
            _ => Err(ReconciliationError::ValidationError(format!("{key} must be a non-negative whole number"))),
        },
    }
}

impl BookingDetails {
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Result<Self, ReconciliationError> {
        use metadata_keys::*;
        let date = required(metadata, ACTIVITY_DATE)?;
        let activity_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| ReconciliationError::ValidationError(format!("{ACTIVITY_DATE} '{date}' is invalid. {e}")))?;
        let adults = guest_count(Some(required(metadata, ADULTS)?), ADULTS)?;
        let children = guest_count(optional(metadata, CHILDREN), CHILDREN)?;
        if adults + children == 0 {
            return Err(ReconciliationError::ValidationError("A reservation needs at least one guest".into()));
        }
        let contact_name = required(metadata, CUSTOMER_NAME)?;
        let contact_email = required(metadata, CUSTOMER_EMAIL)?;
        if !contact_email.contains('@') {
            return Err(ReconciliationError::ValidationError(format!("{CUSTOMER_EMAIL} is not an email address")));
        }
        Ok(Self {
            activity_date,
            activity: optional(metadata, ACTIVITY),
            adults,
            children,
            contact_name,
            contact_email,
            contact_phone: optional(metadata, CUSTOMER_PHONE),
            pickup_location: optional(metadata, PICKUP_LOCATION),
            pickup_time: optional(metadata, PICKUP_TIME),
        })
    }

    pub fn into_new_reservation(
        self,
        tenant_id: TenantId,
        payment_reference: PaymentReference,
        reservation_number: ReservationNumber,
        amount: i64,
        currency: String,
    ) -> NewReservation {
        NewReservation {
            tenant_id,
            payment_reference,
            reservation_number,
            activity_date: self.activity_date,
            activity: self.activity,
            adults: self.adults,
            children: self.children,
            contact_name: self.contact_name,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            pickup_location: self.pickup_location,
            pickup_time: self.pickup_time,
            amount,
            currency,
        }
    }
}

/// Whether this call inserted the reservation or found one that already existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatedBy {
    Created,
    Existing,
}

impl Display for CreatedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreatedBy::Created => write!(f, "created"),
            CreatedBy::Existing => write!(f, "existing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationOutcome {
    pub reservation: Reservation,
    pub created_by: CreatedBy,
}

impl ReconciliationOutcome {
    pub fn created(reservation: Reservation) -> Self {
        Self { reservation, created_by: CreatedBy::Created }
    }

    pub fn existing(reservation: Reservation) -> Self {
        Self { reservation, created_by: CreatedBy::Existing }
    }

    pub fn is_created(&self) -> bool {
        self.created_by == CreatedBy::Created
    }
}
