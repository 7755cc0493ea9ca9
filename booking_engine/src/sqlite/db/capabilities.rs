//! Optional reservation columns.
//!
//! Some deployments run with a `reservations` table that lacks the contact phone or pickup columns. Rather than
//! discovering this at request time, the set of columns the backend is allowed to write is resolved once, at startup,
//! from the live schema. A missing optional column is an error unless the operator explicitly allows running without
//! it.
use std::collections::HashSet;

use log::*;
use sqlx::SqliteConnection;

use crate::traits::ReservationStoreError;

const PHONE_COLUMN: &str = "contact_phone";
const PICKUP_COLUMNS: [&str; 2] = ["pickup_location", "pickup_time"];

/// Which optional reservation columns the backend writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteCapabilities {
    pub contact_phone: bool,
    pub pickup_details: bool,
}

impl Default for WriteCapabilities {
    fn default() -> Self {
        Self { contact_phone: true, pickup_details: true }
    }
}

/// Operator decisions about running against a schema without the optional columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionalColumnPolicy {
    pub allow_missing_phone: bool,
    pub allow_missing_pickup: bool,
}

pub async fn reservation_columns(conn: &mut SqliteConnection) -> Result<HashSet<String>, sqlx::Error> {
    let columns: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info('reservations')").fetch_all(conn).await?;
    Ok(columns.into_iter().collect())
}

pub fn resolve_write_capabilities(
    columns: &HashSet<String>,
    policy: OptionalColumnPolicy,
) -> Result<WriteCapabilities, ReservationStoreError> {
    if columns.is_empty() {
        return Err(ReservationStoreError::SchemaError("The reservations table does not exist".into()));
    }
    let has_phone = columns.contains(PHONE_COLUMN);
    let has_pickup = PICKUP_COLUMNS.iter().all(|c| columns.contains(*c));
    if !has_phone {
        if !policy.allow_missing_phone {
            return Err(ReservationStoreError::SchemaError(format!(
                "reservations.{PHONE_COLUMN} is missing. Run the migrations, or set TBP_ALLOW_MISSING_PHONE_COLUMN \
                 to run without storing contact phone numbers."
            )));
        }
        warn!("🗃️ reservations.{PHONE_COLUMN} is missing and TBP_ALLOW_MISSING_PHONE_COLUMN is set. Contact phone numbers will NOT be stored.");
    }
    if !has_pickup {
        if !policy.allow_missing_pickup {
            return Err(ReservationStoreError::SchemaError(
                "The reservation pickup columns are missing. Run the migrations, or set \
                 TBP_ALLOW_MISSING_PICKUP_COLUMNS to run without storing pickup details."
                    .into(),
            ));
        }
        warn!("🗃️ The reservation pickup columns are missing and TBP_ALLOW_MISSING_PICKUP_COLUMNS is set. Pickup details will NOT be stored.");
    }
    let capabilities = WriteCapabilities { contact_phone: has_phone, pickup_details: has_pickup };
    info!("🗃️ Reservation write capabilities: {capabilities:?}");
    Ok(capabilities)
}

#[cfg(test)]
mod test {
    use super::*;

    fn columns(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    const CORE: [&str; 4] = ["id", "tenant_id", "payment_reference", "reservation_number"];

    #[test]
    fn full_schema() {
        let mut cols = columns(&CORE);
        cols.extend(columns(&["contact_phone", "pickup_location", "pickup_time"]));
        let caps = resolve_write_capabilities(&cols, OptionalColumnPolicy::default()).unwrap();
        assert_eq!(caps, WriteCapabilities::default());
    }

    #[test]
    fn missing_columns_need_explicit_permission() {
        let mut cols = columns(&CORE);
        cols.insert("pickup_location".into());
        let err = resolve_write_capabilities(&cols, OptionalColumnPolicy::default()).unwrap_err();
        assert!(matches!(err, ReservationStoreError::SchemaError(_)));
        let policy = OptionalColumnPolicy { allow_missing_phone: true, allow_missing_pickup: false };
        let err = resolve_write_capabilities(&cols, policy).unwrap_err();
        assert!(err.to_string().contains("TBP_ALLOW_MISSING_PICKUP_COLUMNS"));
        let policy = OptionalColumnPolicy { allow_missing_phone: true, allow_missing_pickup: true };
        let caps = resolve_write_capabilities(&cols, policy).unwrap();
        assert_eq!(caps, WriteCapabilities { contact_phone: false, pickup_details: false });
    }

    #[test]
    fn missing_table() {
        let err = resolve_write_capabilities(&HashSet::new(), OptionalColumnPolicy::default()).unwrap_err();
        assert!(matches!(err, ReservationStoreError::SchemaError(_)));
    }
}
