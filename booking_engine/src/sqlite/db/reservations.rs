use chrono::Utc;
use log::{debug, warn};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::capabilities::WriteCapabilities;
use crate::{
    db_types::{NewReservation, PaymentReference, Reservation, ReservationStatus, TenantId},
    traits::ReservationStoreError,
};

pub async fn fetch_by_payment_reference(
    reference: &PaymentReference,
    conn: &mut SqliteConnection,
) -> Result<Option<Reservation>, sqlx::Error> {
    let reservation = sqlx::query_as("SELECT * FROM reservations WHERE payment_reference = $1")
        .bind(reference.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(reservation)
}

pub async fn fetch_for_tenant(tenant_id: &TenantId, conn: &mut SqliteConnection) -> Result<Vec<Reservation>, sqlx::Error> {
    let reservations = sqlx::query_as("SELECT * FROM reservations WHERE tenant_id = $1 ORDER BY id")
        .bind(tenant_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(reservations)
}

/// Inserts a new, confirmed reservation. Only the optional columns permitted by `caps` are written.
///
/// Uniqueness violations are reported as [`ReservationStoreError::DuplicatePaymentReference`] or
/// [`ReservationStoreError::DuplicateReservationNumber`] so that callers can tell a lost race for the payment apart
/// from a numbering fault.
pub async fn insert_reservation(
    reservation: NewReservation,
    caps: WriteCapabilities,
    conn: &mut SqliteConnection,
) -> Result<Reservation, ReservationStoreError> {
    let reference = reservation.payment_reference.clone();
    let number = reservation.reservation_number.clone();
    if !caps.contact_phone && reservation.contact_phone.is_some() {
        warn!("🗃️ Contact phone for payment {reference} is not stored: the column is disabled for this deployment");
    }
    if !caps.pickup_details && reservation.has_pickup_details() {
        warn!("🗃️ Pickup details for payment {reference} are not stored: the columns are disabled for this deployment");
    }
    let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO reservations (");
    let mut columns = builder.separated(", ");
    columns.push("tenant_id");
    columns.push("payment_reference");
    columns.push("reservation_number");
    columns.push("status");
    columns.push("activity_date");
    columns.push("activity");
    columns.push("adults");
    columns.push("children");
    columns.push("contact_name");
    columns.push("contact_email");
    if caps.contact_phone {
        columns.push("contact_phone");
    }
    if caps.pickup_details {
        columns.push("pickup_location");
        columns.push("pickup_time");
    }
    columns.push("amount");
    columns.push("currency");
    columns.push("created_at");
    builder.push(") VALUES (");
    let mut values = builder.separated(", ");
    values.push_bind(reservation.tenant_id);
    values.push_bind(reservation.payment_reference);
    values.push_bind(reservation.reservation_number);
    values.push_bind(ReservationStatus::Confirmed);
    values.push_bind(reservation.activity_date);
    values.push_bind(reservation.activity);
    values.push_bind(reservation.adults);
    values.push_bind(reservation.children);
    values.push_bind(reservation.contact_name);
    values.push_bind(reservation.contact_email);
    if caps.contact_phone {
        values.push_bind(reservation.contact_phone);
    }
    if caps.pickup_details {
        values.push_bind(reservation.pickup_location);
        values.push_bind(reservation.pickup_time);
    }
    values.push_bind(reservation.amount);
    values.push_bind(reservation.currency);
    values.push_bind(Utc::now());
    builder.push(") RETURNING *;");
    let result = builder.build_query_as::<Reservation>().fetch_one(conn).await;
    match result {
        Ok(reservation) => {
            debug!("🗃️ Reservation {} saved with id {}", reservation.reservation_number, reservation.id);
            Ok(reservation)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            if e.message().contains("payment_reference") {
                Err(ReservationStoreError::DuplicatePaymentReference(reference))
            } else {
                Err(ReservationStoreError::DuplicateReservationNumber(number))
            }
        },
        Err(e) => Err(e.into()),
    }
}
