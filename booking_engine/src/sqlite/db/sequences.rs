use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{SequenceValue, TenantId};

/// Advances the tenant's counter by one and returns the new value in a single statement.
///
/// The upsert is atomic in SQLite, so concurrent callers are serialised by the database's write lock and can never
/// read the same value. A counter that does not exist yet starts at 1. The prefix is refreshed on every call, so a
/// change to the tenant's initials applies from the next number onwards.
pub async fn increment(
    tenant_id: &TenantId,
    prefix: &str,
    conn: &mut SqliteConnection,
) -> Result<SequenceValue, sqlx::Error> {
    let value: SequenceValue = sqlx::query_as(
        r#"
            INSERT INTO sequence_counters (tenant_id, prefix, last_value, updated_at)
            VALUES ($1, $2, 1, CURRENT_TIMESTAMP)
            ON CONFLICT (tenant_id) DO UPDATE SET
                last_value = sequence_counters.last_value + 1,
                prefix = excluded.prefix,
                updated_at = CURRENT_TIMESTAMP
            RETURNING prefix, last_value;
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(prefix)
    .fetch_one(conn)
    .await?;
    trace!("🔢️ Sequence for {tenant_id} advanced to {}", value.value);
    Ok(value)
}

/// Moves the tenant's counter up to `value`, which was issued elsewhere.
///
/// Returns `None`, leaving the counter untouched, if the counter is already at or beyond `value`. In that case `value`
/// may already have been issued locally. The comparison and the write are one statement, so this is as atomic as
/// [`increment`].
pub async fn advance_to(
    tenant_id: &TenantId,
    prefix: &str,
    value: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<SequenceValue>, sqlx::Error> {
    let advanced: Option<SequenceValue> = sqlx::query_as(
        r#"
            INSERT INTO sequence_counters (tenant_id, prefix, last_value, updated_at)
            VALUES ($1, $2, $3, CURRENT_TIMESTAMP)
            ON CONFLICT (tenant_id) DO UPDATE SET
                last_value = excluded.last_value,
                prefix = excluded.prefix,
                updated_at = CURRENT_TIMESTAMP
            WHERE sequence_counters.last_value < excluded.last_value
            RETURNING prefix, last_value;
        "#,
    )
    .bind(tenant_id.as_str())
    .bind(prefix)
    .bind(value)
    .fetch_optional(conn)
    .await?;
    match &advanced {
        Some(v) => trace!("🔢️ Sequence for {tenant_id} moved up to {}", v.value),
        None => trace!("🔢️ Sequence for {tenant_id} is already at or beyond {value}"),
    }
    Ok(advanced)
}

pub async fn fetch(tenant_id: &TenantId, conn: &mut SqliteConnection) -> Result<Option<SequenceValue>, sqlx::Error> {
    let value = sqlx::query_as("SELECT prefix, last_value FROM sequence_counters WHERE tenant_id = $1")
        .bind(tenant_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(value)
}
