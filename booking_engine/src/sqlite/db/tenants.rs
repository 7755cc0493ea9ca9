use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewTenant, Tenant, TenantId};

pub async fn fetch_tenant(id: &TenantId, conn: &mut SqliteConnection) -> Result<Option<Tenant>, sqlx::Error> {
    let tenant = sqlx::query_as("SELECT * FROM tenants WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(tenant)
}

/// Inserts the tenant, or overwrites the details of an existing tenant with the same id. The creation time of an
/// existing tenant is preserved.
pub async fn upsert_tenant(tenant: NewTenant, conn: &mut SqliteConnection) -> Result<Tenant, sqlx::Error> {
    let id = tenant.id.clone();
    let tenant = sqlx::query_as(
        r#"
            INSERT INTO tenants (id, display_name, initials, webhook_secret, alert_emails, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                display_name = excluded.display_name,
                initials = excluded.initials,
                webhook_secret = excluded.webhook_secret,
                alert_emails = excluded.alert_emails
            RETURNING *;
        "#,
    )
    .bind(tenant.id)
    .bind(tenant.display_name)
    .bind(tenant.initials)
    .bind(tenant.webhook_secret)
    .bind(tenant.alert_emails)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🏢️ Tenant {id} saved");
    Ok(tenant)
}
