//! `SqliteDatabase` is the concrete SQLite backend for the booking engine.
//!
//! It implements all the storage traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{
    capabilities::{self, OptionalColumnPolicy, WriteCapabilities},
    db_url,
    new_pool,
    reservations,
    sequences,
    tenants,
};
use crate::{
    db_types::{NewReservation, NewTenant, PaymentReference, Reservation, SequenceValue, Tenant, TenantId},
    helpers::derive_prefix,
    traits::{ReservationStore, ReservationStoreError, SequenceCounters, SequenceError, TenantManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    capabilities: WriteCapabilities,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?}, {:?})", self.pool, self.capabilities)
    }
}

impl ReservationStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_reservation_by_payment_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Reservation>, ReservationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let reservation = reservations::fetch_by_payment_reference(reference, &mut conn).await?;
        Ok(reservation)
    }

    async fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation, ReservationStoreError> {
        let mut conn = self.pool.acquire().await?;
        reservations::insert_reservation(reservation, self.capabilities, &mut conn).await
    }

    async fn fetch_reservations_for_tenant(&self, tenant: &TenantId) -> Result<Vec<Reservation>, ReservationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = reservations::fetch_for_tenant(tenant, &mut conn).await?;
        Ok(result)
    }

    async fn close(&mut self) -> Result<(), ReservationStoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl TenantManagement for SqliteDatabase {
    async fn fetch_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, ReservationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let tenant = tenants::fetch_tenant(id, &mut conn).await?;
        Ok(tenant)
    }

    async fn upsert_tenant(&self, tenant: NewTenant) -> Result<Tenant, ReservationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let tenant = tenants::upsert_tenant(tenant, &mut conn).await?;
        Ok(tenant)
    }
}

impl SequenceCounters for SqliteDatabase {
    async fn increment_sequence(&self, tenant: &Tenant) -> Result<SequenceValue, SequenceError> {
        let prefix = derive_prefix(tenant.initials.as_deref(), &tenant.display_name);
        let mut conn = self.pool.acquire().await?;
        let value = sequences::increment(&tenant.id, &prefix, &mut conn).await?;
        Ok(value)
    }

    async fn advance_sequence(&self, tenant: &Tenant, value: i64) -> Result<Option<SequenceValue>, SequenceError> {
        let prefix = derive_prefix(tenant.initials.as_deref(), &tenant.display_name);
        let mut conn = self.pool.acquire().await?;
        let advanced = sequences::advance_to(&tenant.id, &prefix, value, &mut conn).await?;
        Ok(advanced)
    }

    async fn fetch_sequence(&self, tenant: &TenantId) -> Result<Option<SequenceValue>, SequenceError> {
        let mut conn = self.pool.acquire().await?;
        let value = sequences::fetch(tenant, &mut conn).await?;
        Ok(value)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Connects to the database at `url`. All optional reservation columns are assumed to be present; call
    /// [`Self::with_write_capabilities`] to check them against the live schema.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool, capabilities: WriteCapabilities::default() })
    }

    /// Resolves which optional reservation columns can be written, from the actual schema of the database.
    ///
    /// Call this once at startup. It fails if an optional column is missing and `policy` does not allow it.
    pub async fn with_write_capabilities(mut self, policy: OptionalColumnPolicy) -> Result<Self, ReservationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let columns = capabilities::reservation_columns(&mut conn).await?;
        drop(conn);
        self.capabilities = capabilities::resolve_write_capabilities(&columns, policy)?;
        Ok(self)
    }

    /// Brings the schema up to date with the migrations embedded in this crate. Tables are only created if they do not
    /// exist yet, so older deployments keep their existing tables.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub fn capabilities(&self) -> WriteCapabilities {
        self.capabilities
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
