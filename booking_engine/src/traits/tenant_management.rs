use crate::{
    db_types::{NewTenant, Tenant, TenantId},
    traits::ReservationStoreError,
};

/// The tenant directory. Tenants carry the data the reconciliation flow needs: a display name and optional initials
/// for reservation number prefixes, the webhook signing secret and operational alert recipients.
#[allow(async_fn_in_trait)]
pub trait TenantManagement {
    async fn fetch_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, ReservationStoreError>;

    /// Creates the tenant, or replaces the details of an existing one with the same id.
    async fn upsert_tenant(&self, tenant: NewTenant) -> Result<Tenant, ReservationStoreError>;
}
