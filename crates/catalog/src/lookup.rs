use std::sync::Arc;

use async_trait::async_trait;
use pizzeria_core::{StoreError, TenantId};

use crate::combo::{Combo, ComboId};
use crate::product::{Product, ProductId};

/// Read-only access to a tenant's catalog.
///
/// `Ok(None)` means "absent for this tenant": an item owned by another tenant is
/// indistinguishable from one that does not exist.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn get_product(
        &self,
        tenant_id: TenantId,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError>;

    async fn get_combo(&self, tenant_id: TenantId, id: ComboId) -> Result<Option<Combo>, StoreError>;
}

#[async_trait]
impl<C> CatalogLookup for Arc<C>
where
    C: CatalogLookup + ?Sized,
{
    async fn get_product(
        &self,
        tenant_id: TenantId,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        (**self).get_product(tenant_id, id).await
    }

    async fn get_combo(&self, tenant_id: TenantId, id: ComboId) -> Result<Option<Combo>, StoreError> {
        (**self).get_combo(tenant_id, id).await
    }
}
