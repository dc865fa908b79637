use std::sync::Arc;

use async_trait::async_trait;
use pizzeria_core::{StoreError, TenantId};

use crate::customer::{Customer, CustomerId};

/// Read-only access to a tenant's customers (with their addresses).
#[async_trait]
pub trait CustomerLookup: Send + Sync {
    /// `Ok(None)` when the customer does not exist for this tenant.
    async fn get_customer(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, StoreError>;
}

#[async_trait]
impl<C> CustomerLookup for Arc<C>
where
    C: CustomerLookup + ?Sized,
{
    async fn get_customer(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, StoreError> {
        (**self).get_customer(tenant_id, id).await
    }
}
