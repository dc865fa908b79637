use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use pizzeria_core::{StoreError, TenantId};

use crate::customer::{Customer, CustomerId};
use crate::lookup::CustomerLookup;

/// In-memory customer directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCustomers {
    inner: RwLock<HashMap<(TenantId, CustomerId), Customer>>,
}

impl InMemoryCustomers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, customer: Customer) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((customer.tenant_id, customer.id), customer);
        }
    }
}

#[async_trait]
impl CustomerLookup for InMemoryCustomers {
    async fn get_customer(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("get_customer", "customer lock poisoned"))?;
        Ok(map.get(&(tenant_id, id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn customer_of_another_tenant_is_not_found() {
        let customers = InMemoryCustomers::new();
        let owner = TenantId::new();
        let customer = Customer::new(owner, "Martín").unwrap();
        let id = customer.id;
        customers.upsert(customer);

        assert!(customers.get_customer(owner, id).await.unwrap().is_some());
        assert!(customers.get_customer(TenantId::new(), id).await.unwrap().is_none());
    }
}
