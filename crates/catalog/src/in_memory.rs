use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use pizzeria_core::{Money, StoreError, TenantId};

use crate::combo::{Combo, ComboId};
use crate::lookup::CatalogLookup;
use crate::product::{Product, ProductId};

/// In-memory catalog for tests/dev, keyed by `(tenant, id)`.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<(TenantId, ProductId), Product>>,
    combos: RwLock<HashMap<(TenantId, ComboId), Combo>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_product(&self, product: Product) {
        if let Ok(mut map) = self.products.write() {
            map.insert((product.tenant_id, product.id), product);
        }
    }

    pub fn upsert_combo(&self, combo: Combo) {
        if let Ok(mut map) = self.combos.write() {
            map.insert((combo.tenant_id, combo.id), combo);
        }
    }

    /// Change a product's list price; returns `false` if the product is unknown.
    pub fn set_product_price(&self, tenant_id: TenantId, id: ProductId, price: Money) -> bool {
        let Ok(mut map) = self.products.write() else {
            return false;
        };
        match map.get_mut(&(tenant_id, id)) {
            Some(product) => product.reprice(price).is_ok(),
            None => false,
        }
    }

    pub fn set_combo_price(&self, tenant_id: TenantId, id: ComboId, price: Money) -> bool {
        let Ok(mut map) = self.combos.write() else {
            return false;
        };
        match map.get_mut(&(tenant_id, id)) {
            Some(combo) => combo.reprice(price).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn get_product(
        &self,
        tenant_id: TenantId,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        let map = self
            .products
            .read()
            .map_err(|_| StoreError::backend("get_product", "catalog lock poisoned"))?;
        Ok(map.get(&(tenant_id, id)).cloned())
    }

    async fn get_combo(&self, tenant_id: TenantId, id: ComboId) -> Result<Option<Combo>, StoreError> {
        let map = self
            .combos
            .read()
            .map_err(|_| StoreError::backend("get_combo", "catalog lock poisoned"))?;
        Ok(map.get(&(tenant_id, id)).cloned())
    }
}
