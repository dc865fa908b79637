//! Infrastructure wiring: one store plus the catalog/customer lookups, shared
//! by both managers.

use std::sync::Arc;

use anyhow::Context;

use pizzeria_catalog::{CatalogLookup, InMemoryCatalog};
use pizzeria_customers::{CustomerLookup, InMemoryCustomers};
use pizzeria_infra::{
    CashShiftManager, InMemoryPosStore, OrderLifecycleManager, PosStore, PostgresCatalog,
    PostgresCustomers, PostgresPosStore,
};

use crate::config::ApiConfig;

pub type SharedStore = Arc<dyn PosStore>;
pub type SharedCatalog = Arc<dyn CatalogLookup>;
pub type SharedCustomers = Arc<dyn CustomerLookup>;

pub type ShiftService = CashShiftManager<SharedStore>;
pub type OrderService = OrderLifecycleManager<SharedStore, SharedCatalog, SharedCustomers>;

pub struct AppServices {
    pub shifts: ShiftService,
    pub orders: OrderService,
}

impl AppServices {
    pub fn new(store: SharedStore, catalog: SharedCatalog, customers: SharedCustomers) -> Self {
        Self {
            shifts: CashShiftManager::new(store.clone()),
            orders: OrderLifecycleManager::new(store, catalog, customers),
        }
    }

    /// In-memory wiring (dev/test). Catalog and customers are seeded by the caller.
    pub fn in_memory(catalog: Arc<InMemoryCatalog>, customers: Arc<InMemoryCustomers>) -> Self {
        Self::new(Arc::new(InMemoryPosStore::new()), catalog, customers)
    }

    /// Postgres wiring: one pool shared by the store and both lookups.
    pub async fn postgres(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let store = PostgresPosStore::connect(database_url, max_connections)
            .await
            .context("failed to connect to Postgres")?;
        store
            .ensure_schema()
            .await
            .context("failed to bootstrap the POS schema")?;

        let pool = store.pool().clone();
        Ok(Self::new(
            Arc::new(store),
            Arc::new(PostgresCatalog::new(pool.clone())),
            Arc::new(PostgresCustomers::new(pool)),
        ))
    }
}

pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    match &config.database_url {
        Some(url) => {
            tracing::info!(max_connections = config.database_max_connections, "using Postgres stores");
            AppServices::postgres(url, config.database_max_connections).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            Ok(AppServices::in_memory(
                Arc::new(InMemoryCatalog::new()),
                Arc::new(InMemoryCustomers::new()),
            ))
        }
    }
}
