//! Postgres readers for the catalog and customer tables.
//!
//! Those tables are owned by the CRUD side of the system; this module only
//! reads them, always filtered by tenant.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use pizzeria_catalog::{CatalogLookup, Combo, ComboComponent, ComboId, Product, ProductId};
use pizzeria_core::{Money, StoreError, TenantId};
use pizzeria_customers::{Address, AddressId, Customer, CustomerId, CustomerLookup};

use crate::store::postgres::map_sqlx_error;

fn corrupt(e: sqlx::Error) -> StoreError {
    StoreError::corrupt(e.to_string())
}

#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: Arc<PgPool>,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl CatalogLookup for PostgresCatalog {
    #[instrument(skip(self), fields(tenant_id = %tenant_id, product_id = %id), err)]
    async fn get_product(
        &self,
        tenant_id: TenantId,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, title, description, category, price, active
            FROM products
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Product {
            id: ProductId::from(row.try_get::<Uuid, _>("id").map_err(corrupt)?),
            tenant_id: TenantId::from_uuid(row.try_get("tenant_id").map_err(corrupt)?),
            title: row.try_get("title").map_err(corrupt)?,
            description: row.try_get("description").map_err(corrupt)?,
            category: row.try_get("category").map_err(corrupt)?,
            price: Money::new(row.try_get::<Decimal, _>("price").map_err(corrupt)?),
            active: row.try_get("active").map_err(corrupt)?,
        }))
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, combo_id = %id), err)]
    async fn get_combo(&self, tenant_id: TenantId, id: ComboId) -> Result<Option<Combo>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, name, price, active
            FROM combos
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_combo", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let component_rows = sqlx::query(
            r#"
            SELECT product_id, quantity
            FROM combo_items
            WHERE combo_id = $1
            ORDER BY position
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_combo_items", e))?;

        let components = component_rows
            .iter()
            .map(|r| {
                let quantity: i32 = r.try_get("quantity").map_err(corrupt)?;
                Ok(ComboComponent {
                    product_id: ProductId::from(r.try_get::<Uuid, _>("product_id").map_err(corrupt)?),
                    quantity: u32::try_from(quantity)
                        .map_err(|_| StoreError::corrupt(format!("negative combo quantity {quantity}")))?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(Some(Combo {
            id: ComboId::from(row.try_get::<Uuid, _>("id").map_err(corrupt)?),
            tenant_id: TenantId::from_uuid(row.try_get("tenant_id").map_err(corrupt)?),
            name: row.try_get("name").map_err(corrupt)?,
            price: Money::new(row.try_get::<Decimal, _>("price").map_err(corrupt)?),
            active: row.try_get("active").map_err(corrupt)?,
            components,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct PostgresCustomers {
    pool: Arc<PgPool>,
}

impl PostgresCustomers {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl CustomerLookup for PostgresCustomers {
    #[instrument(skip(self), fields(tenant_id = %tenant_id, customer_id = %id), err)]
    async fn get_customer(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, name, phone
            FROM customers
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_customer", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let address_rows = sqlx::query(
            r#"
            SELECT id, street, number, description
            FROM addresses
            WHERE customer_id = $1
            ORDER BY id
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_customer_addresses", e))?;

        let addresses = address_rows
            .iter()
            .map(|r| {
                Ok(Address {
                    id: AddressId::from(r.try_get::<Uuid, _>("id").map_err(corrupt)?),
                    street: r.try_get("street").map_err(corrupt)?,
                    number: r.try_get("number").map_err(corrupt)?,
                    description: r.try_get("description").map_err(corrupt)?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(Some(Customer {
            id: CustomerId::from(row.try_get::<Uuid, _>("id").map_err(corrupt)?),
            tenant_id: TenantId::from_uuid(row.try_get("tenant_id").map_err(corrupt)?),
            name: row.try_get("name").map_err(corrupt)?,
            phone: row.try_get("phone").map_err(corrupt)?,
            addresses,
        }))
    }
}
