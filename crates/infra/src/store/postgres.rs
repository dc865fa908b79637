//! Postgres-backed store.
//!
//! Every transaction starts with `pg_advisory_xact_lock` on a key derived from
//! the tenant id, which serialises units of work per tenant while leaving other
//! tenants untouched. The partial unique index on open shifts and the
//! product-XOR-combo CHECK on `order_lines` back the same rules at the schema
//! level.
//!
//! ## Error Mapping
//!
//! | SQLx error | Postgres code | `StoreError` |
//! |------------|---------------|--------------|
//! | unique violation | `23505` | `Conflict` |
//! | foreign key / check violation | `23503` / `23514` | `Conflict` |
//! | other database error | any | `Backend` |
//! | pool closed, IO, TLS | n/a | `Backend` |

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use pizzeria_catalog::{ComboId, ProductId};
use pizzeria_core::{Money, StoreError, TenantId};
use pizzeria_customers::{AddressId, CustomerId};
use pizzeria_orders::{
    DeliveryAddress, LineItem, Order, OrderId, OrderLine, OrderLineId, OrderRecord,
};
use pizzeria_register::{CashShift, CashShiftId, CashShiftRecord};

use super::r#trait::{OrderScope, PosStore, TenantTransaction, ensure_owned};

const SCHEMA: &str = include_str!("schema.sql");

#[derive(Debug, Clone)]
pub struct PostgresPosStore {
    pool: Arc<PgPool>,
}

impl PostgresPosStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the shift/order tables and indexes when absent.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

/// Advisory lock key for a tenant (both halves of the UUID folded together).
fn tenant_lock_key(tenant_id: TenantId) -> i64 {
    let (hi, lo) = tenant_id.as_uuid().as_u64_pair();
    (hi ^ lo) as i64
}

#[async_trait]
impl PosStore for PostgresPosStore {
    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn begin(&self, tenant_id: TenantId) -> Result<Box<dyn TenantTransaction>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(tenant_lock_key(tenant_id))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("tenant_lock", e))?;

        Ok(Box::new(PostgresTransaction { tenant_id, tx }))
    }
}

struct PostgresTransaction {
    tenant_id: TenantId,
    tx: Transaction<'static, Postgres>,
}

const SHIFT_COLUMNS: &str =
    "id, tenant_id, status, started_at, ended_at, start_amount, end_amount, version";

const ORDER_COLUMNS: &str = "id, tenant_id, cash_shift_id, customer_id, address_id, \
     manual_address, status, payment_status, payment_method, delivery_method, note, total, \
     created_at, version";

impl PostgresTransaction {
    async fn shifts_where(
        &mut self,
        clause: &str,
        shift_id: Option<Uuid>,
    ) -> Result<Vec<CashShift>, StoreError> {
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM cash_shifts WHERE tenant_id = $1 {clause} \
             ORDER BY started_at DESC, id DESC"
        );
        let mut query = sqlx::query(&sql).bind(*self.tenant_id.as_uuid());
        if let Some(id) = shift_id {
            query = query.bind(id);
        }
        let rows = query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("select_shifts", e))?;

        rows.iter().map(shift_from_row).collect()
    }

    async fn orders_where(
        &mut self,
        clause: &str,
        id: Option<Uuid>,
    ) -> Result<Vec<Order>, StoreError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 {clause} \
             ORDER BY created_at DESC, id DESC"
        );
        let mut query = sqlx::query(&sql).bind(*self.tenant_id.as_uuid());
        if let Some(id) = id {
            query = query.bind(id);
        }
        let rows = query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("select_orders", e))?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows
            .iter()
            .map(|r| r.try_get("id"))
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("select_orders", e))?;

        let line_rows = sqlx::query(
            r#"
            SELECT id, order_id, line_no, product_id, combo_id, quantity, unit_price, subtotal
            FROM order_lines
            WHERE tenant_id = $1 AND order_id = ANY($2)
            ORDER BY order_id, line_no
            "#,
        )
        .bind(*self.tenant_id.as_uuid())
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("select_order_lines", e))?;

        let mut lines_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in &line_rows {
            let order_id: Uuid = row
                .try_get("order_id")
                .map_err(|e| map_sqlx_error("select_order_lines", e))?;
            lines_by_order
                .entry(order_id)
                .or_default()
                .push(line_from_row(row)?);
        }

        rows.iter()
            .map(|row| {
                let id: Uuid = row
                    .try_get("id")
                    .map_err(|e| map_sqlx_error("select_orders", e))?;
                order_from_row(row, lines_by_order.remove(&id).unwrap_or_default())
            })
            .collect()
    }
}

#[async_trait]
impl TenantTransaction for PostgresTransaction {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    async fn find_open_shift(&mut self) -> Result<Option<CashShift>, StoreError> {
        Ok(self
            .shifts_where("AND status = 'OPEN'", None)
            .await?
            .into_iter()
            .next())
    }

    async fn find_shift(&mut self, id: CashShiftId) -> Result<Option<CashShift>, StoreError> {
        Ok(self
            .shifts_where("AND id = $2", Some(*id.as_uuid()))
            .await?
            .into_iter()
            .next())
    }

    async fn list_shifts(&mut self) -> Result<Vec<CashShift>, StoreError> {
        self.shifts_where("", None).await
    }

    #[instrument(skip(self, shift), fields(shift_id = %shift.id_typed()), err)]
    async fn insert_shift(&mut self, shift: &CashShift) -> Result<(), StoreError> {
        let record = shift_record(self.tenant_id, shift)?;

        sqlx::query(
            r#"
            INSERT INTO cash_shifts (
                id, tenant_id, status, started_at, ended_at, start_amount, end_amount, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.tenant_id.as_uuid())
        .bind(record.status.as_str())
        .bind(record.started_at)
        .bind(record.ended_at)
        .bind(record.start_amount.amount())
        .bind(record.end_amount.map(|m| m.amount()))
        .bind(record.version as i64)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::conflict("tenant already has an open cash shift")
            } else {
                map_sqlx_error("insert_shift", e)
            }
        })?;

        Ok(())
    }

    #[instrument(skip(self, shift), fields(shift_id = %shift.id_typed()), err)]
    async fn update_shift(&mut self, shift: &CashShift) -> Result<(), StoreError> {
        let record = shift_record(self.tenant_id, shift)?;

        let result = sqlx::query(
            r#"
            UPDATE cash_shifts
            SET status = $3, ended_at = $4, end_amount = $5, version = $6
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(record.tenant_id.as_uuid())
        .bind(record.id.as_uuid())
        .bind(record.status.as_str())
        .bind(record.ended_at)
        .bind(record.end_amount.map(|m| m.amount()))
        .bind(record.version as i64)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_shift", e))?;

        if result.rows_affected() != 1 {
            return Err(StoreError::conflict(format!("cash shift {} does not exist", record.id)));
        }
        Ok(())
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders_where("AND id = $2", Some(*id.as_uuid()))
            .await?
            .into_iter()
            .next())
    }

    async fn list_orders(&mut self, scope: OrderScope) -> Result<Vec<Order>, StoreError> {
        match scope {
            OrderScope::All => self.orders_where("", None).await,
            OrderScope::Shift(shift_id) => {
                self.orders_where("AND cash_shift_id = $2", Some(*shift_id.as_uuid()))
                    .await
            }
        }
    }

    #[instrument(skip(self, order), fields(order_id = %order.id_typed()), err)]
    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        let record = order_record(self.tenant_id, order)?;

        let shift_open: Option<bool> = sqlx::query_scalar(
            "SELECT status = 'OPEN' FROM cash_shifts WHERE tenant_id = $1 AND id = $2",
        )
        .bind(record.tenant_id.as_uuid())
        .bind(record.cash_shift_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("check_order_shift", e))?;
        if shift_open != Some(true) {
            return Err(StoreError::conflict(format!(
                "order {} must reference the open cash shift",
                record.id
            )));
        }

        let (address_id, manual_address) = match &record.delivery_address {
            Some(DeliveryAddress::Registered(id)) => (Some(*id.as_uuid()), None),
            Some(DeliveryAddress::Manual(text)) => (None, Some(text.as_str())),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, tenant_id, cash_shift_id, customer_id, address_id, manual_address,
                status, payment_status, payment_method, delivery_method, note, total,
                created_at, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.tenant_id.as_uuid())
        .bind(record.cash_shift_id.as_uuid())
        .bind(record.customer_id.map(|c| *c.as_uuid()))
        .bind(address_id)
        .bind(manual_address)
        .bind(record.status.as_str())
        .bind(record.payment_status.as_str())
        .bind(record.payment_method.as_str())
        .bind(record.delivery_method.as_str())
        .bind(record.note.as_deref())
        .bind(record.total.amount())
        .bind(record.created_at)
        .bind(record.version as i64)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for line in &record.lines {
            let line_no = i32::try_from(line.line_no)
                .map_err(|_| StoreError::corrupt(format!("line_no {} out of range", line.line_no)))?;
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| StoreError::corrupt(format!("quantity {} out of range", line.quantity)))?;

            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    id, order_id, tenant_id, line_no, product_id, combo_id,
                    quantity, unit_price, subtotal
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(record.id.as_uuid())
            .bind(record.tenant_id.as_uuid())
            .bind(line_no)
            .bind(line.item.product_id().map(|p| *p.as_uuid()))
            .bind(line.item.combo_id().map(|c| *c.as_uuid()))
            .bind(quantity)
            .bind(line.unit_price.amount())
            .bind(line.subtotal.amount())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_line", e))?;
        }

        debug!(lines = record.lines.len(), "order inserted");
        Ok(())
    }

    #[instrument(skip(self, order), fields(order_id = %order.id_typed()), err)]
    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError> {
        let record = order_record(self.tenant_id, order)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3, payment_status = $4, payment_method = $5,
                delivery_method = $6, version = $7
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(record.tenant_id.as_uuid())
        .bind(record.id.as_uuid())
        .bind(record.status.as_str())
        .bind(record.payment_status.as_str())
        .bind(record.payment_method.as_str())
        .bind(record.delivery_method.as_str())
        .bind(record.version as i64)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_order", e))?;

        if result.rows_affected() != 1 {
            return Err(StoreError::conflict(format!("order {} does not exist", record.id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        this.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

fn shift_record(tx_tenant: TenantId, shift: &CashShift) -> Result<CashShiftRecord, StoreError> {
    ensure_owned(tx_tenant, shift.tenant_id(), "cash shift")?;
    shift
        .to_record()
        .ok_or_else(|| StoreError::corrupt("cash shift has not been opened"))
}

fn order_record(tx_tenant: TenantId, order: &Order) -> Result<OrderRecord, StoreError> {
    ensure_owned(tx_tenant, order.tenant_id(), "order")?;
    order
        .to_record()
        .ok_or_else(|| StoreError::corrupt("order has not been placed"))
}

// Row mapping

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::corrupt(format!("column {name}: {e}")))
}

fn parsed<T>(row: &PgRow, name: &str) -> Result<T, StoreError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    let raw: String = column(row, name)?;
    raw.parse()
        .map_err(|e| StoreError::corrupt(format!("column {name}: {e}")))
}

fn version(row: &PgRow) -> Result<u64, StoreError> {
    let raw: i64 = column(row, "version")?;
    u64::try_from(raw).map_err(|_| StoreError::corrupt(format!("negative version {raw}")))
}

fn shift_from_row(row: &PgRow) -> Result<CashShift, StoreError> {
    let record = CashShiftRecord {
        id: CashShiftId::from(column::<Uuid>(row, "id")?),
        tenant_id: TenantId::from_uuid(column(row, "tenant_id")?),
        status: parsed(row, "status")?,
        started_at: column::<DateTime<Utc>>(row, "started_at")?,
        ended_at: column::<Option<DateTime<Utc>>>(row, "ended_at")?,
        start_amount: Money::new(column::<Decimal>(row, "start_amount")?),
        end_amount: column::<Option<Decimal>>(row, "end_amount")?.map(Money::new),
        version: version(row)?,
    };
    CashShift::from_record(record).map_err(|e| StoreError::corrupt(e.to_string()))
}

fn line_from_row(row: &PgRow) -> Result<OrderLine, StoreError> {
    let product_id = column::<Option<Uuid>>(row, "product_id")?;
    let combo_id = column::<Option<Uuid>>(row, "combo_id")?;
    let item = match (product_id, combo_id) {
        (Some(p), None) => LineItem::Product(ProductId::from(p)),
        (None, Some(c)) => LineItem::Combo(ComboId::from(c)),
        _ => return Err(StoreError::corrupt("order line must reference a product xor a combo")),
    };
    let line_no: i32 = column(row, "line_no")?;
    let quantity: i32 = column(row, "quantity")?;

    Ok(OrderLine {
        id: OrderLineId::from(column::<Uuid>(row, "id")?),
        line_no: u32::try_from(line_no)
            .map_err(|_| StoreError::corrupt(format!("negative line_no {line_no}")))?,
        item,
        quantity: u32::try_from(quantity)
            .map_err(|_| StoreError::corrupt(format!("negative quantity {quantity}")))?,
        unit_price: Money::new(column(row, "unit_price")?),
        subtotal: Money::new(column(row, "subtotal")?),
    })
}

fn order_from_row(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order, StoreError> {
    let address_id = column::<Option<Uuid>>(row, "address_id")?;
    let manual_address = column::<Option<String>>(row, "manual_address")?;
    let delivery_address = match (address_id, manual_address) {
        (Some(id), None) => Some(DeliveryAddress::Registered(AddressId::from(id))),
        (None, Some(text)) => Some(DeliveryAddress::Manual(text)),
        (None, None) => None,
        (Some(_), Some(_)) => {
            return Err(StoreError::corrupt("order has both a registered and a manual address"));
        }
    };

    let record = OrderRecord {
        id: OrderId::from(column::<Uuid>(row, "id")?),
        tenant_id: TenantId::from_uuid(column(row, "tenant_id")?),
        cash_shift_id: CashShiftId::from(column::<Uuid>(row, "cash_shift_id")?),
        customer_id: column::<Option<Uuid>>(row, "customer_id")?.map(CustomerId::from),
        delivery_address,
        status: parsed(row, "status")?,
        payment_status: parsed(row, "payment_status")?,
        payment_method: parsed(row, "payment_method")?,
        delivery_method: parsed(row, "delivery_method")?,
        note: column(row, "note")?,
        total: Money::new(column(row, "total")?),
        created_at: column(row, "created_at")?,
        lines,
        version: version(row)?,
    };
    Order::from_record(record).map_err(|e| StoreError::corrupt(e.to_string()))
}

pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23503") | Some("23514") => StoreError::Conflict(msg),
                _ => StoreError::backend(operation, msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::backend(operation, "connection pool closed"),
        other => StoreError::backend(operation, other.to_string()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
