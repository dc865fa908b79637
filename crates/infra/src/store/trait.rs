use std::sync::Arc;

use async_trait::async_trait;

use pizzeria_core::{StoreError, TenantId};
use pizzeria_orders::{Order, OrderId};
use pizzeria_register::{CashShift, CashShiftId};

/// Which orders a listing covers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OrderScope {
    /// Every order of the tenant, across all shifts.
    All,
    /// Orders attached to one shift.
    Shift(CashShiftId),
}

/// Entry point of the store: hands out tenant-bound transactions.
#[async_trait]
pub trait PosStore: Send + Sync {
    /// Start a unit of work for `tenant_id`, waiting for any other unit of work
    /// of the same tenant to finish.
    async fn begin(&self, tenant_id: TenantId) -> Result<Box<dyn TenantTransaction>, StoreError>;
}

#[async_trait]
impl<S> PosStore for Arc<S>
where
    S: PosStore + ?Sized,
{
    async fn begin(&self, tenant_id: TenantId) -> Result<Box<dyn TenantTransaction>, StoreError> {
        (**self).begin(tenant_id).await
    }
}

/// A unit of work bound to one tenant.
///
/// Every method is implicitly scoped to [`TenantTransaction::tenant_id`]; writes
/// of aggregates owned by another tenant fail with
/// `StoreError::TenantIsolation`.
#[async_trait]
pub trait TenantTransaction: Send {
    fn tenant_id(&self) -> TenantId;

    async fn find_open_shift(&mut self) -> Result<Option<CashShift>, StoreError>;

    async fn find_shift(&mut self, id: CashShiftId) -> Result<Option<CashShift>, StoreError>;

    /// All shifts, most recently started first.
    async fn list_shifts(&mut self) -> Result<Vec<CashShift>, StoreError>;

    /// Insert a new shift. Fails with `StoreError::Conflict` if the shift is
    /// open and the tenant already has an open shift.
    async fn insert_shift(&mut self, shift: &CashShift) -> Result<(), StoreError>;

    /// Persist the status/end fields of an existing shift.
    async fn update_shift(&mut self, shift: &CashShift) -> Result<(), StoreError>;

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Orders in scope, newest first.
    async fn list_orders(&mut self, scope: OrderScope) -> Result<Vec<Order>, StoreError>;

    /// Insert an order with its lines. Fails with `StoreError::Conflict` unless
    /// the order's shift exists and is open.
    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;

    /// Persist the mutable fields (statuses, methods) of an existing order.
    /// Lines and total are never rewritten.
    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

pub(crate) fn ensure_owned(
    tx_tenant: TenantId,
    owner: Option<TenantId>,
    what: &str,
) -> Result<TenantId, StoreError> {
    match owner {
        Some(t) if t == tx_tenant => Ok(t),
        Some(t) => Err(StoreError::tenant_isolation(format!(
            "{what} belongs to tenant {t}, transaction is bound to {tx_tenant}"
        ))),
        None => Err(StoreError::corrupt(format!("{what} has not been initialised"))),
    }
}
