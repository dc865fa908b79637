use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use pizzeria_core::{StoreError, TenantId};
use pizzeria_orders::{Order, OrderId};
use pizzeria_register::{CashShift, CashShiftId};

use super::r#trait::{OrderScope, PosStore, TenantTransaction, ensure_owned};

#[derive(Debug, Clone, Default)]
struct TenantData {
    shifts: HashMap<CashShiftId, CashShift>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory store for tests/dev.
///
/// Each tenant's data sits behind its own async mutex; a transaction holds the
/// lock for its whole lifetime and works on a copy that replaces the original
/// on commit.
#[derive(Debug, Default)]
pub struct InMemoryPosStore {
    tenants: Mutex<HashMap<TenantId, Arc<AsyncMutex<TenantData>>>>,
}

impl InMemoryPosStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tenant_slot(&self, tenant_id: TenantId) -> Result<Arc<AsyncMutex<TenantData>>, StoreError> {
        let mut tenants = self
            .tenants
            .lock()
            .map_err(|_| StoreError::backend("begin", "tenant registry lock poisoned"))?;
        Ok(tenants.entry(tenant_id).or_default().clone())
    }
}

#[async_trait]
impl PosStore for InMemoryPosStore {
    async fn begin(&self, tenant_id: TenantId) -> Result<Box<dyn TenantTransaction>, StoreError> {
        let slot = self.tenant_slot(tenant_id)?;
        let guard = slot.lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            tenant_id,
            guard,
            working,
        }))
    }
}

struct InMemoryTransaction {
    tenant_id: TenantId,
    guard: OwnedMutexGuard<TenantData>,
    working: TenantData,
}

fn newest_first_by<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

#[async_trait]
impl TenantTransaction for InMemoryTransaction {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    async fn find_open_shift(&mut self) -> Result<Option<CashShift>, StoreError> {
        Ok(self.working.shifts.values().find(|s| s.is_open()).cloned())
    }

    async fn find_shift(&mut self, id: CashShiftId) -> Result<Option<CashShift>, StoreError> {
        Ok(self.working.shifts.get(&id).cloned())
    }

    async fn list_shifts(&mut self) -> Result<Vec<CashShift>, StoreError> {
        let shifts = self.working.shifts.values().cloned().collect();
        Ok(newest_first_by(shifts, |s: &CashShift| (s.started_at(), s.id_typed())))
    }

    async fn insert_shift(&mut self, shift: &CashShift) -> Result<(), StoreError> {
        ensure_owned(self.tenant_id, shift.tenant_id(), "cash shift")?;
        let id = shift.id_typed();
        if self.working.shifts.contains_key(&id) {
            return Err(StoreError::conflict(format!("cash shift {id} already exists")));
        }
        if shift.is_open() && self.working.shifts.values().any(CashShift::is_open) {
            return Err(StoreError::conflict("tenant already has an open cash shift"));
        }
        self.working.shifts.insert(id, shift.clone());
        Ok(())
    }

    async fn update_shift(&mut self, shift: &CashShift) -> Result<(), StoreError> {
        ensure_owned(self.tenant_id, shift.tenant_id(), "cash shift")?;
        let id = shift.id_typed();
        match self.working.shifts.get_mut(&id) {
            Some(existing) => {
                *existing = shift.clone();
                Ok(())
            }
            None => Err(StoreError::conflict(format!("cash shift {id} does not exist"))),
        }
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn list_orders(&mut self, scope: OrderScope) -> Result<Vec<Order>, StoreError> {
        let orders = self
            .working
            .orders
            .values()
            .filter(|o| match scope {
                OrderScope::All => true,
                OrderScope::Shift(shift_id) => o.cash_shift_id() == Some(shift_id),
            })
            .cloned()
            .collect();
        Ok(newest_first_by(orders, |o: &Order| (o.created_at(), o.id_typed())))
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        ensure_owned(self.tenant_id, order.tenant_id(), "order")?;
        let id = order.id_typed();
        if self.working.orders.contains_key(&id) {
            return Err(StoreError::conflict(format!("order {id} already exists")));
        }
        let shift_open = order
            .cash_shift_id()
            .and_then(|sid| self.working.shifts.get(&sid))
            .is_some_and(CashShift::is_open);
        if !shift_open {
            return Err(StoreError::conflict(format!(
                "order {id} must reference the open cash shift"
            )));
        }
        self.working.orders.insert(id, order.clone());
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError> {
        ensure_owned(self.tenant_id, order.tenant_id(), "order")?;
        let id = order.id_typed();
        match self.working.orders.get_mut(&id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(StoreError::conflict(format!("order {id} does not exist"))),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}
