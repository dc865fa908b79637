//! Cash Shift Manager: open/close lifecycle of a tenant's register.
//!
//! ```text
//! open(start)          close(end)
//!   ∅ ─────────▶ OPEN ─────────▶ CLOSED
//!                 │
//!                 └─ every order of the shift ─▶ DELIVERED (same transaction)
//! ```

use chrono::Utc;
use tracing::{info, instrument, warn};

use pizzeria_core::{Aggregate, DomainEvent, Money, StoreError, TenantId};
use pizzeria_orders::{DeliverOnShiftClose, Order, OrderCommand, ShiftSummary};
use pizzeria_register::{CashShift, CashShiftCommand, CashShiftId, CloseShift, OpenShift};

use crate::error::{PosError, shift_command_error};
use crate::store::{OrderScope, PosStore, TenantTransaction};

/// Outcome of closing a shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedShift {
    pub shift: CashShift,
    /// Number of orders force-transitioned to `DELIVERED`.
    pub delivered_orders: usize,
}

#[derive(Debug, Clone)]
pub struct CashShiftManager<S> {
    store: S,
}

/// The tenant's open shift inside `tx`, or `NoOpenShift`.
pub(crate) async fn require_open_shift(
    tx: &mut dyn TenantTransaction,
) -> Result<CashShift, PosError> {
    tx.find_open_shift().await?.ok_or(PosError::NoOpenShift)
}

impl<S> CashShiftManager<S>
where
    S: PosStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Open a new shift. Check-and-insert happen inside one tenant transaction.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, start_amount = %start_amount), err)]
    pub async fn open(&self, tenant_id: TenantId, start_amount: Money) -> Result<CashShift, PosError> {
        let mut tx = self.store.begin(tenant_id).await?;

        if let Some(existing) = tx.find_open_shift().await? {
            warn!(open_shift_id = %existing.id_typed(), "open rejected: shift already open");
            return Err(PosError::ShiftAlreadyOpen);
        }

        let shift_id = CashShiftId::generate();
        let mut shift = CashShift::empty(shift_id);
        let events = shift
            .execute(&CashShiftCommand::OpenShift(OpenShift {
                tenant_id,
                shift_id,
                start_amount,
                occurred_at: Utc::now(),
            }))
            .map_err(shift_command_error)?;

        tx.insert_shift(&shift).await.map_err(|e| match e {
            StoreError::Conflict(_) => PosError::ShiftAlreadyOpen,
            other => other.into(),
        })?;
        tx.commit().await?;

        for event in &events {
            info!(event_type = event.event_type(), shift_id = %shift_id, "cash shift opened");
        }
        Ok(shift)
    }

    /// Close the open shift and deliver every order attached to it, as one unit.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, end_amount = %end_amount), err)]
    pub async fn close(&self, tenant_id: TenantId, end_amount: Money) -> Result<ClosedShift, PosError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let mut shift = require_open_shift(tx.as_mut()).await?;
        let shift_id = shift.id_typed();
        let now = Utc::now();

        let events = shift
            .execute(&CashShiftCommand::CloseShift(CloseShift {
                tenant_id,
                shift_id,
                end_amount,
                occurred_at: now,
            }))
            .map_err(shift_command_error)?;

        let orders = tx.list_orders(OrderScope::Shift(shift_id)).await?;
        let delivered_orders = orders.len();
        for mut order in orders {
            order.execute(&OrderCommand::DeliverOnShiftClose(DeliverOnShiftClose {
                tenant_id,
                order_id: order.id_typed(),
                cash_shift_id: shift_id,
                occurred_at: now,
            }))?;
            tx.update_order(&order).await?;
        }

        tx.update_shift(&shift).await?;
        tx.commit().await?;

        for event in &events {
            info!(
                event_type = event.event_type(),
                shift_id = %shift_id,
                delivered_orders,
                "cash shift closed"
            );
        }
        Ok(ClosedShift {
            shift,
            delivered_orders,
        })
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn get_open(&self, tenant_id: TenantId) -> Result<CashShift, PosError> {
        let mut tx = self.store.begin(tenant_id).await?;
        require_open_shift(tx.as_mut()).await
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, shift_id = %shift_id))]
    pub async fn get_by_id(
        &self,
        tenant_id: TenantId,
        shift_id: CashShiftId,
    ) -> Result<CashShift, PosError> {
        let mut tx = self.store.begin(tenant_id).await?;
        tx.find_shift(shift_id)
            .await?
            .ok_or(PosError::ShiftNotFound(shift_id))
    }

    /// Every shift of the tenant, most recently opened first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn list_all(&self, tenant_id: TenantId) -> Result<Vec<CashShift>, PosError> {
        let mut tx = self.store.begin(tenant_id).await?;
        Ok(tx.list_shifts().await?)
    }

    /// Orders attached to one shift, newest first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, shift_id = %shift_id))]
    pub async fn orders_of(
        &self,
        tenant_id: TenantId,
        shift_id: CashShiftId,
    ) -> Result<Vec<Order>, PosError> {
        let mut tx = self.store.begin(tenant_id).await?;
        if tx.find_shift(shift_id).await?.is_none() {
            return Err(PosError::ShiftNotFound(shift_id));
        }
        Ok(tx.list_orders(OrderScope::Shift(shift_id)).await?)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, shift_id = %shift_id))]
    pub async fn summary(
        &self,
        tenant_id: TenantId,
        shift_id: CashShiftId,
    ) -> Result<ShiftSummary, PosError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let shift = tx
            .find_shift(shift_id)
            .await?
            .ok_or(PosError::ShiftNotFound(shift_id))?;
        let orders = tx.list_orders(OrderScope::Shift(shift_id)).await?;
        Ok(ShiftSummary::compute(&shift, &orders)?)
    }
}
