//! Order Lifecycle Manager: order creation and post-creation mutation.
//!
//! Creation runs in this order: payment status default, customer, delivery
//! address, open shift, pricing, persist. The first failing step decides the
//! error and nothing is written. Pricing runs outside any store transaction;
//! the insert re-validates the shift under the tenant lock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use pizzeria_catalog::{CatalogLookup, ComboId, ProductId};
use pizzeria_core::{Aggregate, DomainEvent, Money, StoreError, TenantId};
use pizzeria_customers::{AddressId, Customer, CustomerId, CustomerLookup};
use pizzeria_orders::{
    ChangeStatus, DeliveryAddress, DeliveryMethod, LineItem, LineRequest, Order, OrderCommand,
    OrderEvent, OrderId, OrderLineId, OrderStatus, PaymentMethod, PaymentStatus, PlaceOrder,
    UpdateDetails, price_lines,
};
use pizzeria_register::CashShiftId;

use crate::error::PosError;
use crate::shifts::require_open_shift;
use crate::store::{OrderScope, PosStore};

/// Placeholder name for a line whose item no longer resolves in the catalog.
pub const UNKNOWN_ITEM: &str = "Unknown item";

/// Input of [`OrderLifecycleManager::create_order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    pub address_id: Option<AddressId>,
    pub manual_address: Option<String>,
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub payment_status: Option<PaymentStatus>,
    pub note: Option<String>,
    pub items: Vec<LineRequest>,
}

/// Partial update of an order's payment/delivery details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsPatch {
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_method: Option<DeliveryMethod>,
}

/// An order as presented to callers: stored fields plus names resolved at
/// read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub cash_shift_id: Option<CashShiftId>,
    pub customer_id: Option<CustomerId>,
    pub customer_name: Option<String>,
    pub address_id: Option<AddressId>,
    pub delivery_address: Option<String>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_method: DeliveryMethod,
    pub note: Option<String>,
    pub total: Money,
    pub created_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderLineView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineView {
    pub id: OrderLineId,
    pub line_no: u32,
    pub product_id: Option<ProductId>,
    pub combo_id: Option<ComboId>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[derive(Debug, Clone)]
pub struct OrderLifecycleManager<S, C, U> {
    store: S,
    catalog: C,
    customers: U,
}

impl<S, C, U> OrderLifecycleManager<S, C, U>
where
    S: PosStore,
    C: CatalogLookup,
    U: CustomerLookup,
{
    pub fn new(store: S, catalog: C, customers: U) -> Self {
        Self {
            store,
            catalog,
            customers,
        }
    }

    #[instrument(
        skip(self, request),
        fields(tenant_id = %tenant_id, lines = request.items.len()),
        err
    )]
    pub async fn create_order(
        &self,
        tenant_id: TenantId,
        request: NewOrder,
    ) -> Result<OrderView, PosError> {
        let payment_status = request.payment_status.unwrap_or_default();

        let customer = match request.customer_id {
            Some(id) => Some(self.find_customer(tenant_id, id).await?),
            None => None,
        };

        let delivery_address = resolve_delivery_address(
            customer.as_ref(),
            request.address_id,
            request.manual_address.as_deref(),
        )?;

        let mut tx = self.store.begin(tenant_id).await?;
        let shift = require_open_shift(tx.as_mut()).await?;
        drop(tx);

        // No transaction is held while the catalog is consulted: the lookup may
        // need a connection from the same pool.
        let priced = price_lines(&self.catalog, tenant_id, &request.items).await?;
        debug!(total = %priced.total, "order priced");

        let order_id = OrderId::generate();
        let mut order = Order::empty(order_id);
        let events = order.execute(&OrderCommand::PlaceOrder(PlaceOrder {
            tenant_id,
            order_id,
            cash_shift_id: shift.id_typed(),
            customer_id: customer.as_ref().map(|c| c.id),
            delivery_address,
            payment_status,
            payment_method: request.payment_method,
            delivery_method: request.delivery_method,
            note: request.note,
            lines: priced.lines,
            occurred_at: Utc::now(),
        }))?;

        let mut tx = self.store.begin(tenant_id).await?;
        tx.insert_order(&order).await.map_err(|e| match e {
            StoreError::Conflict(reason) => {
                warn!(
                    %reason,
                    cash_shift_id = %shift.id_typed(),
                    "shift closed while order was priced"
                );
                PosError::NoOpenShift
            }
            other => other.into(),
        })?;
        tx.commit().await?;

        log_events(&events);
        Ok(self.present(tenant_id, &order, &mut NameCache::default()).await)
    }

    /// Overwrite the order status (any status may follow any other) and,
    /// when given, the payment status.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, order_id = %order_id), err)]
    pub async fn update_status(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<OrderView, PosError> {
        let command = OrderCommand::ChangeStatus(ChangeStatus {
            tenant_id,
            order_id,
            status,
            payment_status,
            occurred_at: Utc::now(),
        });
        let order = self.mutate(tenant_id, order_id, &command).await?;
        Ok(self.present(tenant_id, &order, &mut NameCache::default()).await)
    }

    /// Apply the present fields of `patch`; status and lines are never touched.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, order_id = %order_id), err)]
    pub async fn update_details(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        patch: DetailsPatch,
    ) -> Result<OrderView, PosError> {
        let command = OrderCommand::UpdateDetails(UpdateDetails {
            tenant_id,
            order_id,
            payment_status: patch.payment_status,
            payment_method: patch.payment_method,
            delivery_method: patch.delivery_method,
            occurred_at: Utc::now(),
        });
        let order = self.mutate(tenant_id, order_id, &command).await?;
        Ok(self.present(tenant_id, &order, &mut NameCache::default()).await)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, order_id = %order_id))]
    pub async fn get(&self, tenant_id: TenantId, order_id: OrderId) -> Result<OrderView, PosError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let order = tx
            .find_order(order_id)
            .await?
            .ok_or(PosError::OrderNotFound(order_id))?;
        drop(tx);
        Ok(self.present(tenant_id, &order, &mut NameCache::default()).await)
    }

    /// Orders of the currently open shift, newest first; empty when the
    /// register is closed.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn list_open(&self, tenant_id: TenantId) -> Result<Vec<OrderView>, PosError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let orders = match tx.find_open_shift().await? {
            Some(shift) => tx.list_orders(OrderScope::Shift(shift.id_typed())).await?,
            None => Vec::new(),
        };
        drop(tx);
        Ok(self.present_all(tenant_id, &orders).await)
    }

    /// Every order of the tenant across all shifts, newest first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn list_historic(&self, tenant_id: TenantId) -> Result<Vec<OrderView>, PosError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let orders = tx.list_orders(OrderScope::All).await?;
        drop(tx);
        Ok(self.present_all(tenant_id, &orders).await)
    }

    /// Presentation for orders obtained elsewhere (e.g. a shift's order list).
    pub async fn present_all(&self, tenant_id: TenantId, orders: &[Order]) -> Vec<OrderView> {
        let mut cache = NameCache::default();
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(self.present(tenant_id, order, &mut cache).await);
        }
        views
    }

    async fn find_customer(&self, tenant_id: TenantId, id: CustomerId) -> Result<Customer, PosError> {
        self.customers
            .get_customer(tenant_id, id)
            .await?
            .filter(|c| c.tenant_id == tenant_id)
            .ok_or(PosError::CustomerNotFound(id))
    }

    async fn mutate(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        command: &OrderCommand,
    ) -> Result<Order, PosError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let mut order = tx
            .find_order(order_id)
            .await?
            .ok_or(PosError::OrderNotFound(order_id))?;

        let events = order.execute(command)?;
        if !events.is_empty() {
            tx.update_order(&order).await?;
            tx.commit().await?;
        }

        log_events(&events);
        Ok(order)
    }

    async fn present(&self, tenant_id: TenantId, order: &Order, cache: &mut NameCache) -> OrderView {
        let customer = match order.customer_id() {
            Some(id) => cache.customer(&self.customers, tenant_id, id).await,
            None => None,
        };

        let (address_id, delivery_address) = match order.delivery_address() {
            Some(DeliveryAddress::Manual(text)) => (None, Some(text.clone())),
            Some(DeliveryAddress::Registered(id)) => (
                Some(*id),
                customer
                    .as_ref()
                    .and_then(|c| c.address(*id))
                    .map(|a| a.display_line()),
            ),
            None => (None, None),
        };

        let mut items = Vec::with_capacity(order.lines().len());
        for line in order.lines() {
            items.push(OrderLineView {
                id: line.id,
                line_no: line.line_no,
                product_id: line.item.product_id(),
                combo_id: line.item.combo_id(),
                name: cache.item_name(&self.catalog, tenant_id, line.item).await,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            });
        }

        OrderView {
            id: order.id_typed(),
            cash_shift_id: order.cash_shift_id(),
            customer_id: order.customer_id(),
            customer_name: customer.map(|c| c.name),
            address_id,
            delivery_address,
            order_status: order.status(),
            payment_status: order.payment_status(),
            payment_method: order.payment_method(),
            delivery_method: order.delivery_method(),
            note: order.note().map(str::to_owned),
            total: order.total(),
            created_at: order.created_at(),
            items,
        }
    }
}

/// Decide the order's delivery target.
///
/// A non-blank manual address wins; otherwise a registered address must belong
/// to the order's customer.
fn resolve_delivery_address(
    customer: Option<&Customer>,
    address_id: Option<AddressId>,
    manual_address: Option<&str>,
) -> Result<Option<DeliveryAddress>, PosError> {
    if let Some(text) = manual_address.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(Some(DeliveryAddress::Manual(text.to_owned())));
    }

    match address_id {
        None => Ok(None),
        Some(id) => customer
            .and_then(|c| c.address(id))
            .map(|a| Some(DeliveryAddress::Registered(a.id)))
            .ok_or(PosError::AddressNotFound(id)),
    }
}

fn log_events(events: &[OrderEvent]) {
    for event in events {
        match event {
            OrderEvent::OrderPlaced(e) => info!(
                event_type = event.event_type(),
                order_id = %e.order_id,
                cash_shift_id = %e.cash_shift_id,
                total = %e.total,
                "order placed"
            ),
            OrderEvent::OrderStatusChanged(e) => info!(
                event_type = event.event_type(),
                order_id = %e.order_id,
                from = %e.from,
                to = %e.to,
                "order status changed"
            ),
            OrderEvent::OrderDetailsUpdated(e) => info!(
                event_type = event.event_type(),
                order_id = %e.order_id,
                "order details updated"
            ),
        }
    }
}

/// Per-call memo of display names so a listing hits each collaborator once
/// per distinct item or customer. Lookup failures degrade to missing names.
#[derive(Default)]
struct NameCache {
    items: HashMap<LineItem, String>,
    customers: HashMap<CustomerId, Option<Customer>>,
}

impl NameCache {
    async fn item_name<C>(&mut self, catalog: &C, tenant_id: TenantId, item: LineItem) -> String
    where
        C: CatalogLookup + ?Sized,
    {
        if let Some(name) = self.items.get(&item) {
            return name.clone();
        }

        let resolved = match item {
            LineItem::Product(id) => catalog
                .get_product(tenant_id, id)
                .await
                .map(|p| p.map(|p| p.title)),
            LineItem::Combo(id) => catalog
                .get_combo(tenant_id, id)
                .await
                .map(|c| c.map(|c| c.name)),
        };
        let name = match resolved {
            Ok(Some(name)) => name,
            Ok(None) => UNKNOWN_ITEM.to_string(),
            Err(e) => {
                warn!(%item, error = %e, "catalog lookup failed while presenting order");
                UNKNOWN_ITEM.to_string()
            }
        };

        self.items.insert(item, name.clone());
        name
    }

    async fn customer<U>(&mut self, customers: &U, tenant_id: TenantId, id: CustomerId) -> Option<Customer>
    where
        U: CustomerLookup + ?Sized,
    {
        if let Some(cached) = self.customers.get(&id) {
            return cached.clone();
        }

        let customer = match customers.get_customer(tenant_id, id).await {
            Ok(found) => found.filter(|c| c.tenant_id == tenant_id),
            Err(e) => {
                warn!(customer_id = %id, error = %e, "customer lookup failed while presenting order");
                None
            }
        };

        self.customers.insert(id, customer.clone());
        customer
    }
}
