use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pizzeria_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainEvent, Money, TenantId, typed_id,
};
use pizzeria_customers::{AddressId, CustomerId};
use pizzeria_register::CashShiftId;

use crate::line::OrderLine;
use crate::status::{DeliveryMethod, OrderStatus, PaymentMethod, PaymentStatus};

typed_id!(
    /// Order identifier.
    OrderId(AggregateId)
);

/// Where an order goes: a registered address of its customer, or free text
/// typed at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DeliveryAddress {
    Registered(AddressId),
    Manual(String),
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    tenant_id: Option<TenantId>,
    cash_shift_id: Option<CashShiftId>,
    customer_id: Option<CustomerId>,
    delivery_address: Option<DeliveryAddress>,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    delivery_method: DeliveryMethod,
    note: Option<String>,
    total: Money,
    created_at: Option<DateTime<Utc>>,
    lines: Vec<OrderLine>,
    version: u64,
    created: bool,
}

/// Flat persisted shape of an order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub tenant_id: TenantId,
    pub cash_shift_id: CashShiftId,
    pub customer_id: Option<CustomerId>,
    pub delivery_address: Option<DeliveryAddress>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_method: DeliveryMethod,
    pub note: Option<String>,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
    pub version: u64,
}

impl Order {
    /// Create an empty, not-yet-placed instance.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            cash_shift_id: None,
            customer_id: None,
            delivery_address: None,
            status: OrderStatus::default(),
            payment_status: PaymentStatus::default(),
            payment_method: PaymentMethod::default(),
            delivery_method: DeliveryMethod::default(),
            note: None,
            total: Money::ZERO,
            created_at: None,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    /// Rebuild an order from storage, re-checking its line arithmetic.
    pub fn from_record(record: OrderRecord) -> Result<Self, DomainError> {
        check_lines(&record.lines, record.total)?;

        Ok(Self {
            id: record.id,
            tenant_id: Some(record.tenant_id),
            cash_shift_id: Some(record.cash_shift_id),
            customer_id: record.customer_id,
            delivery_address: record.delivery_address,
            status: record.status,
            payment_status: record.payment_status,
            payment_method: record.payment_method,
            delivery_method: record.delivery_method,
            note: record.note,
            total: record.total,
            created_at: Some(record.created_at),
            lines: record.lines,
            version: record.version,
            created: true,
        })
    }

    /// Persisted shape; `None` until the order has been placed.
    pub fn to_record(&self) -> Option<OrderRecord> {
        Some(OrderRecord {
            id: self.id,
            tenant_id: self.tenant_id?,
            cash_shift_id: self.cash_shift_id?,
            customer_id: self.customer_id,
            delivery_address: self.delivery_address.clone(),
            status: self.status,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            delivery_method: self.delivery_method,
            note: self.note.clone(),
            total: self.total,
            created_at: self.created_at?,
            lines: self.lines.clone(),
            version: self.version,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn cash_shift_id(&self) -> Option<CashShiftId> {
        self.cash_shift_id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn delivery_address(&self) -> Option<&DeliveryAddress> {
        self.delivery_address.as_ref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn delivery_method(&self) -> DeliveryMethod {
        self.delivery_method
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn is_placed(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder.
///
/// Carries already-priced lines; pricing happens before the aggregate sees the
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub cash_shift_id: CashShiftId,
    pub customer_id: Option<CustomerId>,
    pub delivery_address: Option<DeliveryAddress>,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_method: DeliveryMethod,
    pub note: Option<String>,
    pub lines: Vec<OrderLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateDetails. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDetails {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_method: Option<DeliveryMethod>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeliverOnShiftClose.
///
/// Issued for every order of a shift that is being closed. Unconditional: a
/// cancelled order is delivered too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverOnShiftClose {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub cash_shift_id: CashShiftId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceOrder(PlaceOrder),
    ChangeStatus(ChangeStatus),
    UpdateDetails(UpdateDetails),
    DeliverOnShiftClose(DeliverOnShiftClose),
}

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub cash_shift_id: CashShiftId,
    pub customer_id: Option<CustomerId>,
    pub delivery_address: Option<DeliveryAddress>,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_method: DeliveryMethod,
    pub note: Option<String>,
    pub lines: Vec<OrderLine>,
    pub total: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderDetailsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetailsUpdated {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_method: Option<DeliveryMethod>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderPlaced(OrderPlaced),
    OrderStatusChanged(OrderStatusChanged),
    OrderDetailsUpdated(OrderDetailsUpdated),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "orders.order.placed",
            OrderEvent::OrderStatusChanged(_) => "orders.order.status_changed",
            OrderEvent::OrderDetailsUpdated(_) => "orders.order.details_updated",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(e) => e.occurred_at,
            OrderEvent::OrderStatusChanged(e) => e.occurred_at,
            OrderEvent::OrderDetailsUpdated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.cash_shift_id = Some(e.cash_shift_id);
                self.customer_id = e.customer_id;
                self.delivery_address = e.delivery_address.clone();
                self.status = OrderStatus::Pending;
                self.payment_status = e.payment_status;
                self.payment_method = e.payment_method;
                self.delivery_method = e.delivery_method;
                self.note = e.note.clone();
                self.lines = e.lines.clone();
                self.total = e.total;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            OrderEvent::OrderStatusChanged(e) => {
                self.status = e.to;
                if let Some(payment_status) = e.payment_status {
                    self.payment_status = payment_status;
                }
            }
            OrderEvent::OrderDetailsUpdated(e) => {
                if let Some(payment_status) = e.payment_status {
                    self.payment_status = payment_status;
                }
                if let Some(payment_method) = e.payment_method {
                    self.payment_method = payment_method;
                }
                if let Some(delivery_method) = e.delivery_method {
                    self.delivery_method = delivery_method;
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            OrderCommand::ChangeStatus(cmd) => self.handle_change_status(cmd),
            OrderCommand::UpdateDetails(cmd) => self.handle_update_details(cmd),
            OrderCommand::DeliverOnShiftClose(cmd) => self.handle_deliver_on_close(cmd),
        }
    }
}

/// Checks per-line subtotals and that `total` is their exact sum.
fn check_lines(lines: &[OrderLine], total: Money) -> Result<(), DomainError> {
    let mut sum = Money::ZERO;
    for line in lines {
        if line.quantity == 0 {
            return Err(DomainError::validation(format!(
                "line {}: quantity must be positive",
                line.line_no
            )));
        }
        if line.expected_subtotal() != Some(line.subtotal) {
            return Err(DomainError::invariant(format!(
                "line {}: subtotal {} does not equal {} x {}",
                line.line_no, line.subtotal, line.quantity, line.unit_price
            )));
        }
        sum = sum
            .checked_add(line.subtotal)
            .ok_or_else(|| DomainError::invariant("order total overflows"))?;
    }

    if sum != total {
        return Err(DomainError::invariant(format!(
            "order total {total} does not equal sum of lines {sum}"
        )));
    }
    Ok(())
}

impl Order {
    fn ensure_placed(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already placed"));
        }

        if cmd.lines.is_empty() {
            return Err(DomainError::validation("an order must contain at least one line"));
        }

        let total = Money::checked_sum(cmd.lines.iter().map(|l| l.subtotal))
            .ok_or_else(|| DomainError::invariant("order total overflows"))?;
        check_lines(&cmd.lines, total)?;

        let note = cmd
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned);

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            cash_shift_id: cmd.cash_shift_id,
            customer_id: cmd.customer_id,
            delivery_address: cmd.delivery_address.clone(),
            payment_status: cmd.payment_status,
            payment_method: cmd.payment_method,
            delivery_method: cmd.delivery_method,
            note,
            lines: cmd.lines.clone(),
            total,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(&self, cmd: &ChangeStatus) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed()?;
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_order_id(cmd.order_id)?;

        Ok(vec![OrderEvent::OrderStatusChanged(OrderStatusChanged {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            from: self.status,
            to: cmd.status,
            payment_status: cmd.payment_status,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_details(&self, cmd: &UpdateDetails) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed()?;
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_order_id(cmd.order_id)?;

        if cmd.payment_status.is_none() && cmd.payment_method.is_none() && cmd.delivery_method.is_none()
        {
            return Ok(vec![]);
        }

        Ok(vec![OrderEvent::OrderDetailsUpdated(OrderDetailsUpdated {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            payment_status: cmd.payment_status,
            payment_method: cmd.payment_method,
            delivery_method: cmd.delivery_method,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_deliver_on_close(
        &self,
        cmd: &DeliverOnShiftClose,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed()?;
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_order_id(cmd.order_id)?;

        if self.cash_shift_id != Some(cmd.cash_shift_id) {
            return Err(DomainError::invariant("order belongs to a different cash shift"));
        }

        Ok(vec![OrderEvent::OrderStatusChanged(OrderStatusChanged {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            from: self.status,
            to: OrderStatus::Delivered,
            payment_status: None,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{LineItem, OrderLineId};
    use pizzeria_catalog::{ComboId, ProductId};

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn test_order_id() -> OrderId {
        OrderId::new(AggregateId::new())
    }

    fn test_shift_id() -> CashShiftId {
        CashShiftId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn line(line_no: u32, item: LineItem, quantity: u32, cents: i64) -> OrderLine {
        let unit_price = Money::from_minor(cents);
        OrderLine {
            id: OrderLineId::generate(),
            line_no,
            item,
            quantity,
            unit_price,
            subtotal: unit_price.checked_times(quantity).unwrap(),
        }
    }

    fn place_cmd(tenant_id: TenantId, order_id: OrderId, shift_id: CashShiftId) -> PlaceOrder {
        PlaceOrder {
            tenant_id,
            order_id,
            cash_shift_id: shift_id,
            customer_id: None,
            delivery_address: Some(DeliveryAddress::Manual("Rivadavia 300".into())),
            payment_status: PaymentStatus::Pending,
            payment_method: PaymentMethod::Cash,
            delivery_method: DeliveryMethod::Delivery,
            note: Some("  sin cebolla ".into()),
            lines: vec![
                line(1, LineItem::Product(ProductId::generate()), 2, 5000),
                line(2, LineItem::Combo(ComboId::generate()), 1, 12000),
            ],
            occurred_at: test_time(),
        }
    }

    fn placed(tenant_id: TenantId, order_id: OrderId, shift_id: CashShiftId) -> Order {
        let mut order = Order::empty(order_id);
        order
            .execute(&OrderCommand::PlaceOrder(place_cmd(tenant_id, order_id, shift_id)))
            .unwrap();
        order
    }

    #[test]
    fn place_order_starts_pending_with_summed_total() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let shift_id = test_shift_id();
        let order = placed(tenant_id, order_id, shift_id);

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.total(), Money::from_minor(22000));
        assert_eq!(order.cash_shift_id(), Some(shift_id));
        assert_eq!(order.tenant_id(), Some(tenant_id));
        assert_eq!(order.lines().len(), 2);
        assert_eq!(order.note(), Some("sin cebolla"));
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn place_order_without_lines_is_rejected() {
        let order_id = test_order_id();
        let mut cmd = place_cmd(test_tenant_id(), order_id, test_shift_id());
        cmd.lines.clear();

        let err = Order::empty(order_id)
            .handle(&OrderCommand::PlaceOrder(cmd))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("at least one line") => {}
            _ => panic!("Expected Validation error for empty order"),
        }
    }

    #[test]
    fn tampered_subtotal_is_an_invariant_violation() {
        let order_id = test_order_id();
        let mut cmd = place_cmd(test_tenant_id(), order_id, test_shift_id());
        cmd.lines[0].subtotal = Money::from_minor(1);

        let err = Order::empty(order_id)
            .handle(&OrderCommand::PlaceOrder(cmd))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("subtotal") => {}
            _ => panic!("Expected InvariantViolation for wrong subtotal"),
        }
    }

    #[test]
    fn placing_twice_conflicts() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let shift_id = test_shift_id();
        let order = placed(tenant_id, order_id, shift_id);

        let err = order
            .handle(&OrderCommand::PlaceOrder(place_cmd(tenant_id, order_id, shift_id)))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn any_status_may_follow_any_other() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = placed(tenant_id, order_id, test_shift_id());

        for status in [
            OrderStatus::Cancelled,
            OrderStatus::Pending,
            OrderStatus::Delivered,
            OrderStatus::InProgress,
        ] {
            order
                .execute(&OrderCommand::ChangeStatus(ChangeStatus {
                    tenant_id,
                    order_id,
                    status,
                    payment_status: None,
                    occurred_at: test_time(),
                }))
                .unwrap();
            assert_eq!(order.status(), status);
        }
        assert_eq!(order.total(), Money::from_minor(22000));
    }

    #[test]
    fn change_status_optionally_sets_payment_status() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = placed(tenant_id, order_id, test_shift_id());

        order
            .execute(&OrderCommand::ChangeStatus(ChangeStatus {
                tenant_id,
                order_id,
                status: OrderStatus::Ready,
                payment_status: Some(PaymentStatus::Paid),
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Paid);

        order
            .execute(&OrderCommand::ChangeStatus(ChangeStatus {
                tenant_id,
                order_id,
                status: OrderStatus::Delivered,
                payment_status: None,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
    }

    #[test]
    fn update_details_touches_only_present_fields() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = placed(tenant_id, order_id, test_shift_id());

        order
            .execute(&OrderCommand::UpdateDetails(UpdateDetails {
                tenant_id,
                order_id,
                payment_status: None,
                payment_method: Some(PaymentMethod::Card),
                delivery_method: None,
                occurred_at: test_time(),
            }))
            .unwrap();

        assert_eq!(order.payment_method(), PaymentMethod::Card);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert_eq!(order.delivery_method(), DeliveryMethod::Delivery);
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn empty_detail_update_emits_nothing() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let order = placed(tenant_id, order_id, test_shift_id());

        let events = order
            .handle(&OrderCommand::UpdateDetails(UpdateDetails {
                tenant_id,
                order_id,
                payment_status: None,
                payment_method: None,
                delivery_method: None,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn deliver_on_close_overrides_cancelled() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let shift_id = test_shift_id();
        let mut order = placed(tenant_id, order_id, shift_id);

        order
            .execute(&OrderCommand::ChangeStatus(ChangeStatus {
                tenant_id,
                order_id,
                status: OrderStatus::Cancelled,
                payment_status: Some(PaymentStatus::Cancelled),
                occurred_at: test_time(),
            }))
            .unwrap();

        order
            .execute(&OrderCommand::DeliverOnShiftClose(DeliverOnShiftClose {
                tenant_id,
                order_id,
                cash_shift_id: shift_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.payment_status(), PaymentStatus::Cancelled);
    }

    #[test]
    fn deliver_on_close_rejects_order_of_another_shift() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let order = placed(tenant_id, order_id, test_shift_id());

        let err = order
            .handle(&OrderCommand::DeliverOnShiftClose(DeliverOnShiftClose {
                tenant_id,
                order_id,
                cash_shift_id: test_shift_id(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn mutations_from_another_tenant_are_rejected() {
        let order_id = test_order_id();
        let order = placed(test_tenant_id(), order_id, test_shift_id());

        let err = order
            .handle(&OrderCommand::ChangeStatus(ChangeStatus {
                tenant_id: test_tenant_id(),
                order_id,
                status: OrderStatus::Ready,
                payment_status: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::invariant("tenant mismatch"));
    }

    #[test]
    fn mutating_an_unplaced_order_is_not_found() {
        let order_id = test_order_id();
        let err = Order::empty(order_id)
            .handle(&OrderCommand::ChangeStatus(ChangeStatus {
                tenant_id: test_tenant_id(),
                order_id,
                status: OrderStatus::Ready,
                payment_status: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn record_round_trip_preserves_order() {
        let order = placed(test_tenant_id(), test_order_id(), test_shift_id());
        let restored = Order::from_record(order.to_record().unwrap()).unwrap();
        assert_eq!(restored, order);
    }

    #[test]
    fn record_with_wrong_total_is_rejected() {
        let mut record = placed(test_tenant_id(), test_order_id(), test_shift_id())
            .to_record()
            .unwrap();
        record.total = Money::from_minor(1);
        assert!(Order::from_record(record).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 64,
                ..ProptestConfig::default()
            })]

            #[test]
            fn placed_total_equals_sum_of_subtotals(
                lines in proptest::collection::vec((1u32..30, 0i64..100_000), 1..10)
            ) {
                let tenant_id = test_tenant_id();
                let order_id = test_order_id();
                let mut cmd = place_cmd(tenant_id, order_id, test_shift_id());
                cmd.lines = lines
                    .iter()
                    .zip(1u32..)
                    .map(|((quantity, cents), no)| line(no, LineItem::Product(ProductId::generate()), *quantity, *cents))
                    .collect();

                let mut order = Order::empty(order_id);
                order.execute(&OrderCommand::PlaceOrder(cmd)).unwrap();

                let expected: i64 = lines.iter().map(|(q, c)| i64::from(*q) * c).sum();
                prop_assert_eq!(order.total(), Money::from_minor(expected));
            }
        }
    }
}
