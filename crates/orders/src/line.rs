use serde::{Deserialize, Serialize};

use pizzeria_catalog::{ComboId, ProductId};
use pizzeria_core::{Entity, EntityId, Money, ValueObject, typed_id};

typed_id!(
    /// Order line identifier.
    OrderLineId(EntityId)
);

/// What an order line sells: exactly one product or exactly one combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LineItem {
    Product(ProductId),
    Combo(ComboId),
}

impl LineItem {
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            LineItem::Product(id) => Some(*id),
            LineItem::Combo(_) => None,
        }
    }

    pub fn combo_id(&self) -> Option<ComboId> {
        match self {
            LineItem::Combo(id) => Some(*id),
            LineItem::Product(_) => None,
        }
    }
}

impl core::fmt::Display for LineItem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LineItem::Product(id) => write!(f, "product {id}"),
            LineItem::Combo(id) => write!(f, "combo {id}"),
        }
    }
}

impl ValueObject for LineItem {}

/// A line as requested by the caller, before validation and pricing.
///
/// Mirrors the wire shape (two optional references and a signed quantity) so
/// that malformed input can be reported precisely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: Option<ProductId>,
    pub combo_id: Option<ComboId>,
    pub quantity: i64,
}

impl LineRequest {
    pub fn product(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id: Some(product_id),
            combo_id: None,
            quantity,
        }
    }

    pub fn combo(combo_id: ComboId, quantity: i64) -> Self {
        Self {
            product_id: None,
            combo_id: Some(combo_id),
            quantity,
        }
    }
}

/// A priced order line.
///
/// `unit_price` is a copy of the catalog price taken when the order was placed
/// and is never refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    /// 1-based position within the order.
    pub line_no: u32,
    pub item: LineItem,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl OrderLine {
    /// `unit_price × quantity`, or `None` on decimal overflow.
    pub fn expected_subtotal(&self) -> Option<Money> {
        self.unit_price.checked_times(self.quantity)
    }
}

impl Entity for OrderLine {
    type Id = OrderLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
