//! Orders domain module.
//!
//! - [`order`]: the `Order` aggregate (placement, status and detail changes).
//! - [`line`]: order lines and the product-or-combo [`LineItem`] union.
//! - [`pricing`]: turns line requests into priced lines, freezing unit prices.
//! - [`summary`]: per-shift sales figures for closing the register.
//!
//! Deterministic domain logic only; the single IO seam is the
//! `CatalogLookup` port consumed by the pricing engine.

pub mod line;
pub mod order;
pub mod pricing;
pub mod status;
pub mod summary;

pub use line::{LineItem, LineRequest, OrderLine, OrderLineId};
pub use order::{
    ChangeStatus, DeliverOnShiftClose, DeliveryAddress, Order, OrderCommand, OrderDetailsUpdated,
    OrderEvent, OrderId, OrderPlaced, OrderRecord, OrderStatusChanged, PlaceOrder, UpdateDetails,
};
pub use pricing::{PricedLines, PricingError, price_lines};
pub use status::{DeliveryMethod, OrderStatus, PaymentMethod, PaymentStatus};
pub use summary::{MethodTotal, ShiftSummary};
