//! Error taxonomy of the order/cash-shift core.
//!
//! Every variant except `Store` is a deterministic precondition failure scoped
//! to one operation; none of them is retried internally.

use thiserror::Error;

use pizzeria_core::{DomainError, StoreError};
use pizzeria_customers::{AddressId, CustomerId};
use pizzeria_orders::{OrderId, PricingError};
use pizzeria_register::CashShiftId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PosError {
    /// A line references both a product and a combo, or neither.
    #[error("invalid line composition: {0}")]
    InvalidLineComposition(String),

    /// A referenced product or combo is absent for this tenant.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("customer {0} not found")]
    CustomerNotFound(CustomerId),

    /// The address is not one of the order customer's addresses.
    #[error("address {0} not found for this customer")]
    AddressNotFound(AddressId),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("cash shift {0} not found")]
    ShiftNotFound(CashShiftId),

    #[error("no open register: open a cash shift before taking orders")]
    NoOpenShift,

    #[error("a cash shift is already open for this business")]
    ShiftAlreadyOpen,

    /// Non-positive start amount or negative end amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("an order must contain at least one line")]
    EmptyOrder,

    #[error("validation failed: {0}")]
    Validation(String),

    /// An aggregate rejected a command the manager believed valid.
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PosError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PosError::InvalidLineComposition(_) => "invalid_line_composition",
            PosError::ItemNotFound(_) => "item_not_found",
            PosError::CustomerNotFound(_) => "customer_not_found",
            PosError::AddressNotFound(_) => "address_not_found",
            PosError::OrderNotFound(_) => "order_not_found",
            PosError::ShiftNotFound(_) => "shift_not_found",
            PosError::NoOpenShift => "no_open_shift",
            PosError::ShiftAlreadyOpen => "shift_already_open",
            PosError::InvalidAmount(_) => "invalid_amount",
            PosError::InvalidQuantity(_) => "invalid_quantity",
            PosError::EmptyOrder => "empty_order",
            PosError::Validation(_) => "validation_error",
            PosError::Invariant(_) => "invariant_violation",
            PosError::Store(_) => "store_error",
        }
    }
}

impl From<DomainError> for PosError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => PosError::Validation(msg),
            DomainError::InvariantViolation(msg) | DomainError::Conflict(msg) => {
                PosError::Invariant(msg)
            }
            DomainError::NotFound => PosError::Invariant("aggregate not initialised".to_string()),
        }
    }
}

impl From<PricingError> for PosError {
    fn from(value: PricingError) -> Self {
        match value {
            PricingError::EmptyOrder => PosError::EmptyOrder,
            e @ PricingError::InvalidLineComposition { .. } => {
                PosError::InvalidLineComposition(e.to_string())
            }
            e @ (PricingError::InvalidQuantity { .. } | PricingError::AmountOverflow { .. }) => {
                PosError::InvalidQuantity(e.to_string())
            }
            e @ PricingError::ItemNotFound { .. } => PosError::ItemNotFound(e.to_string()),
            PricingError::Lookup(e) => PosError::Store(e),
        }
    }
}

/// Shift commands only validate amounts, so their validation failures are
/// reported as `InvalidAmount`.
pub(crate) fn shift_command_error(err: DomainError) -> PosError {
    match err {
        DomainError::Validation(msg) => PosError::InvalidAmount(msg),
        other => other.into(),
    }
}
