//! Status vocabularies of an order.
//!
//! Each enum serialises in SCREAMING_SNAKE_CASE and has a matching `as_str` /
//! `FromStr` pair used for storage columns.

use serde::{Deserialize, Serialize};

use pizzeria_core::DomainError;

macro_rules! vocabulary {
    ($t:ident { $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $t {
            pub const ALL: &'static [$t] = &[$($t::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($t::$variant => $text),+
                }
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text $(| $alias)* => Ok($t::$variant),)+
                    other => Err(DomainError::validation(format!(
                        "unknown {} {other:?}",
                        stringify!($t)
                    ))),
                }
            }
        }
    };
}

/// Kitchen/delivery progress of an order.
///
/// Any status may follow any other; only `Delivered` has a system-defined
/// meaning (the state every order of a shift ends in when the shift closes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    #[serde(alias = "PREPARING")]
    InProgress,
    Ready,
    Delivered,
    Cancelled,
}

vocabulary!(OrderStatus {
    Pending => "PENDING",
    InProgress => "IN_PROGRESS" | "PREPARING",
    Ready => "READY",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

vocabulary!(PaymentStatus {
    Pending => "PENDING",
    Paid => "PAID",
    Cancelled => "CANCELLED",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Transfer,
}

vocabulary!(PaymentMethod {
    Cash => "CASH",
    Card => "CARD",
    Transfer => "TRANSFER",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    #[default]
    Pickup,
    Delivery,
    DineIn,
}

vocabulary!(DeliveryMethod {
    Pickup => "PICKUP",
    Delivery => "DELIVERY",
    DineIn => "DINE_IN",
});
