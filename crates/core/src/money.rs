//! Exact monetary amounts.

use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// A monetary amount in the tenant's currency, backed by an exact decimal.
///
/// Serialises as a decimal string (`"220.00"`) so no float ever sits between
/// the register and the store.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build from an integer number of minor units (cents).
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, 2))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// `self × quantity`, or `None` on overflow.
    pub fn checked_times(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money)
    }

    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Sum of `amounts`, or `None` if any partial sum overflows.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money)
            .map_err(|e| DomainError::validation(format!("invalid amount {s:?}: {e}")))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl ValueObject for Money {}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn decimal_arithmetic_has_no_float_drift() {
        let total: Money = [money("0.10"), money("0.20")].iter().sum();
        assert_eq!(total, money("0.30"));
    }

    #[test]
    fn times_multiplies_by_quantity() {
        assert_eq!(money("50.00").checked_times(2), Some(money("100.00")));
        assert_eq!(money("12.35").checked_times(0), Some(Money::ZERO));
    }

    #[test]
    fn equality_ignores_trailing_zero_scale() {
        assert_eq!(money("220"), money("220.00"));
    }

    #[test]
    fn display_uses_two_decimal_places() {
        assert_eq!(money("7.5").to_string(), "7.50");
        assert_eq!(Money::from_minor(22000).to_string(), "220.00");
    }

    #[test]
    fn sign_predicates() {
        assert!(money("0.01").is_positive());
        assert!(!Money::ZERO.is_positive());
        assert!(!Money::ZERO.is_negative());
        assert!(money("-0.01").is_negative());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!("12,50".parse::<Money>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&money("120.00")).unwrap();
        assert_eq!(json, "\"120.00\"");
        let back: Money = serde_json::from_str("\"120.00\"").unwrap();
        assert_eq!(back, money("120"));
    }

    #[test]
    fn checked_sum_reports_overflow() {
        assert_eq!(Money::checked_sum([money("1.50"), money("2.25")]), Some(money("3.75")));
        assert_eq!(Money::checked_sum(Vec::<Money>::new()), Some(Money::ZERO));
        let max = Money::new(Decimal::MAX);
        assert_eq!(Money::checked_sum([max, money("1")]), None);
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
            fn sum_is_independent_of_order(cents in proptest::collection::vec(0i64..1_000_000, 0..20)) {
                let forward: Money = cents.iter().map(|c| Money::from_minor(*c)).sum();
                let backward: Money = cents.iter().rev().map(|c| Money::from_minor(*c)).sum();
                prop_assert_eq!(forward, backward);
                prop_assert_eq!(forward, Money::from_minor(cents.iter().sum()));
            }
        }
    }
}
