//! Sales figures of one cash shift, as shown when closing the register.

use serde::{Deserialize, Serialize};

use pizzeria_core::{DomainError, DomainResult, Money};
use pizzeria_register::{CashShift, CashShiftId, ShiftStatus};

use crate::order::Order;
use crate::status::{OrderStatus, PaymentMethod, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTotal {
    pub payment_method: PaymentMethod,
    pub order_count: usize,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSummary {
    pub cash_shift_id: CashShiftId,
    pub status: ShiftStatus,
    pub order_count: usize,
    pub cancelled_count: usize,
    /// Non-cancelled orders whose payment is not `PAID`.
    pub unpaid_count: usize,
    /// Sum of totals of non-cancelled orders.
    pub gross_sales: Money,
    /// One entry per payment method, in vocabulary order, zeros included.
    pub by_payment_method: Vec<MethodTotal>,
    pub start_amount: Money,
    pub cash_sales: Money,
    /// `start_amount + cash_sales`: what the drawer should hold.
    pub expected_cash: Money,
    pub end_amount: Option<Money>,
    /// `end_amount - expected_cash`, once the shift is closed.
    pub difference: Option<Money>,
}

impl ShiftSummary {
    /// Summarise `orders` for `shift`. Orders attached to other shifts are
    /// ignored; cancelled orders are counted but excluded from every total.
    ///
    /// Fails with an invariant violation if any total leaves the decimal range.
    pub fn compute(shift: &CashShift, orders: &[Order]) -> DomainResult<Self> {
        let shift_id = shift.id_typed();
        let own: Vec<&Order> = orders
            .iter()
            .filter(|o| o.cash_shift_id() == Some(shift_id))
            .collect();
        let billable = || own.iter().filter(|o| o.status() != OrderStatus::Cancelled);

        let by_payment_method = PaymentMethod::ALL
            .iter()
            .map(|method| -> DomainResult<MethodTotal> {
                let matching: Vec<&&Order> =
                    billable().filter(|o| o.payment_method() == *method).collect();
                Ok(MethodTotal {
                    payment_method: *method,
                    order_count: matching.len(),
                    total: Money::checked_sum(matching.iter().map(|o| o.total()))
                        .ok_or_else(|| overflow(method.as_str()))?,
                })
            })
            .collect::<DomainResult<Vec<MethodTotal>>>()?;

        let cash_sales = by_payment_method
            .iter()
            .find(|m| m.payment_method == PaymentMethod::Cash)
            .map(|m| m.total)
            .unwrap_or(Money::ZERO);
        let expected_cash = shift
            .start_amount()
            .checked_add(cash_sales)
            .ok_or_else(|| overflow("expected cash"))?;
        let gross_sales = Money::checked_sum(billable().map(|o| o.total()))
            .ok_or_else(|| overflow("gross sales"))?;
        let end_amount = shift.end_amount();

        Ok(Self {
            cash_shift_id: shift_id,
            status: shift.status(),
            order_count: own.len(),
            cancelled_count: own.len() - billable().count(),
            unpaid_count: billable()
                .filter(|o| o.payment_status() != PaymentStatus::Paid)
                .count(),
            gross_sales,
            by_payment_method,
            start_amount: shift.start_amount(),
            cash_sales,
            expected_cash,
            end_amount,
            difference: end_amount.and_then(|end| end.checked_sub(expected_cash)),
        })
    }
}

fn overflow(what: &str) -> DomainError {
    DomainError::invariant(format!("{what} total is out of range"))
}
