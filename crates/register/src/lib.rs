//! Cash register shifts.
//!
//! A shift is the bounded work period during which a tenant takes orders. It is
//! created open with a float (`start_amount`) and closed exactly once with the
//! counted cash (`end_amount`). The at-most-one-open-shift rule spans shifts and
//! is therefore enforced by the store, not by this aggregate.

pub mod shift;

pub use shift::{
    CashShift, CashShiftCommand, CashShiftEvent, CashShiftId, CashShiftRecord, CloseShift,
    OpenShift, ShiftClosed, ShiftOpened, ShiftStatus,
};
