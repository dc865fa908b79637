use chrono::{DateTime, Utc};

/// A fact emitted by an aggregate's `handle` and folded in by `apply`.
pub trait DomainEvent: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "register.shift.opened"), used as a log field.
    fn event_type(&self) -> &'static str;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
