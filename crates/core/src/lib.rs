//! `pizzeria-core`: shared domain building blocks for the point-of-sale core.
//!
//! Pure domain primitives only: identifiers, money, error types and the
//! aggregate/entity/value-object vocabulary. No IO lives here.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod event;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, StoreError};
pub use event::DomainEvent;
pub use id::{AggregateId, EntityId, TenantId};
pub use money::Money;
pub use value_object::ValueObject;
