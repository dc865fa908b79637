//! Value object trait: equality by value, not identity.

/// Marker trait for immutable values compared by their attributes.
///
/// Money amounts and the product-or-combo reference of an order line are value
/// objects: two lines pointing at the same combo carry equal `LineItem`s even
/// though the lines themselves are distinct entities.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
