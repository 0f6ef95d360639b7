//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// A value object has no identity; two instances holding the same attributes
/// are interchangeable. Order line items are value objects: replacing the
/// items of an order swaps whole values, it never edits one in place.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Quantity(u32);
///
/// impl ValueObject for Quantity {}
///
/// assert_eq!(Quantity(2), Quantity(2));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
