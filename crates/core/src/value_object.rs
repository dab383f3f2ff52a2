//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. A SKU,
/// a price or a stock quantity is a value object; a product is an entity.
///
/// Constructors of value objects are the validation boundary: once a value
/// object exists it is known to be well-formed.
///
/// ```ignore
/// let a = Sku::parse("W-100")?;
/// let b = Sku::parse("  W-100 ")?;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
