//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and never change once built. To "modify" one,
/// construct a new value. Constructors validate required fields up front, so a
/// value object that exists is always well-formed.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Zipcode(String);
///
/// impl ValueObject for Zipcode {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
