use serde::{Deserialize, Serialize};

use bookshop_core::{DomainError, DomainResult, ValueObject};

/// Postal address of a member; also copied onto each order's delivery.
///
/// Immutable once built: there are no setters, only [`Address::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    city: String,
    street: String,
    zipcode: String,
}

impl Address {
    /// Build an address. All three fields are required and trimmed.
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> DomainResult<Self> {
        Ok(Self {
            city: required("city", city.into())?,
            street: required("street", street.into())?,
            zipcode: required("zipcode", zipcode.into())?,
        })
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn zipcode(&self) -> &str {
        &self.zipcode
    }
}

impl ValueObject for Address {}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {} ({})", self.city, self.street, self.zipcode)
    }
}

fn required(field: &str, value: String) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}
