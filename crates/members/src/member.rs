use serde::{Deserialize, Serialize};

use bookshop_core::{AggregateId, DomainError, DomainResult, Entity};

use crate::address::Address;

/// Member identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub AggregateId);

impl MemberId {
    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for MemberId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A registered member of the shop. Members are the buyers of orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    id: MemberId,
    name: String,
    address: Address,
}

impl Member {
    pub fn new(id: MemberId, name: impl Into<String>, address: Address) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self {
            id,
            name: name.trim().to_string(),
            address,
        })
    }

    pub fn id_typed(&self) -> MemberId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl Entity for Member {
    type Id = MemberId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_address() -> Address {
        Address::new("Seoul", "Hangang-ro", "12345").unwrap()
    }

    #[test]
    fn new_member_keeps_identity_and_address() {
        let id = MemberId::generate();
        let member = Member::new(id, "Hong Gildong", test_address()).unwrap();
        assert_eq!(*member.id(), id);
        assert_eq!(member.name(), "Hong Gildong");
        assert_eq!(member.address().city(), "Seoul");
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = Member::new(MemberId::generate(), "  ", test_address()).unwrap_err();
        assert_eq!(err, DomainError::validation("name cannot be empty"));
    }
}
