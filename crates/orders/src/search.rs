use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderStatus};

/// Filter for listing orders. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSearch {
    /// Substring of the buyer's name.
    pub member_name: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderSearch {
    pub fn by_status(status: OrderStatus) -> Self {
        Self {
            member_name: None,
            status: Some(status),
        }
    }

    pub fn by_member_name(name: impl Into<String>) -> Self {
        Self {
            member_name: Some(name.into()),
            status: None,
        }
    }

    /// `buyer_name` is the name of the order's member, resolved by the caller.
    pub fn matches(&self, order: &Order, buyer_name: &str) -> bool {
        if let Some(status) = self.status {
            if order.status() != status {
                return false;
            }
        }
        match self.member_name.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => buyer_name.contains(needle),
            _ => true,
        }
    }
}
