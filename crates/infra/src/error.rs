//! Errors surfaced to callers of the shop services.

use thiserror::Error;

use bookshop_core::DomainError;
use bookshop_inventory::ItemId;
use bookshop_members::MemberId;
use bookshop_orders::OrderId;

use crate::store::StoreError;

/// Failure of a shop operation. Every variant is terminal for the call that
/// raised it; nothing is retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShopError {
    /// Requested quantity exceeds the stock on hand.
    #[error("insufficient stock for item {item_id} (requested: {requested}, available: {available})")]
    InsufficientStock {
        item_id: ItemId,
        requested: u64,
        available: u64,
    },

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("order {0} is already cancelled")]
    AlreadyCancelled(OrderId),

    #[error("order {0} has already been delivered")]
    DeliveryCompleted(OrderId),

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("member {0} not found")]
    MemberNotFound(MemberId),

    #[error("a member named '{0}' already exists")]
    DuplicateMember(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Optimistic concurrency failure at commit time.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ShopError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => ShopError::Conflict(msg),
            other => ShopError::Store(other),
        }
    }
}

/// Context-free mapping. Prefer [`ShopError::for_item`] / [`ShopError::for_order`]
/// when the failing record is known.
impl From<DomainError> for ShopError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ShopError::Validation(msg),
            DomainError::InvariantViolation(msg) => ShopError::InvariantViolation(msg),
            DomainError::Conflict(msg) => ShopError::Conflict(msg),
            other @ (DomainError::InsufficientStock { .. } | DomainError::AlreadyCancelled) => {
                ShopError::InvariantViolation(other.to_string())
            }
        }
    }
}

impl ShopError {
    pub fn for_item(item_id: ItemId, err: DomainError) -> Self {
        match err {
            DomainError::InsufficientStock {
                requested,
                available,
            } => ShopError::InsufficientStock {
                item_id,
                requested,
                available,
            },
            other => other.into(),
        }
    }

    pub fn for_order(order_id: OrderId, err: DomainError) -> Self {
        match err {
            DomainError::AlreadyCancelled => ShopError::AlreadyCancelled(order_id),
            other => other.into(),
        }
    }

    /// Whether the caller may reasonably try again (e.g. after a restock or a
    /// lost optimistic race).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ShopError::InsufficientStock { .. } | ShopError::Conflict(_)
        )
    }
}
