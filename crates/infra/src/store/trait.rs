use std::sync::Arc;

use thiserror::Error;

use bookshop_core::ExpectedVersion;
use bookshop_inventory::{Item, ItemId};
use bookshop_members::{Member, MemberId};
use bookshop_orders::{Order, OrderId};

/// Store operation error.
///
/// These are **infrastructure errors** (storage, concurrency) as opposed to
/// domain errors (validation, invariants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A staged write expected a version that is no longer current.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// The backend could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A single staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Item {
        item: Item,
        expected: ExpectedVersion,
    },
    Order {
        order: Order,
        expected: ExpectedVersion,
    },
    /// Members are inserted once and never versioned.
    Member { member: Member },
}

/// Writes that must be applied together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_item(&mut self, item: Item, expected: ExpectedVersion) {
        self.changes.push(Change::Item { item, expected });
    }

    pub fn put_order(&mut self, order: Order, expected: ExpectedVersion) {
        self.changes.push(Change::Order { order, expected });
    }

    pub fn put_member(&mut self, member: Member) {
        self.changes.push(Change::Member { member });
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// Narrow persistence collaborator for the shop core.
///
/// Reads are point-in-time snapshots. Writes go through [`ShopStore::commit`],
/// which must:
/// - check every `ExpectedVersion` before writing anything
/// - apply the whole `ChangeSet` or none of it
///
/// The `save_*` helpers are single-record commits.
pub trait ShopStore: Send + Sync {
    fn load_item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    fn list_items(&self) -> Result<Vec<Item>, StoreError>;

    fn load_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    fn load_member(&self, id: MemberId) -> Result<Option<Member>, StoreError>;

    fn list_members(&self) -> Result<Vec<Member>, StoreError>;

    /// Atomically apply a batch of writes.
    fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;

    fn save_item(&self, item: Item, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut changes = ChangeSet::new();
        changes.put_item(item, expected);
        self.commit(changes)
    }

    fn save_order(&self, order: Order, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut changes = ChangeSet::new();
        changes.put_order(order, expected);
        self.commit(changes)
    }

    fn save_member(&self, member: Member) -> Result<(), StoreError> {
        let mut changes = ChangeSet::new();
        changes.put_member(member);
        self.commit(changes)
    }
}

impl<S> ShopStore for Arc<S>
where
    S: ShopStore + ?Sized,
{
    fn load_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).load_item(id)
    }

    fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        (**self).list_items()
    }

    fn load_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).load_order(id)
    }

    fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        (**self).list_orders()
    }

    fn load_member(&self, id: MemberId) -> Result<Option<Member>, StoreError> {
        (**self).load_member(id)
    }

    fn list_members(&self) -> Result<Vec<Member>, StoreError> {
        (**self).list_members()
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        (**self).commit(changes)
    }
}
