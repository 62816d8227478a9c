use std::collections::BTreeMap;

use bookshop_core::{AggregateRoot, ExpectedVersion};
use bookshop_inventory::{Item, ItemId};
use bookshop_members::{Member, MemberId};
use bookshop_orders::{Order, OrderId};

use super::r#trait::{ChangeSet, ShopStore, StoreError};

#[derive(Debug)]
struct Staged<T> {
    value: T,
    expected: ExpectedVersion,
    dirty: bool,
}

/// Scoped transaction over a [`ShopStore`].
///
/// Reads go through an identity map so repeated loads see earlier staged
/// writes. Nothing reaches the store until [`UnitOfWork::commit`]; dropping the
/// unit of work (or calling [`UnitOfWork::rollback`]) discards every staged
/// change.
///
/// Each record remembers the version it was loaded at, so the commit fails
/// with [`StoreError::Conflict`] if someone else wrote it in between.
pub struct UnitOfWork<'s, S: ShopStore + ?Sized> {
    store: &'s S,
    items: BTreeMap<ItemId, Staged<Item>>,
    orders: BTreeMap<OrderId, Staged<Order>>,
    finished: bool,
}

impl<'s, S: ShopStore + ?Sized> UnitOfWork<'s, S> {
    pub fn begin(store: &'s S) -> Self {
        Self {
            store,
            items: BTreeMap::new(),
            orders: BTreeMap::new(),
            finished: false,
        }
    }

    pub fn load_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        if let Some(staged) = self.items.get(&id) {
            return Ok(Some(staged.value.clone()));
        }
        let Some(item) = self.store.load_item(id)? else {
            return Ok(None);
        };
        self.items.insert(
            id,
            Staged {
                expected: ExpectedVersion::Exact(item.version()),
                value: item.clone(),
                dirty: false,
            },
        );
        Ok(Some(item))
    }

    pub fn load_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        if let Some(staged) = self.orders.get(&id) {
            return Ok(Some(staged.value.clone()));
        }
        let Some(order) = self.store.load_order(id)? else {
            return Ok(None);
        };
        self.orders.insert(
            id,
            Staged {
                expected: ExpectedVersion::Exact(order.version()),
                value: order.clone(),
                dirty: false,
            },
        );
        Ok(Some(order))
    }

    /// Members are read-only inside a unit of work.
    pub fn load_member(&self, id: MemberId) -> Result<Option<Member>, StoreError> {
        self.store.load_member(id)
    }

    /// Stage a write. Items never loaded through this unit of work are
    /// treated as inserts.
    pub fn stage_item(&mut self, item: Item) {
        let id = item.id_typed();
        match self.items.get_mut(&id) {
            Some(staged) => {
                staged.value = item;
                staged.dirty = true;
            }
            None => {
                self.items.insert(
                    id,
                    Staged {
                        value: item,
                        expected: ExpectedVersion::New,
                        dirty: true,
                    },
                );
            }
        }
    }

    /// Stage a write. Orders never loaded through this unit of work are
    /// treated as inserts.
    pub fn stage_order(&mut self, order: Order) {
        let id = order.id_typed();
        match self.orders.get_mut(&id) {
            Some(staged) => {
                staged.value = order;
                staged.dirty = true;
            }
            None => {
                self.orders.insert(
                    id,
                    Staged {
                        value: order,
                        expected: ExpectedVersion::New,
                        dirty: true,
                    },
                );
            }
        }
    }

    /// Number of records with pending writes.
    pub fn pending(&self) -> usize {
        self.items.values().filter(|s| s.dirty).count()
            + self.orders.values().filter(|s| s.dirty).count()
    }

    /// Hand every staged write to the store as one atomic batch.
    pub fn commit(mut self) -> Result<(), StoreError> {
        self.finished = true;

        let mut changes = ChangeSet::new();
        for staged in std::mem::take(&mut self.items).into_values() {
            if staged.dirty {
                changes.put_item(staged.value, staged.expected);
            }
        }
        for staged in std::mem::take(&mut self.orders).into_values() {
            if staged.dirty {
                changes.put_order(staged.value, staged.expected);
            }
        }

        tracing::debug!(changes = changes.len(), "committing unit of work");
        self.store.commit(changes)
    }

    /// Discard every staged write.
    pub fn rollback(mut self) {
        tracing::debug!(discarded = self.pending(), "rolling back unit of work");
        self.finished = true;
    }
}

impl<S: ShopStore + ?Sized> Drop for UnitOfWork<'_, S> {
    fn drop(&mut self) {
        if !self.finished && self.pending() > 0 {
            tracing::debug!(
                discarded = self.pending(),
                "unit of work dropped without commit"
            );
        }
    }
}
