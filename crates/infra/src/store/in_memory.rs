use std::collections::HashMap;
use std::sync::RwLock;

use bookshop_core::{AggregateRoot, ExpectedVersion};
use bookshop_inventory::{Item, ItemId};
use bookshop_members::{Member, MemberId};
use bookshop_orders::{Order, OrderId};

use super::r#trait::{Change, ChangeSet, ShopStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    items: HashMap<ItemId, Item>,
    orders: HashMap<OrderId, Order>,
    members: HashMap<MemberId, Member>,
}

/// In-memory shop store.
///
/// Intended for tests/dev. A single write lock makes every commit atomic.
#[derive(Debug, Default)]
pub struct InMemoryShopStore {
    tables: RwLock<Tables>,
}

impl InMemoryShopStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

fn check(
    kind: &str,
    id: &dyn core::fmt::Display,
    expected: ExpectedVersion,
    stored: Option<u64>,
) -> Result<(), StoreError> {
    if expected.matches(stored) {
        return Ok(());
    }
    Err(StoreError::Conflict(format!(
        "{kind} {id}: expected {expected:?}, found {stored:?}"
    )))
}

impl ShopStore for InMemoryShopStore {
    fn load_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.read()?.items.values().cloned().collect())
    }

    fn load_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.read()?.orders.values().cloned().collect())
    }

    fn load_member(&self, id: MemberId) -> Result<Option<Member>, StoreError> {
        Ok(self.read()?.members.get(&id).cloned())
    }

    fn list_members(&self) -> Result<Vec<Member>, StoreError> {
        Ok(self.read()?.members.values().cloned().collect())
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        // Validate the whole batch before touching any table.
        for change in changes.iter() {
            match change {
                Change::Item { item, expected } => {
                    let stored = tables.items.get(item.id()).map(|i| i.version());
                    check("item", item.id(), *expected, stored)?;
                }
                Change::Order { order, expected } => {
                    let stored = tables.orders.get(order.id()).map(|o| o.version());
                    check("order", order.id(), *expected, stored)?;
                }
                Change::Member { member } => {
                    let id = member.id_typed();
                    if tables.members.contains_key(&id) {
                        return Err(StoreError::Conflict(format!("member {id} already exists")));
                    }
                }
            }
        }

        for change in changes {
            match change {
                Change::Item { item, .. } => {
                    tables.items.insert(item.id_typed(), item);
                }
                Change::Order { order, .. } => {
                    tables.orders.insert(order.id_typed(), order);
                }
                Change::Member { member } => {
                    tables.members.insert(member.id_typed(), member);
                }
            }
        }

        Ok(())
    }
}
