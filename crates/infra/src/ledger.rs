//! Stock reservations.

use std::sync::Arc;

use tracing::{debug, warn};

use bookshop_inventory::{Item, ItemId};

use crate::error::ShopError;
use crate::locks::{KeyedLocks, LockStrategy};
use crate::store::{ShopStore, UnitOfWork};

/// Owns every change to an item's stock count.
///
/// `reserve` and `release` on the same item are serialized through a per-item
/// lock (or a single global lock, depending on [`LockStrategy`]); operations
/// on different items run in parallel. The stock floor itself is enforced by
/// [`Item::reserve`].
///
/// Cloning is cheap and shares the lock table.
pub struct InventoryLedger<S> {
    store: Arc<S>,
    locks: Arc<KeyedLocks<ItemId>>,
}

impl<S> Clone for InventoryLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<S: ShopStore> InventoryLedger<S> {
    pub fn new(store: Arc<S>, strategy: LockStrategy) -> Self {
        Self {
            store,
            locks: Arc::new(KeyedLocks::new(strategy)),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Item lock table. Callers that stage stock changes themselves must hold
    /// the affected items' locks until their unit of work has committed.
    pub fn locks(&self) -> &KeyedLocks<ItemId> {
        &self.locks
    }

    /// Take `quantity` units of `item_id` out of stock.
    pub fn reserve(&self, item_id: ItemId, quantity: u64) -> Result<(), ShopError> {
        let _held = self.locks.lock(item_id);
        let mut uow = UnitOfWork::begin(self.store.as_ref());
        self.reserve_in(&mut uow, item_id, quantity)?;
        uow.commit()?;
        Ok(())
    }

    /// Put `quantity` units of `item_id` back into stock.
    pub fn release(&self, item_id: ItemId, quantity: u64) -> Result<(), ShopError> {
        let _held = self.locks.lock(item_id);
        let mut uow = UnitOfWork::begin(self.store.as_ref());
        self.release_in(&mut uow, item_id, quantity)?;
        uow.commit()?;
        Ok(())
    }

    /// Current stock on hand.
    pub fn available(&self, item_id: ItemId) -> Result<u64, ShopError> {
        self.store
            .load_item(item_id)?
            .map(|item| item.stock_quantity())
            .ok_or(ShopError::ItemNotFound(item_id))
    }

    /// Stage a reservation inside an open unit of work and return the item
    /// as it looks afterwards. The caller must hold `item_id`'s lock.
    pub fn reserve_in<T>(
        &self,
        uow: &mut UnitOfWork<'_, T>,
        item_id: ItemId,
        quantity: u64,
    ) -> Result<Item, ShopError>
    where
        T: ShopStore + ?Sized,
    {
        let mut item = uow
            .load_item(item_id)?
            .ok_or(ShopError::ItemNotFound(item_id))?;

        if let Err(err) = item.reserve(quantity) {
            let err = ShopError::for_item(item_id, err);
            if let ShopError::InsufficientStock { available, .. } = &err {
                warn!(%item_id, requested = quantity, available, "insufficient stock");
            }
            return Err(err);
        }

        debug!(%item_id, quantity, remaining = item.stock_quantity(), "stock reserved");
        uow.stage_item(item.clone());
        Ok(item)
    }

    /// Stage a release inside an open unit of work. The caller must hold
    /// `item_id`'s lock.
    pub fn release_in<T>(
        &self,
        uow: &mut UnitOfWork<'_, T>,
        item_id: ItemId,
        quantity: u64,
    ) -> Result<Item, ShopError>
    where
        T: ShopStore + ?Sized,
    {
        let mut item = uow
            .load_item(item_id)?
            .ok_or(ShopError::ItemNotFound(item_id))?;
        item.release(quantity)
            .map_err(|e| ShopError::for_item(item_id, e))?;

        debug!(%item_id, quantity, remaining = item.stock_quantity(), "stock released");
        uow.stage_item(item.clone());
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryShopStore;
    use bookshop_core::ExpectedVersion;
    use bookshop_inventory::ItemKind;

    fn ledger_with(stock: u64) -> (InventoryLedger<InMemoryShopStore>, ItemId) {
        let store = Arc::new(InMemoryShopStore::new());
        let item = Item::new(
            ItemId::generate(),
            "JPA Book",
            10_000,
            stock,
            ItemKind::Movie {
                director: "Bong".to_string(),
                actor: "Song".to_string(),
            },
        )
        .unwrap();
        let id = item.id_typed();
        store.save_item(item, ExpectedVersion::New).unwrap();
        (InventoryLedger::new(store, LockStrategy::PerKey), id)
    }

    #[test]
    fn reserve_and_release_move_stock() {
        let (ledger, id) = ledger_with(10);
        ledger.reserve(id, 4).unwrap();
        assert_eq!(ledger.available(id).unwrap(), 6);
        ledger.release(id, 1).unwrap();
        assert_eq!(ledger.available(id).unwrap(), 7);
    }

    #[test]
    fn reserve_beyond_stock_fails_and_keeps_stock() {
        let (ledger, id) = ledger_with(10);
        let err = ledger.reserve(id, 11).unwrap_err();
        assert_eq!(
            err,
            ShopError::InsufficientStock {
                item_id: id,
                requested: 11,
                available: 10
            }
        );
        assert_eq!(ledger.available(id).unwrap(), 10);
    }

    #[test]
    fn unknown_item_is_reported() {
        let (ledger, _) = ledger_with(1);
        let missing = ItemId::generate();
        assert_eq!(ledger.reserve(missing, 1), Err(ShopError::ItemNotFound(missing)));
        assert_eq!(ledger.available(missing), Err(ShopError::ItemNotFound(missing)));
    }

    #[test]
    fn zero_quantity_is_a_validation_error() {
        let (ledger, id) = ledger_with(1);
        assert!(matches!(ledger.reserve(id, 0), Err(ShopError::Validation(_))));
        assert!(matches!(ledger.release(id, 0), Err(ShopError::Validation(_))));
    }
}
