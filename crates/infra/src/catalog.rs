//! Item registration and catalog maintenance.

use tracing::info;

use bookshop_core::ExpectedVersion;
use bookshop_inventory::{Item, ItemId, ItemKind};

use crate::error::ShopError;
use crate::ledger::InventoryLedger;
use crate::store::{ShopStore, UnitOfWork};

pub struct CatalogService<S> {
    ledger: InventoryLedger<S>,
}

impl<S: ShopStore> CatalogService<S> {
    /// Shares the ledger's lock table so catalog edits never race a reservation.
    pub fn new(ledger: InventoryLedger<S>) -> Self {
        Self { ledger }
    }

    pub fn register_item(
        &self,
        name: impl Into<String>,
        price: u64,
        stock_quantity: u64,
        kind: ItemKind,
    ) -> Result<ItemId, ShopError> {
        let item = Item::new(ItemId::generate(), name, price, stock_quantity, kind)?;
        let item_id = item.id_typed();
        self.ledger.store().save_item(item, ExpectedVersion::New)?;
        info!(%item_id, stock_quantity, "item registered");
        Ok(item_id)
    }

    /// Change an item's name and price. Stock is only ever changed through
    /// the ledger.
    pub fn update_item(
        &self,
        item_id: ItemId,
        name: impl Into<String>,
        price: u64,
    ) -> Result<(), ShopError> {
        let _held = self.ledger.locks().lock(item_id);
        let mut uow = UnitOfWork::begin(self.ledger.store().as_ref());
        let mut item = uow
            .load_item(item_id)?
            .ok_or(ShopError::ItemNotFound(item_id))?;
        item.update_details(name, price)
            .map_err(|e| ShopError::for_item(item_id, e))?;
        uow.stage_item(item);
        uow.commit()?;
        Ok(())
    }

    pub fn find_item(&self, item_id: ItemId) -> Result<Item, ShopError> {
        self.ledger
            .store()
            .load_item(item_id)?
            .ok_or(ShopError::ItemNotFound(item_id))
    }

    /// All items, sorted by name.
    pub fn list_items(&self) -> Result<Vec<Item>, ShopError> {
        let mut items = self.ledger.store().list_items()?;
        items.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id_typed().cmp(&b.id_typed())));
        Ok(items)
    }
}
