//! Wiring of the shop services over one store.

use std::sync::Arc;

use crate::catalog::CatalogService;
use crate::config::ShopConfig;
use crate::coordinator::OrderCoordinator;
use crate::ledger::InventoryLedger;
use crate::members::MemberService;
use crate::store::ShopStore;

/// All services sharing one store and one item lock table.
pub struct Shop<S> {
    pub catalog: CatalogService<S>,
    pub members: MemberService<S>,
    pub ledger: InventoryLedger<S>,
    pub orders: OrderCoordinator<S>,
}

impl<S: ShopStore> Shop<S> {
    pub fn new(store: Arc<S>, config: &ShopConfig) -> Self {
        let ledger = InventoryLedger::new(Arc::clone(&store), config.lock_strategy);
        Self {
            catalog: CatalogService::new(ledger.clone()),
            members: MemberService::new(store),
            orders: OrderCoordinator::new(ledger.clone()),
            ledger,
        }
    }
}
