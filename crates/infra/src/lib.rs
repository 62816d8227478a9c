//! Infrastructure layer: persistence boundary, locking, and the services that
//! keep orders and stock consistent.
//!
//! Domain crates decide *what* a valid state change is; this crate decides
//! *when* it happens, under which locks, and inside which unit of work.

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod members;
pub mod shop;
pub mod store;

pub use catalog::CatalogService;
pub use config::{ConfigError, ShopConfig};
pub use coordinator::OrderCoordinator;
pub use error::ShopError;
pub use ledger::InventoryLedger;
pub use locks::{KeyedLocks, LockSet, LockStrategy};
pub use members::MemberService;
pub use shop::Shop;
pub use store::{ChangeSet, InMemoryShopStore, ShopStore, StoreError, UnitOfWork};
