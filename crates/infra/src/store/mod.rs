//! Persistence boundary.
//!
//! Services talk to storage only through [`ShopStore`]. Multi-step mutations are
//! staged in a [`UnitOfWork`] and handed to the store as one [`ChangeSet`],
//! which the store applies atomically or not at all.

pub mod in_memory;
pub mod r#trait;
pub mod unit_of_work;

pub use in_memory::InMemoryShopStore;
pub use r#trait::{Change, ChangeSet, ShopStore, StoreError};
pub use unit_of_work::UnitOfWork;
