//! Inventory domain module.
//!
//! This crate contains the stock rules for sellable items, implemented purely
//! as deterministic domain logic (no IO, no locking, no storage). Callers are
//! responsible for serializing concurrent access to a given item.

pub mod item;

pub use item::{Item, ItemId, ItemKind};
