//! Orders domain module.
//!
//! This crate contains the order aggregate (lines, status lifecycle, delivery)
//! implemented purely as deterministic domain logic. Stock is not touched here;
//! the orchestration layer reserves and releases it around these transitions.

pub mod order;
pub mod search;

pub use order::{Delivery, DeliveryStatus, Order, OrderId, OrderLine, OrderStatus};
pub use search::OrderSearch;
