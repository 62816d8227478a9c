//! Members domain module (the buyers of the shop).
//!
//! This crate contains the member entity and its address value object,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod address;
pub mod member;

pub use address::Address;
pub use member::{Member, MemberId};
