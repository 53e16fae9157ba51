//! Storage layer for streamstate
//!
//! This crate implements the in-memory side of the store contract:
//! - MemoryStore: DashMap-sharded staged/committed store
//! - DurabilityMode: when committed values reach disk (used by file stores)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod durability;
pub mod sharded;

pub use durability::DurabilityMode;
pub use sharded::{MemoryStore, Slot};
