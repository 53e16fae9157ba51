//! # streamstate
//!
//! Durable scalar state for stream-processing pipelines.
//!
//! A [`ScalarStateCell`] holds one value per `(stream, name)`. Reads and
//! writes are served from memory; [`ScalarStateCell::flush`] makes the value
//! durable at a checkpoint, and [`ScalarStateCell::reset`] throws away
//! whatever was written since the last one.
//!
//! ## Quick Start
//!
//! ```ignore
//! use streamstate::prelude::*;
//!
//! let state = StreamState::open("./state/orders.log")?;
//!
//! let mut total = state.scalar_or_default::<i64>("orders", "total");
//! total.on_flushed(|| println!("checkpoint done"));
//!
//! total.update(|t| t + 25)?;
//! total.flush()?;
//! ```
//!
//! ## Value-like vs reference-like
//!
//! Cells hand out clones. For plain data a clone is a copy, so the cell's
//! content only changes through `set_value`. [`Shared`] values are aliases:
//! mutate one and the cached value changes too. Cells of such types
//! re-encode the cached value right before every commit, so the flush
//! persists what the caller sees. See [`StateValue`].
//!
//! ## Crates
//!
//! - `streamstate-core`: keys, encodings, store contract, errors
//! - `streamstate-storage`: in-memory store, durability modes
//! - `streamstate-durability`: file store, commit log, recovery
//! - `streamstate-primitives`: the cell itself

#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod types;

pub mod prelude;

// Re-export main entry points
pub use config::StreamStateConfig;
pub use database::{StreamState, StreamStateBuilder};
pub use error::{Error, Result};

// Re-export types
pub use types::*;
