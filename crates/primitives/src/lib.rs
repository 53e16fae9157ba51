//! State primitives for streamstate
//!
//! - [`ScalarStateCell`]: one durable value per `(stream, name)`, cached in
//!   memory and committed on flush
//!
//! Cells are stateless facades over a [`streamstate_core::StateStore`]: all
//! durable data lives in the store, the cell only holds a cache and its
//! flush hooks.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hooks;
pub mod scalar_cell;

pub use hooks::FlushHook;
pub use scalar_cell::{CellState, DefaultFactory, ScalarStateCell};
