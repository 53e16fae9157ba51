//! Convenient imports for streamstate.
//!
//! ```ignore
//! use streamstate::prelude::*;
//!
//! let state = StreamState::ephemeral();
//! let mut count = state.scalar_or_default::<u64>("clicks", "count");
//! count.update(|n| n + 1)?;
//! ```

// Main entry point
pub use crate::config::StreamStateConfig;
pub use crate::database::{StreamState, StreamStateBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Cell and value types
pub use crate::types::{CellState, Encoding, Mutability, ScalarStateCell, Shared, StateKey, StateValue};

// Store selection
pub use crate::types::{DurabilityMode, StateStore};
