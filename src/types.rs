//! Public types re-exported from the member crates.

// Cell
pub use streamstate_primitives::{CellState, DefaultFactory, FlushHook, ScalarStateCell};

// Keys, values, encodings
pub use streamstate_core::{Encoding, Mutability, RawValue, Shared, StateKey, StateValue};

// Store contract and its errors
pub use streamstate_core::{CellError, CodecError, HookError, HookKind, StateStore, StoreError};

// Stores
pub use streamstate_durability::{FileStore, FileStoreOptions, RecoveryOptions, RecoveryResult};
pub use streamstate_storage::{DurabilityMode, MemoryStore};
