//! Store contract
//!
//! A cell never owns durable storage. It talks to a [`StateStore`] through
//! a narrow per-key interface with two layers:
//!
//! - **staged**: the latest value written through `set`, visible to `get`
//!   immediately, not durable
//! - **committed**: the value made durable by the last `commit`
//!
//! `get` reads staged-over-committed; `get_committed` reads only the durable
//! layer.

use crate::error::StoreResult;
use crate::types::{RawValue, StateKey};
use std::sync::Arc;

/// Backing store for scalar state cells
///
/// Implementations must be safe to share between threads: many cells (one
/// per stream/key) may sit on the same store.
pub trait StateStore: Send + Sync {
    /// Read the current value: staged if present, otherwise committed
    fn get(&self, key: &StateKey) -> StoreResult<Option<RawValue>>;

    /// Stage a value for `key`; durability is not implied
    fn set(&self, key: &StateKey, value: RawValue) -> StoreResult<()>;

    /// Make the staged value for `key` durable
    ///
    /// No staged value is a no-op. On error the staged value is kept, so a
    /// retry commits the same bytes.
    fn commit(&self, key: &StateKey) -> StoreResult<()>;

    /// Drop the staged value for `key`; the committed value is untouched
    fn discard(&self, key: &StateKey) -> StoreResult<()>;

    /// Read only the committed value
    fn get_committed(&self, key: &StateKey) -> StoreResult<Option<RawValue>>;
}

impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    fn get(&self, key: &StateKey) -> StoreResult<Option<RawValue>> {
        (**self).get(key)
    }

    fn set(&self, key: &StateKey, value: RawValue) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn commit(&self, key: &StateKey) -> StoreResult<()> {
        (**self).commit(key)
    }

    fn discard(&self, key: &StateKey) -> StoreResult<()> {
        (**self).discard(key)
    }

    fn get_committed(&self, key: &StateKey) -> StoreResult<Option<RawValue>> {
        (**self).get_committed(key)
    }
}
