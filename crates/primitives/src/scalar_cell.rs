//! ScalarStateCell primitive implementation
//!
//! A named slot holding one value for a stream: a counter, an aggregate, a
//! session marker. Reads and writes hit an in-memory cache; the value only
//! becomes durable when the owner calls [`ScalarStateCell::flush`] at a
//! checkpoint.
//!
//! ## Design
//!
//! - `set_value` caches the value and stages its encoding in the store
//!   (write-through, durability deferred)
//! - `value` serves the cache, then the store, then the default factory
//! - `flush` commits the staged value and fires the caller's hooks
//! - `reset` drops the cache and the staged write; the committed value is
//!   what the next read sees
//!
//! ## Flush Sequence
//!
//! 1. Resync: reference-like cells re-encode the cached value into the store
//! 2. `on_flushing` hook
//! 3. Commit (skipped when nothing is cached)
//! 4. `on_flushed` hook
//!
//! Step 1 exists because a reference-like value (see [`Shared`]) can be
//! mutated through an alias after `set_value` staged it. Re-encoding right
//! before the commit makes what is persisted match what the caller sees.
//!
//! ## Defaults Are Not Persisted
//!
//! A default produced by the factory is returned but neither cached nor
//! staged. Each read of an empty cell over an empty store calls the factory
//! again. Write it back with `set_value` to keep it.
//!
//! [`Shared`]: streamstate_core::Shared

use crate::hooks::{FlushHook, FlushHooks};
use std::fmt;
use streamstate_core::{
    CellError, CodecError, Encoding, HookKind, Mutability, Result, StateKey, StateStore,
    StateValue,
};
use tracing::{debug, trace};

/// Factory producing a value for an empty cell
pub type DefaultFactory<'a, T> = Box<dyn Fn() -> T + 'a>;

/// Where a cell stands relative to its store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    /// Nothing cached
    Empty,
    /// Cached value was read from the store and not written since
    Loaded,
    /// Cached value was written since the last successful flush
    Dirty,
    /// Cached value was committed by the last flush
    Flushed,
}

/// Single-value durable state cell
///
/// The store is borrowed: it must outlive the cell, and many cells may share
/// it. The cell itself is single-owner; every mutating operation takes
/// `&mut self`.
///
/// # Example
///
/// ```
/// use streamstate_core::StateKey;
/// use streamstate_primitives::ScalarStateCell;
/// use streamstate_storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// let mut count = ScalarStateCell::with_default(&store, StateKey::new("clicks", "count"), || 0i64);
///
/// count.update(|n| n + 1).unwrap();
/// count.update(|n| n + 1).unwrap();
/// count.flush().unwrap();
///
/// assert_eq!(count.value().unwrap(), 2);
/// ```
pub struct ScalarStateCell<'a, T: StateValue> {
    store: &'a dyn StateStore,
    key: StateKey,
    encoding: Encoding,
    cached: Option<T>,
    default_factory: Option<DefaultFactory<'a, T>>,
    state: CellState,
    hooks: FlushHooks<'a>,
}

impl<'a, T: StateValue> ScalarStateCell<'a, T> {
    /// Create a cell with no default; reading it empty fails with
    /// [`CellError::NoDefault`]
    pub fn new(store: &'a dyn StateStore, key: StateKey) -> Self {
        Self {
            store,
            key,
            encoding: Encoding::default(),
            cached: None,
            default_factory: None,
            state: CellState::Empty,
            hooks: FlushHooks::new(),
        }
    }

    /// Create a cell whose empty reads call `factory`
    pub fn with_default(
        store: &'a dyn StateStore,
        key: StateKey,
        factory: impl Fn() -> T + 'a,
    ) -> Self {
        let mut cell = Self::new(store, key);
        cell.default_factory = Some(Box::new(factory));
        cell
    }

    /// Create a cell whose empty reads return `T::default()`
    pub fn with_type_default(store: &'a dyn StateStore, key: StateKey) -> Self
    where
        T: Default + 'a,
    {
        Self::with_default(store, key, T::default)
    }

    /// Use `encoding` for values of this cell
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Key of this cell
    pub fn key(&self) -> &StateKey {
        &self.key
    }

    /// Mutability class of `T`, fixed for the life of the cell
    pub fn mutability(&self) -> Mutability {
        T::MUTABILITY
    }

    /// Encoding used for the store
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Current state
    pub fn state(&self) -> CellState {
        self.state
    }

    /// Check if a write is waiting for a flush
    ///
    /// Mutation through an alias of a reference-like value is not tracked;
    /// flush such cells unconditionally.
    pub fn is_dirty(&self) -> bool {
        self.state == CellState::Dirty
    }

    /// Check if a value is cached
    pub fn has_cached_value(&self) -> bool {
        self.cached.is_some()
    }

    /// Check if a default factory is configured
    pub fn has_default(&self) -> bool {
        self.default_factory.is_some()
    }

    /// Number of hook invocations that panicked
    pub fn hook_failures(&self) -> u64 {
        self.hooks.failures()
    }

    // =========================================================================
    // Value access
    // =========================================================================

    /// Read the value
    ///
    /// Served from the cache, else loaded from the store and cached, else
    /// produced by the default factory (not cached, not staged).
    ///
    /// # Errors
    ///
    /// - [`CellError::NoDefault`] if nothing is cached or stored and there is
    ///   no factory
    /// - store and codec errors, unmodified
    pub fn value(&mut self) -> Result<T> {
        if let Some(value) = &self.cached {
            return Ok(value.clone());
        }

        if let Some(raw) = self.store.get(&self.key)? {
            let value: T = self
                .encoding
                .decode(&raw)
                .map_err(|e| self.codec_error(e))?;
            trace!(key = %self.key, bytes = raw.len(), "loaded scalar state from store");
            self.cached = Some(value.clone());
            self.state = CellState::Loaded;
            return Ok(value);
        }

        match &self.default_factory {
            Some(factory) => Ok(factory()),
            None => Err(CellError::NoDefault {
                key: self.key.clone(),
            }),
        }
    }

    /// Write the value
    ///
    /// Caches `value` and stages its encoding in the store. Nothing is
    /// durable until [`flush`](Self::flush). On error the cell is unchanged.
    pub fn set_value(&mut self, value: T) -> Result<()> {
        let raw = self
            .encoding
            .encode(&value)
            .map_err(|e| self.codec_error(e))?;
        self.store.set(&self.key, raw)?;
        self.cached = Some(value);
        self.state = CellState::Dirty;
        Ok(())
    }

    /// Write the value if present; `None` is a no-op
    pub fn assign(&mut self, value: Option<T>) -> Result<()> {
        match value {
            Some(value) => self.set_value(value),
            None => Ok(()),
        }
    }

    /// Read, transform and write back
    ///
    /// The read follows [`value`](Self::value), so an empty cell starts from
    /// its default.
    pub fn update(&mut self, f: impl FnOnce(T) -> T) -> Result<()> {
        let current = self.value()?;
        self.set_value(f(current))
    }

    // =========================================================================
    // Flush / reset
    // =========================================================================

    /// Commit the cached value and notify hooks
    ///
    /// See the module docs for the sequence. An empty cell commits nothing
    /// but still fires both hooks.
    ///
    /// # Errors
    ///
    /// Resync and commit errors are returned as-is; `on_flushed` is not
    /// fired and the cell keeps its cached value and dirty state, so calling
    /// `flush` again retries with the same value. Hook panics are never
    /// returned (see [`hook_failures`](Self::hook_failures)).
    ///
    /// # Deadlock
    ///
    /// Resync serializes the cached value. For a
    /// [`Shared`](streamstate_core::Shared) value that takes its lock, so a
    /// guard from `Shared::lock` still held by the caller blocks `flush`
    /// forever. Drop it first.
    pub fn flush(&mut self) -> Result<()> {
        let has_value = self.cached.is_some();

        if has_value && T::MUTABILITY.needs_resync() {
            self.resync()?;
        }

        self.hooks.fire(HookKind::Flushing, &self.key);

        if has_value {
            self.store.commit(&self.key)?;
            self.state = CellState::Flushed;
        }

        self.hooks.fire(HookKind::Flushed, &self.key);

        debug!(key = %self.key, committed = has_value, "scalar state flushed");
        Ok(())
    }

    /// Re-stage the current content of the cached value
    fn resync(&mut self) -> Result<()> {
        let Some(value) = &self.cached else {
            return Ok(());
        };
        let raw = self
            .encoding
            .encode(value)
            .map_err(|e| self.codec_error(e))?;
        trace!(key = %self.key, bytes = raw.len(), "resynced reference-like value");
        self.store.set(&self.key, raw)?;
        Ok(())
    }

    /// Discard in-memory changes
    ///
    /// Drops the cached value and the staged write. The committed value is
    /// untouched, and no hook fires. The next [`value`](Self::value) reloads
    /// from the store.
    pub fn reset(&mut self) -> Result<()> {
        self.store.discard(&self.key)?;
        self.cached = None;
        self.state = CellState::Empty;
        debug!(key = %self.key, "scalar state reset");
        Ok(())
    }

    // =========================================================================
    // Hooks
    // =========================================================================

    /// Bind or unbind the pre-commit hook
    ///
    /// The previous hook is dropped before the new one is installed. The
    /// resync step of reference-like cells is not a hook and is unaffected.
    pub fn set_on_flushing(&mut self, hook: Option<FlushHook<'a>>) {
        self.hooks.replace(HookKind::Flushing, hook, &self.key);
    }

    /// Bind or unbind the post-commit hook
    pub fn set_on_flushed(&mut self, hook: Option<FlushHook<'a>>) {
        self.hooks.replace(HookKind::Flushed, hook, &self.key);
    }

    /// Bind the pre-commit hook
    pub fn on_flushing(&mut self, hook: impl FnMut() + 'a) {
        self.set_on_flushing(Some(Box::new(hook)));
    }

    /// Bind the post-commit hook
    pub fn on_flushed(&mut self, hook: impl FnMut() + 'a) {
        self.set_on_flushed(Some(Box::new(hook)));
    }

    /// Unbind the pre-commit hook
    pub fn clear_on_flushing(&mut self) {
        self.set_on_flushing(None);
    }

    /// Unbind the post-commit hook
    pub fn clear_on_flushed(&mut self) {
        self.set_on_flushed(None);
    }

    /// Check if a pre-commit hook is bound
    pub fn has_on_flushing(&self) -> bool {
        self.hooks.is_bound(HookKind::Flushing)
    }

    /// Check if a post-commit hook is bound
    pub fn has_on_flushed(&self) -> bool {
        self.hooks.is_bound(HookKind::Flushed)
    }

    /// Unbind both hooks
    ///
    /// Idempotent. Also runs on drop.
    pub fn dispose(&mut self) {
        self.hooks.clear(&self.key);
    }

    fn codec_error(&self, source: CodecError) -> CellError {
        CellError::Codec {
            key: self.key.clone(),
            source,
        }
    }
}

impl<'a, T: StateValue> Drop for ScalarStateCell<'a, T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<'a, T: StateValue> fmt::Debug for ScalarStateCell<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarStateCell")
            .field("key", &self.key)
            .field("mutability", &T::MUTABILITY)
            .field("state", &self.state)
            .field("encoding", &self.encoding)
            .field("has_default", &self.default_factory.is_some())
            .finish()
    }
}
