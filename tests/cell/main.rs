//! Scalar State Cell Test Suite
//!
//! End-to-end tests for `ScalarStateCell` over every store implementation.
//!
//! ## Modules
//!
//! - `basic_ops`: value, set_value, assign, update, defaults
//! - `flush_protocol`: flush sequence, hook binding and teardown
//! - `reference_values`: resync of alias-mutable values
//! - `failures`: store failures, retries, panicking hooks
//! - `durability`: file store reopen, torn tails, corruption limits
//! - `properties`: proptest checks of read/flush/reset
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test cell
//! cargo test --test cell flush_protocol::
//! ```

use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use streamstate::{
    Encoding, FileStore, FileStoreOptions, MemoryStore, RawValue, StateKey, StateStore,
    StateValue, StoreError,
};
use streamstate_core::StoreResult;
use tempfile::TempDir;

pub mod flush_protocol;
pub mod properties;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Route tracing output through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Key in the shared test stream
pub fn key(name: &str) -> StateKey {
    StateKey::new("test_stream", name)
}

/// Decode the committed value of `key`
pub fn committed<T: StateValue>(store: &dyn StateStore, key: &StateKey) -> Option<T> {
    store
        .get_committed(key)
        .unwrap()
        .map(|raw| Encoding::default().decode(&raw).unwrap())
}

/// Decode the current (staged-over-committed) value of `key`
pub fn current<T: StateValue>(store: &dyn StateStore, key: &StateKey) -> Option<T> {
    store
        .get(key)
        .unwrap()
        .map(|raw| Encoding::default().decode(&raw).unwrap())
}

/// Open a strict file store in `dir`
pub fn file_store(dir: &Path) -> FileStore {
    FileStore::open(dir.join("state.log"), FileStoreOptions::strict())
        .expect("Failed to open file store")
}

/// Run a test body against an in-memory store and a fresh file store
pub fn test_across_stores<F>(test_fn: F)
where
    F: Fn(&dyn StateStore),
{
    init_tracing();

    let memory = MemoryStore::new();
    test_fn(&memory);

    let dir = TempDir::new().unwrap();
    let file = file_store(dir.path());
    test_fn(&file);
}

// =============================================================================
// PROBE STORE
// =============================================================================

/// MemoryStore that records every call into a shared event log
///
/// Hooks under test push into the same log through [`ProbeStore::record`],
/// so the log shows the exact interleaving of store calls and callbacks.
#[derive(Default)]
pub struct ProbeStore {
    inner: MemoryStore,
    events: Mutex<Vec<String>>,
}

impl ProbeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    /// Decoded value staged by the most recent `set`
    pub fn staged<T: StateValue>(&self, key: &StateKey) -> Option<T> {
        self.inner
            .slot(key)
            .and_then(|slot| slot.staged)
            .map(|raw| Encoding::default().decode(&raw).unwrap())
    }
}

impl StateStore for ProbeStore {
    fn get(&self, key: &StateKey) -> StoreResult<Option<RawValue>> {
        self.record("get");
        self.inner.get(key)
    }

    fn set(&self, key: &StateKey, value: RawValue) -> StoreResult<()> {
        self.record("set");
        self.inner.set(key, value)
    }

    fn commit(&self, key: &StateKey) -> StoreResult<()> {
        self.record("commit");
        self.inner.commit(key)
    }

    fn discard(&self, key: &StateKey) -> StoreResult<()> {
        self.record("discard");
        self.inner.discard(key)
    }

    fn get_committed(&self, key: &StateKey) -> StoreResult<Option<RawValue>> {
        self.inner.get_committed(key)
    }
}

// =============================================================================
// FLAKY STORE
// =============================================================================

/// MemoryStore whose commits and writes can be switched to fail
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_commit: AtomicBool,
    fail_set: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl StateStore for FlakyStore {
    fn get(&self, key: &StateKey) -> StoreResult<Option<RawValue>> {
        self.inner.get(key)
    }

    fn set(&self, key: &StateKey, value: RawValue) -> StoreResult<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        self.inner.set(key, value)
    }

    fn commit(&self, key: &StateKey) -> StoreResult<()> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(StoreError::CommitFailed {
                key: key.clone(),
                reason: "injected failure".to_string(),
            });
        }
        self.inner.commit(key)
    }

    fn discard(&self, key: &StateKey) -> StoreResult<()> {
        self.inner.discard(key)
    }

    fn get_committed(&self, key: &StateKey) -> StoreResult<Option<RawValue>> {
        self.inner.get_committed(key)
    }
}
