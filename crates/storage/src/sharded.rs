//! Sharded in-memory state store
//!
//! One shard per stream, one slot per state name within it.
//!
//! # Design
//!
//! - DashMap: sharded by stream id, lock-free reads
//! - FxHashMap: O(1) lookups within a stream, fast non-crypto hash
//! - Per-stream: partitions of a pipeline never contend with each other
//!
//! Each slot holds a staged value (written by `set`, not yet committed) and
//! a committed value. Nothing ever reaches disk; "committed" here means
//! "survives `discard`".

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use streamstate_core::{RawValue, StateKey, StateStore, StoreResult};
use tracing::trace;

/// Staged and committed value of one key
#[derive(Debug, Clone, Default)]
pub struct Slot {
    /// Written through `set`, pending commit
    pub staged: Option<RawValue>,
    /// Last committed value
    pub committed: Option<RawValue>,
}

impl Slot {
    /// Staged-over-committed view
    pub fn current(&self) -> Option<&RawValue> {
        self.staged.as_ref().or(self.committed.as_ref())
    }

    /// Move the staged value into the committed position
    ///
    /// Returns false when nothing was staged.
    pub fn promote(&mut self) -> bool {
        match self.staged.take() {
            Some(value) => {
                self.committed = Some(value);
                true
            }
            None => false,
        }
    }

    fn is_vacant(&self) -> bool {
        self.staged.is_none() && self.committed.is_none()
    }
}

/// Per-stream shard containing that stream's slots
#[derive(Debug, Default)]
struct Shard {
    slots: FxHashMap<String, Slot>,
}

/// In-memory [`StateStore`]
///
/// # Thread Safety
///
/// All operations are thread-safe:
/// - get(): lock-free read via DashMap
/// - set()/commit()/discard(): only lock the target stream's shard
///
/// # Example
///
/// ```
/// use streamstate_core::{RawValue, StateKey, StateStore};
/// use streamstate_storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// let key = StateKey::new("stream", "count");
///
/// store.set(&key, RawValue::from_bytes(vec![1])).unwrap();
/// assert!(store.get_committed(&key).unwrap().is_none());
///
/// store.commit(&key).unwrap();
/// assert_eq!(store.get_committed(&key).unwrap().unwrap().as_bytes(), &[1]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    shards: DashMap<String, Shard>,
    commits: AtomicU64,
}

impl MemoryStore {
    /// Create new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a committed value, bypassing the staged layer
    ///
    /// Used when loading state produced elsewhere (recovery, fixtures).
    pub fn insert_committed(&self, key: &StateKey, value: RawValue) {
        self.shards
            .entry(key.stream_id.clone())
            .or_default()
            .slots
            .entry(key.name.clone())
            .or_default()
            .committed = Some(value);
    }

    /// Number of keys with a staged, uncommitted value
    pub fn pending_count(&self) -> usize {
        self.shards
            .iter()
            .map(|entry| {
                entry
                    .value()
                    .slots
                    .values()
                    .filter(|slot| slot.staged.is_some())
                    .count()
            })
            .sum()
    }

    /// Number of commits that promoted a staged value
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Acquire)
    }

    /// Snapshot of one slot
    pub fn slot(&self, key: &StateKey) -> Option<Slot> {
        self.shards
            .get(&key.stream_id)
            .and_then(|shard| shard.slots.get(&key.name).cloned())
    }
}

impl StateStore for MemoryStore {
    #[inline]
    fn get(&self, key: &StateKey) -> StoreResult<Option<RawValue>> {
        Ok(self
            .shards
            .get(&key.stream_id)
            .and_then(|shard| shard.slots.get(&key.name).and_then(|s| s.current().cloned())))
    }

    #[inline]
    fn set(&self, key: &StateKey, value: RawValue) -> StoreResult<()> {
        self.shards
            .entry(key.stream_id.clone())
            .or_default()
            .slots
            .entry(key.name.clone())
            .or_default()
            .staged = Some(value);
        Ok(())
    }

    fn commit(&self, key: &StateKey) -> StoreResult<()> {
        let promoted = self
            .shards
            .get_mut(&key.stream_id)
            .and_then(|mut shard| shard.slots.get_mut(&key.name).map(Slot::promote))
            .unwrap_or(false);
        if promoted {
            self.commits.fetch_add(1, Ordering::AcqRel);
        }
        trace!(key = %key, promoted, "memory store commit");
        Ok(())
    }

    fn discard(&self, key: &StateKey) -> StoreResult<()> {
        if let Some(mut shard) = self.shards.get_mut(&key.stream_id) {
            let vacant = match shard.slots.get_mut(&key.name) {
                Some(slot) => {
                    slot.staged = None;
                    slot.is_vacant()
                }
                None => false,
            };
            if vacant {
                shard.slots.remove(&key.name);
            }
        }
        Ok(())
    }

    fn get_committed(&self, key: &StateKey) -> StoreResult<Option<RawValue>> {
        Ok(self
            .shards
            .get(&key.stream_id)
            .and_then(|shard| shard.slots.get(&key.name).and_then(|s| s.committed.clone())))
    }
}
