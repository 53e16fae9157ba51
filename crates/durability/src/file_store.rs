//! File-backed state store
//!
//! Staged values live in memory. `commit` appends the staged value of one key
//! to the commit log and only then moves it into the committed map, so the
//! committed map never runs ahead of what recovery would rebuild.
//!
//! ## Usage
//!
//! ```ignore
//! let store = FileStore::open(dir.join("state.log"), FileStoreOptions::default())?;
//! store.set(&key, raw)?;
//! store.commit(&key)?; // durable per the configured DurabilityMode
//! ```

use crate::encoding::LOG_HEADER_SIZE;
use crate::recovery::{recover, RecoveryOptions, RecoveryResult};
use crate::wal::{CommitLog, WalRecord};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use streamstate_core::{RawValue, StateKey, StateStore, StoreError, StoreResult};
use streamstate_storage::DurabilityMode;
use tracing::{debug, info, warn};

/// Options for [`FileStore::open`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreOptions {
    /// When commits are fsynced
    pub durability: DurabilityMode,
    /// How damage found on open is handled
    pub recovery: RecoveryOptions,
}

impl FileStoreOptions {
    /// fsync every commit, fail on any damage
    pub fn strict() -> Self {
        Self {
            durability: DurabilityMode::Strict,
            recovery: RecoveryOptions::strict(),
        }
    }

    /// Override the durability mode
    pub fn with_durability(mut self, durability: DurabilityMode) -> Self {
        self.durability = durability;
        self
    }

    /// Override the recovery options
    pub fn with_recovery(mut self, recovery: RecoveryOptions) -> Self {
        self.recovery = recovery;
        self
    }
}

#[derive(Debug, Default)]
struct Tables {
    staged: FxHashMap<StateKey, RawValue>,
    committed: FxHashMap<StateKey, RawValue>,
}

/// Durable [`StateStore`] backed by an append-only commit log
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    options: FileStoreOptions,
    tables: Mutex<Tables>,
    /// `None` when the durability mode writes no log
    log: Mutex<Option<CommitLog>>,
    recovery: RecoveryResult,
}

impl FileStore {
    /// Open (or create) the store at `path`
    ///
    /// An existing log is replayed; see [`crate::recovery`].
    pub fn open(path: impl AsRef<Path>, options: FileStoreOptions) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let short_log = match std::fs::metadata(&path) {
            Ok(meta) => Some(meta.len()).filter(|len| *len < LOG_HEADER_SIZE as u64),
            Err(_) => None,
        };

        let (committed, recovery, log) = if let (Some(len), true) =
            (short_log, options.recovery.truncate_torn_tail)
        {
            // Crash while the header itself was being written
            warn!(
                path = %path.display(),
                len,
                "commit log shorter than its header, starting a fresh log"
            );
            let log = if options.durability.requires_log() {
                Some(CommitLog::create(&path, options.durability)?)
            } else {
                None
            };
            let result = RecoveryResult {
                torn_tail_bytes: len,
                ..RecoveryResult::default()
            };
            (FxHashMap::default(), result, log)
        } else if path.exists() {
            let (committed, result) = recover(&path, &options.recovery)?;
            let log = if options.durability.requires_log() {
                Some(CommitLog::open_at(&path, result.valid_len, options.durability)?)
            } else {
                None
            };
            (committed, result, log)
        } else {
            let log = if options.durability.requires_log() {
                Some(CommitLog::create(&path, options.durability)?)
            } else {
                None
            };
            (FxHashMap::default(), RecoveryResult::default(), log)
        };

        info!(
            path = %path.display(),
            keys = committed.len(),
            mode = options.durability.description(),
            "file store opened"
        );

        Ok(Self {
            path,
            options,
            tables: Mutex::new(Tables {
                staged: FxHashMap::default(),
                committed,
            }),
            log: Mutex::new(log),
            recovery,
        })
    }

    /// Path of the commit log
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options the store was opened with
    pub fn options(&self) -> &FileStoreOptions {
        &self.options
    }

    /// What recovery found when the store was opened
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Number of committed keys
    pub fn committed_len(&self) -> usize {
        self.tables.lock().committed.len()
    }

    /// Number of keys with a staged, uncommitted value
    pub fn pending_count(&self) -> usize {
        self.tables.lock().staged.len()
    }

    /// Force an fsync of every commit appended so far
    pub fn sync(&self) -> StoreResult<()> {
        match self.log.lock().as_mut() {
            Some(log) => log.sync(),
            None => Ok(()),
        }
    }

    /// Rewrite the log with one record per committed key
    ///
    /// The new log is written beside the old one and renamed over it, so a
    /// crash mid-compaction leaves the old log intact.
    pub fn compact(&self) -> StoreResult<()> {
        let mut log_guard = self.log.lock();
        if log_guard.is_none() {
            return Ok(());
        }
        let snapshot: Vec<(StateKey, RawValue)> = {
            let tables = self.tables.lock();
            let mut entries: Vec<_> = tables
                .committed
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            entries
        };

        let tmp_path = self.path.with_extension("compact");
        {
            let mut tmp = CommitLog::create(&tmp_path, DurabilityMode::Strict)?;
            for (key, value) in &snapshot {
                tmp.append(&WalRecord::new(key.clone(), value.clone()))?;
            }
            tmp.sync()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        let valid_len = std::fs::metadata(&self.path)?.len();
        *log_guard = Some(CommitLog::open_at(
            &self.path,
            valid_len,
            self.options.durability,
        )?);
        debug!(path = %self.path.display(), keys = snapshot.len(), "commit log compacted");
        Ok(())
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &StateKey) -> StoreResult<Option<RawValue>> {
        let tables = self.tables.lock();
        Ok(tables
            .staged
            .get(key)
            .or_else(|| tables.committed.get(key))
            .cloned())
    }

    fn set(&self, key: &StateKey, value: RawValue) -> StoreResult<()> {
        self.tables.lock().staged.insert(key.clone(), value);
        Ok(())
    }

    fn commit(&self, key: &StateKey) -> StoreResult<()> {
        // Lock order: log, then tables.
        let mut log = self.log.lock();
        let mut tables = self.tables.lock();
        let staged = match tables.staged.get(key) {
            Some(value) => value.clone(),
            None => return Ok(()),
        };

        if let Some(log) = log.as_mut() {
            log.append(&WalRecord::new(key.clone(), staged.clone()))
                .map_err(|e| StoreError::CommitFailed {
                    key: key.clone(),
                    reason: e.to_string(),
                })?;
        }

        tables.staged.remove(key);
        tables.committed.insert(key.clone(), staged);
        Ok(())
    }

    fn discard(&self, key: &StateKey) -> StoreResult<()> {
        self.tables.lock().staged.remove(key);
        Ok(())
    }

    fn get_committed(&self, key: &StateKey) -> StoreResult<Option<RawValue>> {
        Ok(self.tables.lock().committed.get(key).cloned())
    }
}
