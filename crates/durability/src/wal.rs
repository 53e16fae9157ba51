//! Commit log
//!
//! Every successful commit appends one [`WalRecord`] holding the full value
//! of the committed key. Replaying the log front to back and keeping the last
//! record per key rebuilds the committed state.
//!
//! Staged (uncommitted) values never reach the log.

use crate::encoding::{encode_header, encode_record, LOG_HEADER_SIZE};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use streamstate_core::{RawValue, StateKey, StoreError, StoreResult};
use streamstate_storage::DurabilityMode;
use tracing::{debug, warn};

/// One committed value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalRecord {
    /// Key that was committed
    pub key: StateKey,
    /// Committed value
    pub value: RawValue,
    /// Commit time, milliseconds since epoch
    pub committed_at: i64,
}

impl WalRecord {
    /// Create a record stamped with the current time
    pub fn new(key: StateKey, value: RawValue) -> Self {
        Self {
            key,
            value,
            committed_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Append handle on a commit log file
#[derive(Debug)]
pub struct CommitLog {
    path: PathBuf,
    file: File,
    /// Length of the valid prefix; every append starts here
    len: u64,
    mode: DurabilityMode,
    unsynced: usize,
    last_sync: Instant,
}

impl CommitLog {
    /// Create a fresh log, replacing anything at `path`
    pub fn create(path: &Path, mode: DurabilityMode) -> StoreResult<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .read(true)
            .open(path)?;
        file.write_all(&encode_header())?;
        file.sync_all()?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            len: LOG_HEADER_SIZE as u64,
            mode,
            unsynced: 0,
            last_sync: Instant::now(),
        })
    }

    /// Open an existing log for appending after `valid_len` bytes
    ///
    /// Anything past `valid_len` (a torn tail found during recovery) is cut
    /// off first.
    pub fn open_at(path: &Path, valid_len: u64, mode: DurabilityMode) -> StoreResult<Self> {
        let file = OpenOptions::new().write(true).read(true).open(path)?;
        let actual = file.metadata()?.len();
        if actual > valid_len {
            warn!(
                path = %path.display(),
                dropped = actual - valid_len,
                "truncating torn tail of commit log"
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            file,
            len: valid_len,
            mode,
            unsynced: 0,
            last_sync: Instant::now(),
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the valid log in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True when the log holds only its header
    pub fn is_empty(&self) -> bool {
        self.len <= LOG_HEADER_SIZE as u64
    }

    /// Append one record, syncing according to the durability mode
    ///
    /// On failure the file is cut back to its previous length so a later
    /// append never lands behind a partial frame.
    pub fn append(&mut self, record: &WalRecord) -> StoreResult<()> {
        let frame = encode_record(record)?;
        if let Err(e) = self.write_frame(&frame) {
            if let Err(truncate_err) = self.file.set_len(self.len) {
                warn!(
                    path = %self.path.display(),
                    error = %truncate_err,
                    "failed to roll back partial commit frame"
                );
            }
            return Err(e);
        }
        self.len += frame.len() as u64;
        self.unsynced += 1;

        let due = self.mode.requires_immediate_fsync()
            || self.mode.should_sync(self.unsynced, self.since_last_sync());
        if due {
            self.sync()?;
        }
        Ok(())
    }

    fn write_frame(&mut self, frame: &[u8]) -> StoreResult<()> {
        self.file.seek(SeekFrom::Start(self.len))?;
        self.file.write_all(frame)?;
        Ok(())
    }

    /// Force an fsync of everything appended so far
    pub fn sync(&mut self) -> StoreResult<()> {
        if self.unsynced == 0 {
            return Ok(());
        }
        self.file.sync_data().map_err(StoreError::from)?;
        debug!(path = %self.path.display(), records = self.unsynced, "commit log synced");
        self.unsynced = 0;
        self.last_sync = Instant::now();
        Ok(())
    }

    /// Records appended since the last fsync
    pub fn unsynced(&self) -> usize {
        self.unsynced
    }

    fn since_last_sync(&self) -> Duration {
        self.last_sync.elapsed()
    }
}
