//! Commit log recovery
//!
//! Rebuilds the committed state of a [`crate::FileStore`] by replaying its
//! commit log:
//!
//! 1. Validate the file header
//! 2. Decode frames front to back, last record per key wins
//! 3. Skip frames with a bad checksum, up to a configurable limit
//! 4. Stop at a torn tail and report where the valid prefix ends
//!
//! ## Key Principle
//!
//! After recovery the store holds exactly the values of commits whose frame
//! reached disk intact. Staged values are never recovered.

use crate::encoding::{check_header, decode_record, Decoded, LOG_HEADER_SIZE};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use streamstate_core::{RawValue, StateKey, StoreError, StoreResult};
use tracing::{debug, info, warn};

// ============================================================================
// Recovery Options
// ============================================================================

/// Recovery options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryOptions {
    /// Maximum corrupt frames to tolerate before failing
    pub max_corrupt_entries: usize,
    /// Whether a torn tail is cut off (true) or treated as corruption (false)
    pub truncate_torn_tail: bool,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        RecoveryOptions {
            max_corrupt_entries: 10,
            truncate_torn_tail: true,
        }
    }
}

impl RecoveryOptions {
    /// Strict recovery options - fail on any damage
    pub fn strict() -> Self {
        RecoveryOptions {
            max_corrupt_entries: 0,
            truncate_torn_tail: false,
        }
    }

    /// Permissive recovery options - tolerate more corruption
    pub fn permissive() -> Self {
        RecoveryOptions {
            max_corrupt_entries: 100,
            truncate_torn_tail: true,
        }
    }
}

// ============================================================================
// Recovery Result
// ============================================================================

/// Recovery result
#[derive(Debug, Default, Clone)]
pub struct RecoveryResult {
    /// Frames replayed
    pub records_replayed: u64,
    /// Distinct keys recovered
    pub keys_recovered: usize,
    /// Corrupt frames skipped
    pub corrupt_entries_skipped: u64,
    /// Bytes dropped from a torn tail
    pub torn_tail_bytes: u64,
    /// Length of the valid log prefix
    pub valid_len: u64,
    /// Total recovery time (microseconds)
    pub recovery_time_micros: u64,
}

impl RecoveryResult {
    /// Get human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Recovery complete: {} records, {} keys, {} corrupt, {} torn bytes, {:.2}ms",
            self.records_replayed,
            self.keys_recovered,
            self.corrupt_entries_skipped,
            self.torn_tail_bytes,
            self.recovery_time_micros as f64 / 1000.0,
        )
    }

    /// Check if recovery had any issues (corruption or torn tail)
    pub fn has_issues(&self) -> bool {
        self.corrupt_entries_skipped > 0 || self.torn_tail_bytes > 0
    }
}

// ============================================================================
// Replay
// ============================================================================

/// Committed state rebuilt from a log
pub type Recovered = FxHashMap<StateKey, RawValue>;

/// Replay the log at `path`
pub fn recover(path: &Path, options: &RecoveryOptions) -> StoreResult<(Recovered, RecoveryResult)> {
    let started = Instant::now();
    let bytes = std::fs::read(path)?;
    check_header(&bytes)?;

    let mut state = Recovered::default();
    let mut result = RecoveryResult::default();
    let mut offset = LOG_HEADER_SIZE;

    while offset < bytes.len() {
        match decode_record(&bytes[offset..]) {
            Decoded::Record(record, size) => {
                state.insert(record.key, record.value);
                result.records_replayed += 1;
                offset += size;
            }
            Decoded::Corrupt(reason, size) => {
                result.corrupt_entries_skipped += 1;
                warn!(
                    path = %path.display(),
                    offset,
                    reason = %reason,
                    "skipping corrupt commit record"
                );
                if result.corrupt_entries_skipped > options.max_corrupt_entries as u64 {
                    return Err(StoreError::Corruption(format!(
                        "too many corrupt entries: {} (max allowed: {})",
                        result.corrupt_entries_skipped, options.max_corrupt_entries
                    )));
                }
                offset += size;
            }
            Decoded::Incomplete { have, needed } => {
                if !options.truncate_torn_tail {
                    return Err(StoreError::Corruption(format!(
                        "incomplete entry at {}: need {} bytes, have {}",
                        offset, needed, have
                    )));
                }
                warn!(
                    path = %path.display(),
                    offset,
                    have,
                    needed,
                    "commit log ends in a torn record"
                );
                result.torn_tail_bytes = have as u64;
                break;
            }
        }
    }

    result.valid_len = offset as u64;
    result.keys_recovered = state.len();
    result.recovery_time_micros = started.elapsed().as_micros() as u64;

    if result.has_issues() {
        info!(path = %path.display(), "{}", result.summary());
    } else {
        debug!(path = %path.display(), "{}", result.summary());
    }
    Ok((state, result))
}
