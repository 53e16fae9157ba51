//! Durability mode for commits.
//!
//! Defines when a committed value is fsynced to disk.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Durability mode for commits.
///
/// Controls when committed values are fsynced and the trade-off between
/// flush latency and what a crash can lose.
///
/// # Mode Comparison
///
/// | Mode | fsync | Crash loses |
/// |------|-------|-------------|
/// | None | never, no file I/O | everything |
/// | Batched | every N commits or T ms | up to one batch |
/// | Strict | every commit | nothing committed |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DurabilityMode {
    /// No durability - committed values live in memory only.
    ///
    /// Use case: tests, caches, ephemeral pipelines.
    None,

    /// fsync after every commit (slow, maximum durability).
    ///
    /// Use when a checkpoint must survive a crash the moment `flush`
    /// returns.
    Strict,

    /// fsync every N commits OR once T milliseconds have passed since the
    /// last fsync, checked at commit time.
    Batched {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum commits between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check if this mode writes a commit log at all.
    pub fn requires_log(&self) -> bool {
        !matches!(self, DurabilityMode::None)
    }

    /// Check if this mode requires immediate fsync on every commit.
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Strict)
    }

    /// Decide whether a commit must fsync.
    ///
    /// `pending` is the number of commits written since the last fsync,
    /// including the current one.
    pub fn should_sync(&self, pending: usize, since_last_sync: Duration) -> bool {
        match self {
            DurabilityMode::None => false,
            DurabilityMode::Strict => true,
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                pending >= *batch_size || since_last_sync >= Duration::from_millis(*interval_ms)
            }
        }
    }

    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::None => "No durability (fastest, all data lost on crash)",
            DurabilityMode::Strict => "fsync on every commit (safest, slowest)",
            DurabilityMode::Batched { .. } => "Batched fsync (balanced speed/safety)",
        }
    }

    /// Create a buffered mode with recommended defaults.
    ///
    /// Returns `Batched { interval_ms: 100, batch_size: 1000 }`.
    pub fn buffered_default() -> Self {
        DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::buffered_default()
    }
}
