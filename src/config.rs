//! File-based configuration.
//!
//! ```toml
//! path = "/var/lib/pipeline/state.log"
//! encoding = "json"
//!
//! [durability]
//! mode = "batched"
//! interval_ms = 50
//! batch_size = 500
//!
//! [recovery]
//! max_corrupt_entries = 0
//! truncate_torn_tail = false
//! ```
//!
//! Every field is optional. A missing `path` gives an ephemeral store.

use crate::database::{StreamState, StreamStateBuilder};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use streamstate_core::Encoding;
use streamstate_durability::RecoveryOptions;
use streamstate_storage::DurabilityMode;

/// Store configuration loadable from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamStateConfig {
    /// Commit log path; `None` for an ephemeral store
    pub path: Option<PathBuf>,
    /// Value encoding for cells
    pub encoding: Encoding,
    /// When commits are fsynced
    pub durability: DurabilityMode,
    /// How log damage is handled on open
    pub recovery: RecoveryOptions,
}

impl StreamStateConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Builder preloaded with this configuration
    pub fn builder(&self) -> StreamStateBuilder {
        let mut builder = StreamStateBuilder::new()
            .durability(self.durability)
            .recovery(self.recovery.clone())
            .encoding(self.encoding);
        if let Some(path) = &self.path {
            builder = builder.path(path);
        }
        builder
    }

    /// Open the configured store
    pub fn open(&self) -> Result<StreamState> {
        self.builder().open()
    }
}
