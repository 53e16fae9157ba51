//! Main entry point for streamstate.
//!
//! [`StreamState`] owns one store and hands out [`ScalarStateCell`]s that
//! borrow it. Cells are cheap: create one per operator invocation or keep
//! them for the life of the pipeline.

use crate::error::Result;
use std::path::{Path, PathBuf};
use streamstate_core::{Encoding, StateKey, StateStore, StateValue};
use streamstate_durability::{FileStore, FileStoreOptions, RecoveryOptions, RecoveryResult};
use streamstate_primitives::ScalarStateCell;
use streamstate_storage::{DurabilityMode, MemoryStore};
use tracing::info;

enum Backend {
    Memory(MemoryStore),
    File(FileStore),
}

/// A set of scalar state cells over one store.
///
/// # Example
///
/// ```ignore
/// use streamstate::prelude::*;
///
/// let state = StreamState::open("./state/orders.log")?;
///
/// let mut total = state.scalar_or_default::<i64>("orders", "total");
/// total.update(|t| t + 25)?;
/// total.flush()?; // checkpoint
/// ```
pub struct StreamState {
    backend: Backend,
    encoding: Encoding,
}

impl StreamState {
    /// Open a file-backed store at the given path.
    ///
    /// Uses default settings (batched durability, default recovery limits).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an ephemeral store with no disk I/O.
    ///
    /// Commits only move values between in-memory layers. Everything is lost
    /// when the `StreamState` is dropped.
    ///
    /// | Method | Disk Files | Recovery |
    /// |--------|------------|----------|
    /// | `StreamState::ephemeral()` | None | No |
    /// | `StreamState::open(path)` | One commit log | Yes |
    pub fn ephemeral() -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::new()),
            encoding: Encoding::default(),
        }
    }

    /// Create a builder for store configuration.
    ///
    /// ```ignore
    /// let state = StreamState::builder()
    ///     .path("./state/orders.log")
    ///     .strict()
    ///     .encoding(Encoding::Json)
    ///     .open()?;
    /// ```
    pub fn builder() -> StreamStateBuilder {
        StreamStateBuilder::new()
    }

    // =========================================================================
    // Cells
    // =========================================================================

    /// Cell with no default; reading it empty fails with
    /// [`Error::NoDefault`](crate::Error::NoDefault)
    pub fn scalar<T: StateValue>(
        &self,
        stream_id: impl Into<String>,
        name: impl Into<String>,
    ) -> ScalarStateCell<'_, T> {
        ScalarStateCell::new(self.store(), StateKey::new(stream_id, name))
            .with_encoding(self.encoding)
    }

    /// Cell whose empty reads call `factory`
    pub fn scalar_with_default<'a, T: StateValue + 'a>(
        &'a self,
        stream_id: impl Into<String>,
        name: impl Into<String>,
        factory: impl Fn() -> T + 'a,
    ) -> ScalarStateCell<'a, T> {
        ScalarStateCell::with_default(self.store(), StateKey::new(stream_id, name), factory)
            .with_encoding(self.encoding)
    }

    /// Cell whose empty reads return `T::default()`
    pub fn scalar_or_default<'a, T: StateValue + Default + 'a>(
        &'a self,
        stream_id: impl Into<String>,
        name: impl Into<String>,
    ) -> ScalarStateCell<'a, T> {
        ScalarStateCell::with_type_default(self.store(), StateKey::new(stream_id, name))
            .with_encoding(self.encoding)
    }

    // =========================================================================
    // Store
    // =========================================================================

    /// The underlying store.
    pub fn store(&self) -> &dyn StateStore {
        match &self.backend {
            Backend::Memory(store) => store as &dyn StateStore,
            Backend::File(store) => store as &dyn StateStore,
        }
    }

    /// Force an fsync of every commit so far.
    ///
    /// In batched mode commits are synced in groups. Call `sync()` to make
    /// sure all of them are on disk. No-op for ephemeral stores.
    pub fn sync(&self) -> Result<()> {
        match &self.backend {
            Backend::Memory(_) => Ok(()),
            Backend::File(store) => store.sync().map_err(Into::into),
        }
    }

    /// Rewrite the commit log with one record per key.
    pub fn compact(&self) -> Result<()> {
        match &self.backend {
            Backend::Memory(_) => Ok(()),
            Backend::File(store) => store.compact().map_err(Into::into),
        }
    }

    /// Path of the commit log, `None` for ephemeral stores.
    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::Memory(_) => None,
            Backend::File(store) => Some(store.path()),
        }
    }

    /// Check if this is an ephemeral (no-disk) store.
    pub fn is_ephemeral(&self) -> bool {
        matches!(self.backend, Backend::Memory(_))
    }

    /// Encoding used by cells created from this store.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Current durability mode.
    pub fn durability_mode(&self) -> DurabilityMode {
        match &self.backend {
            Backend::Memory(_) => DurabilityMode::None,
            Backend::File(store) => store.options().durability,
        }
    }

    /// What recovery found when the store was opened.
    pub fn recovery(&self) -> Option<&RecoveryResult> {
        match &self.backend {
            Backend::Memory(_) => None,
            Backend::File(store) => Some(store.recovery()),
        }
    }
}

impl std::fmt::Debug for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamState")
            .field("path", &self.path())
            .field("durability", &self.durability_mode())
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// Builder for store configuration.
///
/// # Example
///
/// ```ignore
/// // Production: every checkpoint fsynced
/// let state = StreamState::builder()
///     .path("./state/orders.log")
///     .strict()
///     .open()?;
///
/// // Tests: no path means no disk at all
/// let state = StreamState::builder().open()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamStateBuilder {
    path: Option<PathBuf>,
    options: FileStoreOptions,
    encoding: Encoding,
}

impl StreamStateBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the commit log path.
    ///
    /// Without a path the store is ephemeral.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the durability mode.
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.options.durability = mode;
        self
    }

    /// Use no-durability mode: commits stay in memory, no log is written.
    pub fn no_durability(self) -> Self {
        self.durability(DurabilityMode::None)
    }

    /// Use batched mode (default).
    ///
    /// Default sync interval: 100ms or 1000 commits.
    pub fn buffered(self) -> Self {
        self.durability(DurabilityMode::buffered_default())
    }

    /// Use batched mode with custom parameters.
    ///
    /// # Arguments
    ///
    /// * `interval_ms` - Maximum time between fsyncs
    /// * `batch_size` - Maximum commits before a forced fsync
    pub fn buffered_with(self, interval_ms: u64, batch_size: usize) -> Self {
        self.durability(DurabilityMode::Batched {
            interval_ms,
            batch_size,
        })
    }

    /// Use strict mode: fsync every commit.
    ///
    /// Recovery options are left alone, so a torn tail left by a crash is
    /// still cut off on open. Pass [`RecoveryOptions::strict`] to
    /// [`recovery`](Self::recovery) to refuse any damage instead.
    pub fn strict(self) -> Self {
        self.durability(DurabilityMode::Strict)
    }

    /// Set how damage found in the log on open is handled.
    pub fn recovery(mut self, recovery: RecoveryOptions) -> Self {
        self.options.recovery = recovery;
        self
    }

    /// Set the value encoding for cells.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Open the store.
    pub fn open(self) -> Result<StreamState> {
        let backend = match &self.path {
            None => Backend::Memory(MemoryStore::new()),
            Some(path) => Backend::File(FileStore::open(path, self.options.clone())?),
        };
        let state = StreamState {
            backend,
            encoding: self.encoding,
        };
        info!(
            path = ?state.path(),
            encoding = state.encoding.name(),
            durability = state.durability_mode().description(),
            "streamstate opened"
        );
        Ok(state)
    }
}
