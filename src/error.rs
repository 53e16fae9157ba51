//! Unified error type for streamstate.
//!
//! Wraps the per-crate errors so callers of the facade handle one type.

use streamstate_core::{CellError, CodecError, StoreError};
use thiserror::Error;

/// All streamstate errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Cell is empty, the store holds nothing and no default factory exists
    #[error("no value for {0} and no default factory")]
    NoDefault(String),

    /// Value could not be encoded or decoded
    #[error("codec error: {0}")]
    Codec(String),

    /// Commit could not be made durable
    #[error("commit failed: {0}")]
    CommitFailed(String),

    /// Store contents are damaged beyond the recovery limits
    #[error("corruption: {0}")]
    Corruption(String),

    /// Store cannot serve requests
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for streamstate operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// A failed flush leaves the cell dirty, so retrying commits the same
    /// value.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::CommitFailed(_) | Error::Unavailable(_) | Error::Io(_)
        )
    }

    /// Check if this is the empty-cell error.
    pub fn is_no_default(&self) -> bool {
        matches!(self, Error::NoDefault(_))
    }

    /// Check if this is a serious/unrecoverable error.
    pub fn is_serious(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io(io_err) => Error::Io(io_err),
            StoreError::Corruption(msg) => Error::Corruption(msg),
            StoreError::CommitFailed { key, reason } => {
                Error::CommitFailed(format!("{}: {}", key, reason))
            }
            StoreError::Unavailable(msg) => Error::Unavailable(msg),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Codec(e.to_string())
    }
}

impl From<CellError> for Error {
    fn from(e: CellError) -> Self {
        match e {
            CellError::NoDefault { key } => Error::NoDefault(key.to_string()),
            CellError::Store(store_err) => store_err.into(),
            CellError::Codec { key, source } => Error::Codec(format!("{}: {}", key, source)),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
