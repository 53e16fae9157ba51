//! Error types for streamstate
//!
//! Layering:
//! - [`StoreError`]: anything a [`crate::StateStore`] reports
//! - [`CodecError`]: `T <-> RawValue` conversion failures
//! - [`CellError`]: what cell operations return
//! - [`HookError`]: a failed flush hook; logged and counted, never returned

use crate::types::StateKey;
use std::fmt;
use thiserror::Error;

/// Errors reported by a state store
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from the durable medium
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data failed validation
    #[error("corruption: {0}")]
    Corruption(String),

    /// Commit of a single key failed
    #[error("commit failed for {key}: {reason}")]
    CommitFailed {
        /// Key being committed
        key: StateKey,
        /// Why the commit failed
        reason: String,
    },

    /// Store cannot serve requests (closed, poisoned, injected fault)
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors converting between a typed value and a [`crate::RawValue`]
#[derive(Debug, Error)]
pub enum CodecError {
    /// Value could not be encoded
    #[error("{encoding} encode failed: {message}")]
    Encode {
        /// Encoding in use
        encoding: &'static str,
        /// Underlying serializer message
        message: String,
    },

    /// Bytes could not be decoded into the requested type
    #[error("{encoding} decode failed: {message}")]
    Decode {
        /// Encoding in use
        encoding: &'static str,
        /// Underlying deserializer message
        message: String,
    },
}

/// Errors returned by scalar state cell operations
#[derive(Debug, Error)]
pub enum CellError {
    /// Cell is empty, the store holds nothing and no default factory exists
    #[error("no value for {key} and no default factory")]
    NoDefault {
        /// Key of the empty cell
        key: StateKey,
    },

    /// Store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Value conversion failed
    #[error("codec error for {key}: {source}")]
    Codec {
        /// Key whose value failed to convert
        key: StateKey,
        /// Underlying codec failure
        #[source]
        source: CodecError,
    },
}

impl CellError {
    /// Check if this is the empty-cell error
    pub fn is_no_default(&self) -> bool {
        matches!(self, CellError::NoDefault { .. })
    }

    /// Check if retrying the same operation may succeed
    ///
    /// Store failures leave cell state untouched, so a retry re-attempts
    /// with the same cached value.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CellError::Store(StoreError::Io(_))
                | CellError::Store(StoreError::CommitFailed { .. })
                | CellError::Store(StoreError::Unavailable(_))
        )
    }
}

/// Which flush hook a [`HookError`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Fired before the commit
    Flushing,
    /// Fired after the commit
    Flushed,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::Flushing => write!(f, "on_flushing"),
            HookKind::Flushed => write!(f, "on_flushed"),
        }
    }
}

/// A caller-supplied flush hook failed
///
/// Hooks observe a flush, they do not take part in it. A failure is isolated:
/// it is logged, counted on the cell, and the flush carries on.
#[derive(Debug, Clone, Error)]
#[error("{hook} hook for {key} failed: {message}")]
pub struct HookError {
    /// Hook that failed
    pub hook: HookKind,
    /// Key of the cell being flushed
    pub key: StateKey,
    /// Panic payload, rendered
    pub message: String,
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for cell operations
pub type Result<T> = std::result::Result<T, CellError>;
