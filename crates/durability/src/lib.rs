//! Durability layer for streamstate
//!
//! This crate implements the file-backed state store:
//! - FileStore: staged values in memory, commits appended to a log
//! - WalRecord / CommitLog: one record per committed value
//! - Frame encoding with CRC32 checksums
//! - Recovery: replay the log on open, skipping damage within limits

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod file_store;
pub mod recovery;
pub mod wal;

pub use file_store::{FileStore, FileStoreOptions};
pub use recovery::{RecoveryOptions, RecoveryResult};
pub use wal::{CommitLog, WalRecord};
