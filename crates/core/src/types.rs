//! Identity and payload types
//!
//! - [`StateKey`]: which cell, `stream_id/name`
//! - [`RawValue`]: what a store holds for it

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a scalar state cell
///
/// A cell is scoped to a stream and named within it. Two cells with the same
/// name on different streams never share storage.
///
/// # Examples
///
/// ```
/// use streamstate_core::StateKey;
///
/// let key = StateKey::new("sensor-7", "running_total");
/// assert_eq!(key.to_string(), "sensor-7/running_total");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    /// Stream the state belongs to
    pub stream_id: String,
    /// Name of the state within the stream
    pub name: String,
}

impl StateKey {
    /// Create a new key
    pub fn new(stream_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for StateKey {
    /// Display key in the format: stream_id/name
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.stream_id, self.name)
    }
}

/// Encoded value as held by a store
///
/// Stores never look inside a `RawValue`; only [`crate::Encoding`] does.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawValue(Vec<u8>);

impl RawValue {
    /// Wrap already-encoded bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        RawValue(bytes)
    }

    /// Borrow the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Encoded length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length payload
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(bytes: Vec<u8>) -> Self {
        RawValue(bytes)
    }
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 16;
        write!(f, "RawValue({} bytes: ", self.0.len())?;
        for byte in self.0.iter().take(PREVIEW) {
            write!(f, "{:02x}", byte)?;
        }
        if self.0.len() > PREVIEW {
            write!(f, "..")?;
        }
        write!(f, ")")
    }
}
