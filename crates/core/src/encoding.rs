//! Value encodings
//!
//! The store treats values as opaque [`RawValue`] bytes. `Encoding` is the
//! only place that knows how a typed value becomes bytes and back.

use crate::error::CodecError;
use crate::types::RawValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Wire encoding for cell values
///
/// | Encoding | Crate | Notes |
/// |----------|-------|-------|
/// | MessagePack | rmp-serde | Default. Compact, struct fields by name |
/// | Json | serde_json | Human readable, larger |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// MessagePack with named struct fields
    #[default]
    MessagePack,
    /// JSON
    Json,
}

impl Encoding {
    /// Short name used in error messages and configuration
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::MessagePack => "msgpack",
            Encoding::Json => "json",
        }
    }

    /// Encode a value
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<RawValue, CodecError> {
        let bytes = match self {
            Encoding::MessagePack => {
                rmp_serde::to_vec_named(value).map_err(|e| self.encode_error(e))?
            }
            Encoding::Json => serde_json::to_vec(value).map_err(|e| self.encode_error(e))?,
        };
        Ok(RawValue::from_bytes(bytes))
    }

    /// Decode a value
    pub fn decode<T: DeserializeOwned>(&self, raw: &RawValue) -> Result<T, CodecError> {
        match self {
            Encoding::MessagePack => {
                rmp_serde::from_slice(raw.as_bytes()).map_err(|e| self.decode_error(e))
            }
            Encoding::Json => {
                serde_json::from_slice(raw.as_bytes()).map_err(|e| self.decode_error(e))
            }
        }
    }

    fn encode_error(&self, e: impl std::fmt::Display) -> CodecError {
        CodecError::Encode {
            encoding: self.name(),
            message: e.to_string(),
        }
    }

    fn decode_error(&self, e: impl std::fmt::Display) -> CodecError {
        CodecError::Decode {
            encoding: self.name(),
            message: e.to_string(),
        }
    }
}
