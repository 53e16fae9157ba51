//! Core types for streamstate
//!
//! This crate defines the vocabulary shared by every other crate:
//! - [`StateKey`]: identity of a cell, `(stream_id, name)`
//! - [`RawValue`]: opaque encoded bytes held by a store
//! - [`Encoding`]: `T <-> RawValue` conversion
//! - [`StateValue`] / [`Mutability`]: value-like vs reference-like classification
//! - [`Shared`]: alias-mutable wrapper, the canonical reference-like value
//! - [`StateStore`]: the narrow store contract a cell talks to
//! - Error taxonomy: [`StoreError`], [`CodecError`], [`CellError`], [`HookError`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod error;
pub mod mutability;
pub mod shared;
pub mod traits;
pub mod types;

pub use encoding::Encoding;
pub use error::{CellError, CodecError, HookError, HookKind, Result, StoreError, StoreResult};
pub use mutability::{Mutability, StateValue};
pub use shared::Shared;
pub use traits::StateStore;
pub use types::{RawValue, StateKey};
