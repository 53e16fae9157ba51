//! Value-like vs reference-like classification
//!
//! A cell hands out clones of its cached value. For most types a clone is an
//! independent copy, so the only way to change the cell's content is through
//! its setter. Types with shared interior (see [`crate::Shared`]) are
//! different: a clone is an alias, and writes through it change the cached
//! value without the cell seeing them. Such cells re-encode the cached value
//! right before every commit.
//!
//! The classification is a compile-time property of the type:
//!
//! | Type | Mutability |
//! |------|------------|
//! | integers, floats, `bool`, `char`, `String`, `()` | ValueLike |
//! | `Option<T>`, `Vec<T>`, `VecDeque<T>`, `Box<T>` | same as `T` |
//! | `BTreeMap<K, V>`, `HashMap<K, V>` | same as `V` |
//! | `Shared<T>` | ReferenceLike |
//! | anything else implementing [`StateValue`] | ReferenceLike unless overridden |

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::Hash;

/// How a cell can observe changes to its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// Content only changes through explicit assignment
    ValueLike,
    /// Content may change through an alias the cell does not see
    ReferenceLike,
}

impl Mutability {
    /// Check if a flush must re-encode the cached value before committing
    pub fn needs_resync(&self) -> bool {
        matches!(self, Mutability::ReferenceLike)
    }
}

/// A type that can live in a scalar state cell
///
/// Implementing the trait without overriding [`StateValue::MUTABILITY`]
/// classifies the type as reference-like, which is always safe: the only
/// cost is one extra encode per flush.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use streamstate_core::{Mutability, StateValue};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Window {
///     count: u64,
///     sum: f64,
/// }
///
/// // Plain owned data: clones never alias.
/// impl StateValue for Window {
///     const MUTABILITY: Mutability = Mutability::ValueLike;
/// }
/// ```
pub trait StateValue: Serialize + DeserializeOwned + Clone {
    /// Classification used by every cell holding this type
    const MUTABILITY: Mutability = Mutability::ReferenceLike;
}

macro_rules! value_like {
    ($($ty:ty),* $(,)?) => {
        $(
            impl StateValue for $ty {
                const MUTABILITY: Mutability = Mutability::ValueLike;
            }
        )*
    };
}

value_like!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char, String, (),
);

impl<T: StateValue> StateValue for Option<T> {
    const MUTABILITY: Mutability = T::MUTABILITY;
}

impl<T: StateValue> StateValue for Vec<T> {
    const MUTABILITY: Mutability = T::MUTABILITY;
}

impl<T: StateValue> StateValue for VecDeque<T> {
    const MUTABILITY: Mutability = T::MUTABILITY;
}

impl<T: StateValue> StateValue for Box<T> {
    const MUTABILITY: Mutability = T::MUTABILITY;
}

impl<K, V> StateValue for BTreeMap<K, V>
where
    K: Serialize + DeserializeOwned + Clone + Ord,
    V: StateValue,
{
    const MUTABILITY: Mutability = V::MUTABILITY;
}

impl<K, V> StateValue for HashMap<K, V>
where
    K: Serialize + DeserializeOwned + Clone + Eq + Hash,
    V: StateValue,
{
    const MUTABILITY: Mutability = V::MUTABILITY;
}

impl StateValue for serde_json::Value {}
