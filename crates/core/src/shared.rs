//! Alias-mutable state values
//!
//! `Shared<T>` is a cloneable handle to one `T`. Every clone sees the same
//! content, so a caller can keep a handle obtained from a cell and mutate it
//! in place. Cells holding a `Shared<T>` are reference-like and capture such
//! mutation at flush time.

use crate::mutability::StateValue;
use parking_lot::{Mutex, MutexGuard};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Shared, interior-mutable value
///
/// # Examples
///
/// ```
/// use streamstate_core::Shared;
///
/// let seen = Shared::new(vec![1, 2]);
/// let alias = seen.clone();
/// alias.lock().push(3);
/// assert_eq!(seen.snapshot(), vec![1, 2, 3]);
/// ```
pub struct Shared<T>(Arc<Mutex<T>>);

impl<T> Shared<T> {
    /// Wrap a value
    pub fn new(value: T) -> Self {
        Shared(Arc::new(Mutex::new(value)))
    }

    /// Lock the content for reading or in-place mutation
    ///
    /// The lock is not reentrant. Serializing, comparing or formatting a
    /// handle locks it too, so drop the guard before flushing a cell that
    /// holds this value or the flush deadlocks.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock()
    }

    /// Run a closure against the content
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.lock())
    }

    /// Replace the content, returning the previous one
    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.0.lock(), value)
    }

    /// Check if two handles alias the same content
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Shared<T> {
    /// Copy of the current content
    pub fn snapshot(&self) -> T {
        self.0.lock().clone()
    }
}

impl<T> Clone for Shared<T> {
    /// Clones alias; they do not copy the content
    fn clone(&self) -> Self {
        Shared(Arc::clone(&self.0))
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Shared::new(T::default())
    }
}

impl<T: PartialEq> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        *self.0.lock() == *other.0.lock()
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&*self.0.lock()).finish()
    }
}

impl<T: Serialize> Serialize for Shared<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.lock().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Shared<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Shared::new)
    }
}

impl<T: Serialize + DeserializeOwned> StateValue for Shared<T> {}
