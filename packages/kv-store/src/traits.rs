//! Core trait for the storage adapter.

/// A string key/value store.
///
/// This is the whole storage contract the virtual filesystem relies on.
/// Implementations must accept any key, including empty strings and keys
/// containing separators, and must never panic or fail: backend problems are
/// absorbed by the implementation.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn KvStore>`.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Returns
    ///
    /// * `None` - Nothing is stored under the key (not an error condition).
    /// * `Some(value)` - The most recently written value.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str);

    /// Remove `key`. Removing a missing key is a no-op.
    fn remove(&mut self, key: &str);
}

// Blanket implementations for references and boxes

impl<T: KvStore + ?Sized> KvStore for &mut T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key)
    }
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        self.as_ref().get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.as_mut().set(key, value)
    }

    fn remove(&mut self, key: &str) {
        self.as_mut().remove(key)
    }
}
