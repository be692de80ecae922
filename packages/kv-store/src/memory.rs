//! Process-local key/value store.

use std::collections::BTreeMap;

use crate::KvStore;

/// An in-memory store that lives as long as the process.
///
/// This is the fallback used whenever a persistent backend is unavailable,
/// and the natural choice for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with initial data.
    pub fn with_data<K, V>(data: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: data
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over stored keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(|k| k.as_str())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.data.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.data.remove(key);
    }
}
