//! Namespace cache keyed by cluster and namespace.

use dashmap::DashMap;

use crate::loader::ConfigHandle;
use crate::observability::metrics;

/// Joins cluster and namespace into a cache key.
pub const CLUSTER_NAMESPACE_SEPARATOR: &str = "+";

pub fn cache_key(cluster: &str, namespace: &str) -> String {
    format!("{}{}{}", cluster, CLUSTER_NAMESPACE_SEPARATOR, namespace)
}

/// A thread-safe map of cache key -> loader handle.
#[derive(Debug, Default)]
pub struct ConfigCache {
    entries: DashMap<String, ConfigHandle>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<ConfigHandle> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Insert or overwrite, returning the displaced handle.
    pub fn insert(&self, key: String, handle: ConfigHandle) -> Option<ConfigHandle> {
        let displaced = self.entries.insert(key, handle);
        metrics::record_cache_size(self.entries.len());
        displaced
    }

    pub fn remove(&self, key: &str) -> Option<ConfigHandle> {
        let removed = self.entries.remove(key).map(|(_, handle)| handle);
        metrics::record_cache_size(self.entries.len());
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone out every handle so callers can await without holding shard locks.
    pub fn snapshot(&self) -> Vec<ConfigHandle> {
        self.entries.iter().map(|entry| entry.value().clone()).collect()
    }
}
