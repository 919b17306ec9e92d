//! Shared (cross-process) cache contract.
//!
//! The external store (typically Redis) satisfies this contract
//! out-of-process; the in-memory implementation backs tests and
//! single-process deployments. Values are JSON snapshots keyed
//! `config:<name>`.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ConfigResult;

/// Cross-process cache for config snapshots.
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Fetch a value by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache backend fails. A miss is `Ok(None)`.
    async fn get(&self, key: &str) -> ConfigResult<Option<String>>;

    /// Store a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache backend fails.
    async fn set(&self, key: &str, value: String) -> ConfigResult<()>;

    /// Delete a single key.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache backend fails.
    async fn delete(&self, key: &str) -> ConfigResult<()>;

    /// Delete every key with the given prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache backend fails.
    async fn delete_prefix(&self, prefix: &str) -> ConfigResult<()>;
}

/// In-memory shared cache.
///
/// Tracks read counts so cache-discipline tests can assert how many
/// shared reads a code path performed.
#[derive(Debug, Default)]
pub struct MemorySharedCache {
    entries: DashMap<String, String>,
    reads: AtomicUsize,
}

impl MemorySharedCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` calls served so far.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SharedCache for MemorySharedCache {
    async fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.entries.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: String) -> ConfigResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> ConfigResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> ConfigResult<()> {
        self.entries.retain(|k, _| !k.starts_with(prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_delete() {
        let cache = MemorySharedCache::new();
        assert_eq!(cache.get("config:llm").await.unwrap(), None);

        cache.set("config:llm", "{}".to_string()).await.unwrap();
        assert_eq!(cache.get("config:llm").await.unwrap().as_deref(), Some("{}"));

        cache.delete("config:llm").await.unwrap();
        assert_eq!(cache.get("config:llm").await.unwrap(), None);
        assert_eq!(cache.read_count(), 3);
    }

    #[tokio::test]
    async fn test_delete_prefix() {
        let cache = MemorySharedCache::new();
        cache
            .set("config:task/booking", "a".to_string())
            .await
            .unwrap();
        cache
            .set("config:task/meeting", "b".to_string())
            .await
            .unwrap();
        cache.set("other:key", "c".to_string()).await.unwrap();

        cache.delete_prefix("config:").await.unwrap();
        assert_eq!(cache.get("config:task/booking").await.unwrap(), None);
        assert_eq!(cache.get("other:key").await.unwrap().as_deref(), Some("c"));
    }
}
