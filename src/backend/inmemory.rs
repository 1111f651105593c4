//! In-memory cache backend (default, thread-safe, async).
//!
//! Uses DashMap for concurrent access with per-key sharding.
//! Expired entries behave as absent and are dropped lazily on access.

use super::Cache;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::pattern;
use crate::value::Value;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// In-memory cache entry with optional expiration.
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, expiration: Duration) -> Self {
        let expires_at = (!expiration.is_zero()).then(|| Instant::now() + expiration);
        CacheEntry { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// Thread-safe in-memory implementation of the [`Cache`] contract.
///
/// Clones share the same store, so a clone handed to another task sees every
/// write. After [`close`](Cache::close) the store is emptied and every
/// operation fails with `Error::BackendError`.
///
/// # Example
///
/// ```no_run
/// use cache_contract::{Cache, Context, InMemoryCache};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cache = InMemoryCache::new();
///     let ctx = Context::background();
///
///     cache.set(&ctx, "user:1", "john").await?;
///     assert_eq!(cache.get(&ctx, "user:1").await?, "john");
///
///     cache
///         .set_with_expiration(&ctx, "session", "data", Duration::from_secs(300))
///         .await?;
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryCache {
    store: Arc<DashMap<String, CacheEntry>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryCache {
    /// Create a new, empty in-memory cache.
    pub fn new() -> Self {
        InMemoryCache {
            store: Arc::new(DashMap::new()),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of stored entries, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get memory statistics.
    pub fn stats(&self) -> CacheStats {
        let total_bytes: usize = self.store.iter().map(|entry| entry.data.len()).sum();
        let expired_count = self.store.iter().filter(|entry| entry.is_expired()).count();

        CacheStats {
            total_entries: self.store.len(),
            expired_entries: expired_count,
            total_bytes,
        }
    }

    fn ensure_open(&self, ctx: &Context) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::backend("cache is closed"));
        }
        ctx.check()
    }

    fn purge_expired(&self) {
        self.store.retain(|_, entry| !entry.is_expired());
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for InMemoryCache {
    async fn is_connected(&self, ctx: &Context) -> bool {
        self.ensure_open(ctx).is_ok()
    }

    async fn get(&self, ctx: &Context, key: &str) -> Result<String> {
        self.ensure_open(ctx)?;

        let hit = self
            .store
            .get(key)
            .and_then(|entry| (!entry.is_expired()).then(|| entry.data.clone()));

        match hit {
            Some(data) => {
                debug!("✓ InMemory GET {} -> HIT", key);
                String::from_utf8(data).map_err(|e| {
                    Error::BackendError(format!("value for key {} is not UTF-8: {}", key, e))
                })
            }
            None => {
                self.store.remove_if(key, |_, entry| entry.is_expired());
                debug!("✓ InMemory GET {} -> MISS", key);
                Err(Error::NotFound)
            }
        }
    }

    async fn set_with_expiration(
        &self,
        ctx: &Context,
        key: &str,
        value: impl Into<Value>,
        expiration: Duration,
    ) -> Result<()> {
        self.ensure_open(ctx)?;

        let entry = CacheEntry::new(value.into().to_bytes(), expiration);
        self.store.insert(key.to_string(), entry);

        if expiration.is_zero() {
            debug!("✓ InMemory SET {}", key);
        } else {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, expiration);
        }

        Ok(())
    }

    async fn del(&self, ctx: &Context, keys: &[&str]) -> Result<()> {
        self.ensure_open(ctx)?;

        for key in keys {
            self.store.remove(*key);
        }

        debug!("✓ InMemory DEL {} keys", keys.len());
        Ok(())
    }

    async fn keys(&self, ctx: &Context, pattern: &str) -> Result<Vec<String>> {
        self.ensure_open(ctx)?;
        self.purge_expired();

        let keys: Vec<String> = self
            .store
            .iter()
            .filter(|entry| pattern::matches(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        debug!("✓ InMemory KEYS {} -> {} keys", pattern, keys.len());
        Ok(keys)
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.store.clear();
            info!("InMemory cache closed");
        }
        Ok(())
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inmemory_set_get() {
        let cache = InMemoryCache::new();
        let ctx = Context::background();

        cache.set(&ctx, "key1", "value1").await.expect("Failed to set");

        let result = cache.get(&ctx, "key1").await.expect("Failed to get");
        assert_eq!(result, "value1");
    }

    #[tokio::test]
    async fn test_inmemory_miss_is_not_found() {
        let cache = InMemoryCache::new();
        let ctx = Context::background();

        let result = cache.get(&ctx, "nonexistent").await;
        assert_eq!(result, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn test_inmemory_del_multiple_and_missing() {
        let cache = InMemoryCache::new();
        let ctx = Context::background();

        cache.set(&ctx, "key1", "value1").await.expect("Failed to set");
        cache.set(&ctx, "key2", "value2").await.expect("Failed to set");
        cache.set(&ctx, "key3", "value3").await.expect("Failed to set");
        assert_eq!(cache.len(), 3);

        cache
            .del(&ctx, &["key1", "key2", "never-set"])
            .await
            .expect("Failed to del");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&ctx, "key1").await, Err(Error::NotFound));
        assert!(cache.get(&ctx, "key3").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_inmemory_ttl_expiration() {
        let cache = InMemoryCache::new();
        let ctx = Context::background();

        cache
            .set_with_expiration(&ctx, "key1", "value1", Duration::from_millis(100))
            .await
            .expect("Failed to set");

        assert_eq!(cache.get(&ctx, "key1").await, Ok("value1".to_string()));

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.get(&ctx, "key1").await, Err(Error::NotFound));
        assert!(cache.is_empty(), "expired entry should be dropped on access");
    }

    #[tokio::test(start_paused = true)]
    async fn test_inmemory_set_clears_previous_ttl() {
        let cache = InMemoryCache::new();
        let ctx = Context::background();

        cache
            .set_with_expiration(&ctx, "key", "short", Duration::from_millis(50))
            .await
            .expect("Failed to set");
        cache.set(&ctx, "key", "forever").await.expect("Failed to set");

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(cache.get(&ctx, "key").await, Ok("forever".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inmemory_keys_skips_expired() {
        let cache = InMemoryCache::new();
        let ctx = Context::background();

        cache.set(&ctx, "key-a", "a").await.expect("Failed to set");
        cache
            .set_with_expiration(&ctx, "key-b", "b", Duration::from_millis(10))
            .await
            .expect("Failed to set");
        cache.set(&ctx, "other", "o").await.expect("Failed to set");

        tokio::time::sleep(Duration::from_millis(20)).await;

        let keys = cache.keys(&ctx, "key*").await.expect("Failed to list keys");
        assert_eq!(keys, vec!["key-a".to_string()]);
    }

    #[tokio::test]
    async fn test_inmemory_close_is_idempotent() {
        let cache = InMemoryCache::new();
        let ctx = Context::background();
        cache.set(&ctx, "key", "value").await.expect("Failed to set");

        assert!(cache.is_connected(&ctx).await);
        cache.close().await.expect("first close");
        cache.close().await.expect("second close");

        assert!(!cache.is_connected(&ctx).await);
        assert!(matches!(
            cache.get(&ctx, "key").await,
            Err(Error::BackendError(_))
        ));
    }

    #[tokio::test]
    async fn test_inmemory_observes_cancelled_context() {
        let cache = InMemoryCache::new();
        let ctx = Context::background();
        ctx.cancel();

        assert!(!cache.is_connected(&ctx).await);
        assert!(matches!(
            cache.set(&ctx, "key", "value").await,
            Err(Error::BackendError(_))
        ));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_inmemory_stats() {
        let cache = InMemoryCache::new();
        let ctx = Context::background();

        cache
            .set(&ctx, "key1", "value_with_data")
            .await
            .expect("Failed to set");
        cache.set(&ctx, "key2", "data").await.expect("Failed to set");

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 0);
        assert_eq!(stats.total_bytes, 19);
    }

    #[tokio::test]
    async fn test_inmemory_clone_shares_store() {
        let cache1 = InMemoryCache::new();
        let ctx = Context::background();
        cache1.set(&ctx, "key", "value").await.expect("Failed to set");

        let cache2 = cache1.clone();
        assert_eq!(cache2.get(&ctx, "key").await, Ok("value".to_string()));
    }

    #[tokio::test]
    async fn test_inmemory_thread_safe() {
        let cache = InMemoryCache::new();
        let mut handles = vec![];

        for i in 0..10 {
            let cache = cache.clone();
            let handle = tokio::spawn(async move {
                let ctx = Context::background();
                let key = format!("key_{}", i);
                let value = format!("value_{}", i);
                cache.set(&ctx, &key, value).await.expect("Failed to set");
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(cache.len(), 10);
    }
}
