//! The cache contract and its store-backed implementations.
//!
//! Every backend, including the programmable [`MockCache`](crate::mock::MockCache),
//! implements [`Cache`]. Application code should be written against the trait and
//! never against a concrete backend type.

use crate::context::Context;
use crate::error::Result;
use crate::value::Value;
use std::time::Duration;

#[cfg(feature = "inmemory")]
pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryCache;
#[cfg(feature = "redis")]
pub use redis::{RedisCache, RedisConfig};

/// Capability set shared by all cache backends.
///
/// **IMPORTANT:** All methods use `&self` so a backend can be shared across tasks.
/// Implementations use interior mutability or an external store.
///
/// **CONTEXT:** Store backends race their I/O against `ctx` and fail with
/// `Error::BackendError` once it is cancelled or past its deadline. The mock
/// backend accepts `ctx` but ignores its state.
///
/// **ERRORS:** Only `get` reports `Error::NotFound`. Everything else fails with
/// `Error::BackendError`. A single failed attempt is returned as-is.
#[allow(async_fn_in_trait)]
pub trait Cache: Send + Sync {
    /// Connectivity check. Never fails: any error is reported as `false`.
    async fn is_connected(&self, ctx: &Context) -> bool;

    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    /// - `Error::NotFound` if the key is absent or expired
    /// - `Error::BackendError` for any other failure
    async fn get(&self, ctx: &Context, key: &str) -> Result<String>;

    /// Store `value` under `key` without expiration.
    ///
    /// Equivalent to `set_with_expiration` with a zero duration; replaces any
    /// existing TTL on the key.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the write fails.
    async fn set(&self, ctx: &Context, key: &str, value: impl Into<Value>) -> Result<()> {
        self.set_with_expiration(ctx, key, value, Duration::ZERO)
            .await
    }

    /// Store `value` under `key`, expiring after `expiration`.
    ///
    /// A zero `expiration` means the key never expires on its own.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the write fails.
    async fn set_with_expiration(
        &self,
        ctx: &Context,
        key: &str,
        value: impl Into<Value>,
        expiration: Duration,
    ) -> Result<()>;

    /// Delete one or more keys. Missing keys are silently ignored.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the delete fails.
    async fn del(&self, ctx: &Context, keys: &[&str]) -> Result<()>;

    /// Delete every key matching the glob `pattern`.
    ///
    /// Runs as two steps: `keys(pattern)`, then `del` of the result. A listing
    /// failure aborts before anything is deleted; an empty listing is a no-op.
    /// The two steps are not atomic: keys written in between may or may not
    /// be removed.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if either step fails.
    async fn del_with_pattern(&self, ctx: &Context, pattern: &str) -> Result<()> {
        let keys = self.keys(ctx, pattern).await?;
        if keys.is_empty() {
            return Ok(());
        }

        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.del(ctx, &refs).await?;
        debug!("✓ DEL pattern {} -> {} keys", pattern, refs.len());
        Ok(())
    }

    /// List keys matching the glob `pattern`, in no particular order.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the listing fails. No match is `Ok(vec![])`.
    async fn keys(&self, ctx: &Context, pattern: &str) -> Result<Vec<String>>;

    /// Release the backend. Safe to call more than once.
    ///
    /// Later operations may fail with `Error::BackendError`.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if releasing resources fails.
    async fn close(&self) -> Result<()>;
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Caller code written once against the contract.
    async fn fetch_or_default<C: Cache>(cache: &C, ctx: &Context, key: &str) -> Result<String> {
        match cache.get(ctx, key).await {
            Ok(value) => Ok(value),
            Err(Error::NotFound) => Ok("default".to_string()),
            Err(e) => Err(e),
        }
    }

    #[tokio::test]
    async fn test_contract_caller_is_backend_agnostic() {
        let cache = InMemoryCache::new();
        let ctx = Context::background();

        assert_eq!(
            fetch_or_default(&cache, &ctx, "missing").await,
            Ok("default".to_string())
        );

        cache.set(&ctx, "present", "here").await.expect("Failed to set");
        assert_eq!(
            fetch_or_default(&cache, &ctx, "present").await,
            Ok("here".to_string())
        );
    }

    #[tokio::test]
    async fn test_default_del_with_pattern_empty_is_noop() {
        let cache = InMemoryCache::new();
        let ctx = Context::background();

        cache.set(&ctx, "keep", 1).await.expect("Failed to set");
        cache
            .del_with_pattern(&ctx, "nothing:*")
            .await
            .expect("Empty pattern delete should succeed");
        assert_eq!(cache.get(&ctx, "keep").await, Ok("1".to_string()));
    }
}
