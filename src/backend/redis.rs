//! Redis cache backend implementation.
//!
//! Each contract operation maps onto a single Redis command; `del_with_pattern`
//! maps onto `KEYS` followed by `DEL`. The backend adds no locking of its own:
//! concurrency is delegated to the deadpool connection pool.

use super::Cache;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::value::Value;
use deadpool_redis::{redis::AsyncCommands, Config as PoolConfig, Connection, Pool, Runtime};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::time::Duration;

/// Default Redis connection pool size.
/// Override with REDIS_POOL_SIZE environment variable
const DEFAULT_POOL_SIZE: usize = 16;

/// Default address used when `REDIS_ADDRESS` is unset.
const DEFAULT_ADDR: &str = "localhost:6379";

/// Connection settings for [`RedisCache`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RedisConfig {
    /// Server address in `host:port` form.
    pub addr: String,
    /// Password for `AUTH`; `None` connects without authentication.
    #[serde(default)]
    pub password: Option<String>,
    /// Logical database index.
    #[serde(default)]
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            addr: DEFAULT_ADDR.to_string(),
            password: None,
            db: 0,
        }
    }
}

impl RedisConfig {
    /// Load configuration from the environment.
    ///
    /// # Environment Variables
    /// - `REDIS_ADDRESS` - `host:port` (default: `localhost:6379`)
    /// - `REDIS_PASSWORD` - password; empty means no authentication
    /// - `REDIS_DB` - database index (default: 0)
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if `REDIS_DB` is not an integer.
    pub fn from_env() -> Result<Self> {
        let addr = std::env::var("REDIS_ADDRESS")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let password = std::env::var("REDIS_PASSWORD")
            .ok()
            .filter(|s| !s.is_empty());
        let db = match std::env::var("REDIS_DB") {
            Ok(raw) if !raw.is_empty() => raw
                .parse::<i64>()
                .map_err(|e| Error::ConfigError(format!("invalid REDIS_DB {:?}: {}", raw, e)))?,
            _ => 0,
        };

        Ok(RedisConfig { addr, password, db })
    }

    /// Build Redis connection string.
    ///
    /// The password is percent-encoded so reserved characters like `@` or `/` survive URL parsing.
    pub fn connection_string(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}/{}",
                utf8_percent_encode(password, NON_ALPHANUMERIC),
                self.addr,
                self.db
            ),
            None => format!("redis://{}/{}", self.addr, self.db),
        }
    }
}

/// Pool size from `REDIS_POOL_SIZE`, falling back to [`DEFAULT_POOL_SIZE`].
fn pool_size_from_env() -> usize {
    std::env::var("REDIS_POOL_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_POOL_SIZE)
}

/// `PX` argument for a positive expiration: whole milliseconds, at least 1.
fn expiration_millis(expiration: Duration) -> u64 {
    let millis = u64::try_from(expiration.as_millis()).unwrap_or(u64::MAX);
    millis.max(1)
}

/// Redis-backed implementation of the [`Cache`] contract.
///
/// Uses deadpool for async connection pooling.
///
/// # Example
///
/// ```no_run
/// # use cache_contract::backend::{Cache, RedisCache, RedisConfig};
/// # use cache_contract::{Context, Result};
/// # async fn example() -> Result<()> {
/// let cache = RedisCache::new(RedisConfig::from_env()?).await?;
/// let ctx = Context::background();
///
/// cache.set(&ctx, "user:1", "john").await?;
/// let value = cache.get(&ctx, "user:1").await?;
/// cache.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    /// Connect to Redis and verify the connection with `PING`.
    ///
    /// # Errors
    /// - `Error::ConfigError` if the pool cannot be built from `config`
    /// - `Error::BackendError` if the server is unreachable or rejects `PING`
    pub async fn new(config: RedisConfig) -> Result<Self> {
        Self::from_connection_string(&config.connection_string()).await
    }

    /// Create from a `redis://` connection string directly.
    ///
    /// # Errors
    /// Same as [`RedisCache::new`].
    pub async fn from_connection_string(conn_str: &str) -> Result<Self> {
        let pool_size = pool_size_from_env();

        let mut cfg = PoolConfig::from_url(conn_str);
        cfg.pool = Some(deadpool_redis::PoolConfig::new(pool_size));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::ConfigError(format!("Failed to create Redis pool: {}", e)))?;

        let cache = RedisCache { pool };
        cache.ping(&Context::background()).await?;

        info!("✓ Redis cache initialized (pool size: {})", pool_size);
        Ok(cache)
    }

    async fn connection(&self, ctx: &Context) -> Result<Connection> {
        ctx.run(self.pool.get())
            .await?
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }

    async fn ping(&self, ctx: &Context) -> Result<()> {
        let mut conn = self.connection(ctx).await?;

        let pong: String = ctx
            .run(deadpool_redis::redis::cmd("PING").query_async(&mut *conn))
            .await?
            .map_err(|e| Error::BackendError(format!("Redis PING failed: {}", e)))?;

        if pong.contains("PONG") {
            Ok(())
        } else {
            Err(Error::BackendError(format!(
                "Redis PING returned unexpected reply: {}",
                pong
            )))
        }
    }
}

impl Cache for RedisCache {
    async fn is_connected(&self, ctx: &Context) -> bool {
        match self.ping(ctx).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Redis connectivity check failed: {}", e);
                false
            }
        }
    }

    async fn get(&self, ctx: &Context, key: &str) -> Result<String> {
        let mut conn = self.connection(ctx).await?;

        let value: Option<String> = ctx
            .run(conn.get::<_, Option<String>>(key))
            .await?
            .map_err(|e| Error::BackendError(format!("Redis GET failed for key {}: {}", key, e)))?;

        match value {
            Some(value) => {
                debug!("✓ Redis GET {} -> HIT", key);
                Ok(value)
            }
            None => {
                debug!("✓ Redis GET {} -> MISS", key);
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
        let payload = value.into().to_bytes();
        let mut conn = self.connection(ctx).await?;

        let mut command = deadpool_redis::redis::cmd("SET");
        command.arg(key).arg(payload);
        if !expiration.is_zero() {
            command.arg("PX").arg(expiration_millis(expiration));
        }

        ctx.run(command.query_async::<()>(&mut *conn))
            .await?
            .map_err(|e| Error::BackendError(format!("Redis SET failed for key {}: {}", key, e)))?;

        if expiration.is_zero() {
            debug!("✓ Redis SET {}", key);
        } else {
            debug!("✓ Redis SET {} (TTL: {:?})", key, expiration);
        }
        Ok(())
    }

    async fn del(&self, ctx: &Context, keys: &[&str]) -> Result<()> {
        if keys.is_empty() {
            debug!("✓ Redis DEL with no keys skipped");
            return Ok(());
        }

        let mut conn = self.connection(ctx).await?;

        ctx.run(conn.del::<_, ()>(keys))
            .await?
            .map_err(|e| Error::BackendError(format!("Redis DEL failed: {}", e)))?;

        debug!("✓ Redis DEL {} keys", keys.len());
        Ok(())
    }

    async fn keys(&self, ctx: &Context, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection(ctx).await?;

        let keys: Vec<String> = ctx
            .run(
                deadpool_redis::redis::cmd("KEYS")
                    .arg(pattern)
                    .query_async(&mut *conn),
            )
            .await?
            .map_err(|e| {
                Error::BackendError(format!("Redis KEYS failed for pattern {}: {}", pattern, e))
            })?;

        debug!("✓ Redis KEYS {} -> {} keys", pattern, keys.len());
        Ok(keys)
    }

    async fn close(&self) -> Result<()> {
        if !self.pool.is_closed() {
            self.pool.close();
            info!("Redis cache closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config_default() {
        let config = RedisConfig::default();
        assert_eq!(config.addr, "localhost:6379");
        assert_eq!(config.password, None);
        assert_eq!(config.db, 0);
    }

    #[test]
    fn test_redis_config_no_auth() {
        let config = RedisConfig::default();
        assert_eq!(config.connection_string(), "redis://localhost:6379/0");
    }

    #[test]
    fn test_redis_config_with_password_and_db() {
        let config = RedisConfig {
            addr: "cache.internal:6380".to_string(),
            password: Some("secret".to_string()),
            db: 3,
        };

        assert_eq!(
            config.connection_string(),
            "redis://:secret@cache.internal:6380/3"
        );
    }

    #[test]
    fn test_redis_config_password_is_percent_encoded() {
        let config = RedisConfig {
            addr: "h:6379".to_string(),
            password: Some("p@ss/w#rd".to_string()),
            db: 0,
        };
        assert_eq!(config.connection_string(), "redis://:p%40ss%2Fw%23rd@h:6379/0");
    }

    #[test]
    fn test_redis_config_deserialize_defaults() {
        let config: RedisConfig =
            serde_json::from_str(r#"{"addr":"localhost:6379"}"#).expect("valid config");
        assert_eq!(config, RedisConfig::default());
    }

    #[test]
    fn test_expiration_millis() {
        assert_eq!(expiration_millis(Duration::from_millis(100)), 100);
        assert_eq!(expiration_millis(Duration::from_secs(2)), 2000);
        assert_eq!(expiration_millis(Duration::from_micros(10)), 1);
    }

    #[tokio::test]
    async fn test_redis_unreachable_fails_at_construction() {
        let config = RedisConfig {
            addr: "127.0.0.1:1".to_string(),
            password: None,
            db: 0,
        };

        let result = RedisCache::new(config).await;
        assert!(matches!(result, Err(Error::BackendError(_))));
    }
}
