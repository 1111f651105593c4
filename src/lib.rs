//! # cache-contract
//!
//! A small key/value cache contract with interchangeable backends.
//!
//! ## Features
//!
//! - **One contract:** application code depends on the [`Cache`] trait only
//! - **Redis backend:** [`RedisCache`] on a pooled async connection (feature `redis`)
//! - **In-memory backend:** [`InMemoryCache`] for tests and single-process use
//!   (feature `inmemory`, default)
//! - **Programmable mock:** [`MockCache`] serves calls from registered expectations
//! - **Cancellation:** every operation takes a [`Context`] carrying a deadline and a cancel signal
//!
//! ## Quick Start
//!
//! ```
//! use cache_contract::{Cache, Context, Error, InMemoryCache};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cache_contract::Result<()> {
//! let cache = InMemoryCache::new();
//! let ctx = Context::with_timeout(Duration::from_secs(1));
//!
//! cache.set(&ctx, "user:1", "john").await?;
//! cache
//!     .set_with_expiration(&ctx, "session:1", 42, Duration::from_secs(60))
//!     .await?;
//!
//! assert_eq!(cache.get(&ctx, "user:1").await?, "john");
//! assert_eq!(cache.get(&ctx, "session:1").await?, "42");
//!
//! cache.del_with_pattern(&ctx, "user:*").await?;
//! assert_eq!(cache.get(&ctx, "user:1").await, Err(Error::NotFound));
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing against the contract
//!
//! Write caller code generically over `C: Cache` and hand it a [`MockCache`]
//! in tests; see the [`mock`] module for the expectation API.

#[macro_use]
extern crate log;

pub mod backend;
pub mod context;
pub mod error;
pub mod mock;
pub mod pattern;
pub mod value;

// Re-exports for convenience
pub use backend::Cache;
#[cfg(feature = "inmemory")]
pub use backend::InMemoryCache;
#[cfg(feature = "redis")]
pub use backend::{RedisCache, RedisConfig};
pub use context::Context;
pub use error::{Error, Result};
pub use mock::MockCache;
pub use value::Value;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
