//! Error types shared by every cache backend.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned through the [`Cache`](crate::Cache) contract.
///
/// Only two variants travel through normal operation. [`Error::NotFound`] is
/// the one callers routinely branch on. [`Error::BackendError`] covers every
/// other runtime failure.
///
/// The mock backend's defect signals (unmatched calls, unmet expectations)
/// are deliberately *not* variants here; see [`crate::mock`].
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The requested key does not exist (never set, deleted, or expired).
    ///
    /// Only returned by `get`.
    NotFound,

    /// Backend storage error.
    ///
    /// Common causes:
    /// - Redis connection lost or refused
    /// - Protocol or serialization failure
    /// - Operation attempted on a closed cache
    /// - The calling [`Context`](crate::Context) was cancelled or its deadline passed
    ///
    /// Reported as-is: nothing in this crate retries.
    BackendError(String),

    /// Configuration error during backend construction.
    ///
    /// Common causes:
    /// - Unparsable address or database index
    /// - Invalid connection URL
    ConfigError(String),
}

impl Error {
    /// True for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }

    /// Shorthand for building a [`Error::BackendError`].
    pub fn backend(msg: impl Into<String>) -> Self {
        Error::BackendError(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "Key not found"),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::BackendError(format!("Serialization error: {}", e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}
