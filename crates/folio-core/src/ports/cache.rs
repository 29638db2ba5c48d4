//! Cache port - backs the rendered-page cache.

use async_trait::async_trait;
use std::time::Duration;

/// String key/value cache with per-entry expiry (Redis, in-memory).
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a live value. Expired entries read as absent.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value, expiring after `ttl` when given.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn exists(&self, key: &str) -> bool;

    /// Drop every entry under `prefix`.
    async fn clear_prefix(&self, prefix: &str) -> Result<(), CacheError>;
}

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
