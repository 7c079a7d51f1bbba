//! Cache Port - Optional result cache for cacheable tools.
//!
//! The executor consults the cache outside the resilience stack: a hit
//! short-circuits before bulkhead admission. Keys are derived from the
//! tool name and a digest of the input document.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

/// Errors from cache operations.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The backing cache rejected or failed the operation.
    #[error("cache failure: {0}")]
    Storage(String),
}

/// Port for tool-result caching with optional TTL.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the cached value for a key, if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, CacheError>;

    /// Stores a value under a key with an optional time-to-live.
    async fn set(&self, key: &str, value: JsonValue, ttl: Option<Duration>)
        -> Result<(), CacheError>;

    /// Removes a key.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Returns true if the key is present and not expired.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Removes every key.
    async fn clear(&self) -> Result<(), CacheError>;
}
