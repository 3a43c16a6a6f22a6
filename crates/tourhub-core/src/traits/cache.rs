//! Cache provider trait for pluggable caching backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for cache backends (Redis or in-memory).
///
/// Values are stored as strings. Counters used for rate limiting go through
/// [`CacheProvider::incr`] and [`CacheProvider::decr`], which must be atomic
/// with respect to concurrent callers on the same key.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value with a TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Increment an integer value by 1. Returns the new value.
    async fn incr(&self, key: &str) -> AppResult<i64>;

    /// Decrement an integer value by 1. Returns the new value.
    async fn decr(&self, key: &str) -> AppResult<i64>;

    /// Set the TTL on an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool>;

    /// Check that the cache backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
