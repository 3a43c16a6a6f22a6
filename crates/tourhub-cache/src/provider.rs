//! Cache manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use tourhub_core::config::cache::CacheConfig;
use tourhub_core::error::AppError;
use tourhub_core::result::AppResult;
use tourhub_core::traits::cache::CacheProvider;

/// Cache manager wrapping the provider selected by configuration.
#[derive(Debug, Clone)]
pub struct CacheManager {
    inner: Arc<dyn CacheProvider>,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn CacheProvider> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis cache provider");
                Arc::new(crate::redis::RedisCacheProvider::connect(&config.redis).await?)
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory cache provider");
                Arc::new(crate::memory::MemoryCacheProvider::new(&config.memory))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Wrap an existing provider.
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self { inner: provider }
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        self.inner.incr(key).await
    }

    async fn decr(&self, key: &str) -> AppResult<i64> {
        self.inner.decr(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        self.inner.expire(key, ttl).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_provider_is_configuration_error() {
        let config = CacheConfig {
            provider: "memcached".to_string(),
            ..CacheConfig::default()
        };
        let err = CacheManager::new(&config).await.unwrap_err();
        assert_eq!(err.kind, tourhub_core::error::ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_memory_provider_roundtrip() {
        let manager = CacheManager::new(&CacheConfig::default()).await.unwrap();
        assert_eq!(manager.incr("k").await.unwrap(), 1);
        assert!(manager.health_check().await.unwrap());
    }
}
