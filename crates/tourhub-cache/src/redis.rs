//! Redis cache provider.
//!
//! Keys are prefixed with the configured namespace. `INCR` is atomic on the
//! server, which makes this the provider to use when several engine
//! instances share quotas.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use tourhub_core::config::cache::RedisCacheConfig;
use tourhub_core::error::{AppError, ErrorKind};
use tourhub_core::result::AppResult;
use tourhub_core::traits::cache::CacheProvider;

/// Redis-backed cache provider over a reconnecting connection manager.
#[derive(Clone)]
pub struct RedisCacheProvider {
    conn: ConnectionManager,
    key_prefix: String,
}

impl std::fmt::Debug for RedisCacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheProvider")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisCacheProvider {
    /// Connect to Redis using the given configuration.
    pub async fn connect(config: &RedisCacheConfig) -> AppResult<Self> {
        info!(url = %mask_redis_url(&config.url), "Connecting to Redis");

        let client = Client::open(config.url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Cache, "Failed to create Redis client", e)
        })?;
        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::with_source(ErrorKind::Cache, "Failed to connect to Redis", e)
        })?;

        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Cache, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(self.key(key)).await.map_err(Self::map_err)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(self.key(key), value, ttl.as_secs().max(1))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.key(key)).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        let mut conn = self.conn.clone();
        conn.incr(self.key(key), 1i64).await.map_err(Self::map_err)
    }

    async fn decr(&self, key: &str) -> AppResult<i64> {
        let mut conn = self.conn.clone();
        conn.decr(self.key(key), 1i64).await.map_err(Self::map_err)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        conn.expire(self.key(key), ttl.as_secs().max(1) as i64)
            .await
            .map_err(Self::map_err)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}

/// Mask the password in a Redis URL for logging.
fn mask_redis_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => {
            let userinfo = &url[scheme + 3..at];
            match userinfo.find(':') {
                Some(colon) => format!(
                    "{}{}:****{}",
                    &url[..scheme + 3],
                    &userinfo[..colon],
                    &url[at..]
                ),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_redis_url() {
        assert_eq!(
            mask_redis_url("redis://:hunter2@cache:6379/0"),
            "redis://:****@cache:6379/0"
        );
        assert_eq!(mask_redis_url("redis://cache:6379"), "redis://cache:6379");
    }
}
