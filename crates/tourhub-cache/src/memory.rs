//! In-memory cache implementation using the moka crate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;

use tourhub_core::config::cache::MemoryCacheConfig;
use tourhub_core::result::AppResult;
use tourhub_core::traits::cache::CacheProvider;

/// Expiry policy reading the TTL stored beside each value.
struct PerEntryTtl;

impl Expiry<String, (String, Duration)> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &(String, Duration),
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.1)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &(String, Duration),
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.1)
    }
}

#[derive(Debug)]
struct Counter {
    value: i64,
    expires_at: Option<Instant>,
}

impl Counter {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-memory cache provider using moka.
///
/// Counters live in a separate map so `incr`/`decr` are atomic per key; an
/// expired counter restarts from zero on its next increment.
#[derive(Clone)]
pub struct MemoryCacheProvider {
    cache: Cache<String, (String, Duration)>,
    counters: Arc<DashMap<String, Counter>>,
}

impl std::fmt::Debug for MemoryCacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheProvider")
            .field("entries", &self.cache.entry_count())
            .field("counters", &self.counters.len())
            .finish()
    }
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            counters: Arc::new(DashMap::new()),
        }
    }

    fn add(&self, key: &str, delta: i64) -> i64 {
        let now = Instant::now();
        let mut counter = self.counters.entry(key.to_string()).or_insert(Counter {
            value: 0,
            expires_at: None,
        });
        if !counter.is_live(now) {
            counter.value = 0;
            counter.expires_at = None;
        }
        counter.value += delta;
        counter.value
    }

    /// Drop counters whose TTL has passed.
    fn purge_expired_counters(&self) {
        let now = Instant::now();
        self.counters.retain(|_, c| c.is_live(now));
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        let counter = self
            .counters
            .get(key)
            .and_then(|c| c.is_live(now).then_some(c.value));
        if let Some(value) = counter {
            return Ok(Some(value.to_string()));
        }
        Ok(self.cache.get(key).await.map(|(value, _)| value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.cache
            .insert(key.to_string(), (value.to_string(), ttl))
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        self.counters.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        Ok(self.add(key, 1))
    }

    async fn decr(&self, key: &str) -> AppResult<i64> {
        Ok(self.add(key, -1))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let is_counter = match self.counters.get_mut(key) {
            Some(mut counter) => {
                counter.expires_at = Some(Instant::now() + ttl);
                true
            }
            None => false,
        };
        if is_counter {
            self.purge_expired_counters();
            return Ok(true);
        }
        match self.cache.get(key).await {
            Some((value, _)) => {
                self.cache.insert(key.to_string(), (value, ttl)).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider() -> MemoryCacheProvider {
        MemoryCacheProvider::new(&MemoryCacheConfig::default())
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = make_provider();
        cache.set("greeting", "hello", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("greeting").await.unwrap().as_deref(), Some("hello"));
        cache.delete("greeting").await.unwrap();
        assert!(cache.get("greeting").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_incr_decr_are_visible_through_get() {
        let cache = make_provider();
        assert_eq!(cache.incr("c").await.unwrap(), 1);
        assert_eq!(cache.incr("c").await.unwrap(), 2);
        assert_eq!(cache.decr("c").await.unwrap(), 1);
        assert_eq!(cache.get("c").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_expired_counter_restarts() {
        let cache = make_provider();
        cache.incr("window").await.unwrap();
        cache.incr("window").await.unwrap();
        assert!(cache.expire("window", Duration::from_millis(20)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("window").await.unwrap().is_none());
        assert_eq!(cache.incr("window").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let cache = Arc::new(make_provider());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    cache.incr("shared").await.unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(cache.get("shared").await.unwrap().as_deref(), Some("800"));
    }
}
