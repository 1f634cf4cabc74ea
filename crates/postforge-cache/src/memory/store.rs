//! In-memory cache provider built on moka and dashmap.
//!
//! String entries live in a moka cache with per-entry TTL via the
//! `Expiry` hook. Counters live in a dashmap so increments are atomic
//! under the entry lock; each counter carries an optional deadline that
//! emulates Redis key expiry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;

use postforge_core::config::cache::MemoryCacheConfig;
use postforge_core::result::AppResult;
use postforge_core::traits::cache::CacheProvider;

/// A cached string value with its per-entry TTL.
#[derive(Debug, Clone)]
struct CachedEntry {
    value: String,
    ttl: Duration,
    expires_at: Instant,
}

/// Moka expiry policy that reads the TTL stored on each entry.
struct PerEntryExpiry;

impl Expiry<String, CachedEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// A counter with an optional expiry deadline.
#[derive(Debug)]
struct CounterEntry {
    value: i64,
    expires_at: Option<Instant>,
}

impl CounterEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process cache provider for single-node deployments and tests.
#[derive(Debug)]
pub struct MemoryCacheProvider {
    /// String entries with per-entry TTL.
    cache: Cache<String, CachedEntry>,
    /// Atomic counters with optional deadlines.
    counters: DashMap<String, CounterEntry>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache provider.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryExpiry)
            .build();
        Self {
            cache,
            counters: DashMap::new(),
        }
    }

    async fn insert(&self, key: &str, value: &str, ttl: Duration) {
        let entry = CachedEntry {
            value: value.to_string(),
            ttl,
            expires_at: Instant::now() + ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
    }

    /// Look up a live counter value, discarding expired entries.
    fn counter_value(&self, key: &str) -> Option<i64> {
        if let Some(entry) = self.counters.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.counters.remove(key);
                return None;
            }
            return Some(entry.value);
        }
        None
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        if let Some(entry) = self.cache.get(key).await {
            return Ok(Some(entry.value));
        }
        Ok(self.counter_value(key).map(|v| v.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.insert(key, value, ttl).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.invalidate(key).await;
        self.counters.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        if self.cache.contains_key(key) {
            return Ok(true);
        }
        Ok(self.counter_value(key).is_some())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        // Get-then-insert is not perfectly atomic, which is acceptable for
        // single-node in-memory use.
        if self.cache.contains_key(key) {
            return Ok(false);
        }
        self.insert(key, value, ttl).await;
        Ok(true)
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        let mut entry = self.counters.entry(key.to_string()).or_insert(CounterEntry {
            value: 0,
            expires_at: None,
        });
        if entry.is_expired() {
            entry.value = 0;
            entry.expires_at = None;
        }
        entry.value += 1;
        Ok(entry.value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        if let Some(mut entry) = self.counters.get_mut(key) {
            if !entry.is_expired() {
                entry.expires_at = Some(Instant::now() + ttl);
                return Ok(true);
            }
        }
        if let Some(entry) = self.cache.get(key).await {
            self.insert(key, &entry.value, ttl).await;
            return Ok(true);
        }
        Ok(false)
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>> {
        if let Some(entry) = self.cache.get(key).await {
            return Ok(Some(
                entry.expires_at.saturating_duration_since(Instant::now()),
            ));
        }
        if let Some(entry) = self.counters.get(key) {
            if entry.is_expired() {
                return Ok(None);
            }
            return Ok(entry
                .expires_at
                .map(|at| at.saturating_duration_since(Instant::now())));
        }
        Ok(None)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider() -> MemoryCacheProvider {
        let config = MemoryCacheConfig { max_capacity: 1000 };
        MemoryCacheProvider::new(&config)
    }

    #[tokio::test]
    async fn test_set_get() {
        let provider = make_provider();
        provider
            .set("key1", "value1", Duration::from_secs(60))
            .await
            .unwrap();
        let val = provider.get("key1").await.unwrap();
        assert_eq!(val, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let provider = make_provider();
        provider
            .set("key2", "value2", Duration::from_secs(60))
            .await
            .unwrap();
        provider.delete("key2").await.unwrap();
        let val = provider.get("key2").await.unwrap();
        assert_eq!(val, None);
    }

    #[tokio::test]
    async fn test_incr_visibility() {
        let provider = make_provider();
        let v1 = provider.incr("counter").await.unwrap();
        assert_eq!(v1, 1);
        let v2 = provider.incr("counter").await.unwrap();
        assert_eq!(v2, 2);
        let via_get = provider.get("counter").await.unwrap();
        assert_eq!(via_get, Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_counter_expiry_resets_window() {
        let provider = make_provider();
        provider.incr("window").await.unwrap();
        provider.incr("window").await.unwrap();
        provider
            .expire("window", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        // Expired window starts over from zero.
        let v = provider.incr("window").await.unwrap();
        assert_eq!(v, 1);
    }

    #[tokio::test]
    async fn test_set_nx() {
        let provider = make_provider();
        let first = provider
            .set_nx("nx_key", "val", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(first);
        let second = provider
            .set_nx("nx_key", "val2", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(!second);
    }

    #[tokio::test]
    async fn test_ttl_reports_remaining() {
        let provider = make_provider();
        provider
            .set("ttl_key", "v", Duration::from_secs(60))
            .await
            .unwrap();
        let remaining = provider.ttl("ttl_key").await.unwrap();
        assert!(remaining.is_some_and(|d| d <= Duration::from_secs(60)));
        assert_eq!(provider.ttl("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_health_check() {
        let provider = make_provider();
        assert!(provider.health_check().await.unwrap());
    }
}
