//! In-memory cache implementation using the moka crate.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use dms_core::config::cache::MemoryCacheConfig;
use dms_core::result::AppResult;
use dms_core::traits::cache::CacheProvider;

/// A cached value with its own time-to-live.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
#[derive(Debug)]
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory cache provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    cache: Cache<String, Entry>,
    /// TTL used by [`MemoryCacheProvider::insert`].
    default_ttl: Duration,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    ///
    /// `config.time_to_live_seconds` caps every entry; shorter per-entry
    /// TTLs passed to [`MemoryCacheProvider::insert_with_ttl`] are honoured.
    pub fn new(config: &MemoryCacheConfig, default_ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.time_to_live_seconds))
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        }
    }

    /// The cached value under `key`, if present and not expired.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key).await.map(|entry| entry.value)
    }

    /// Caches `value` under `key` for the default TTL.
    pub async fn insert(&self, key: &str, value: &str) {
        self.insert_with_ttl(key, value, self.default_ttl).await;
    }

    /// Caches `value` under `key` for `ttl`.
    pub async fn insert_with_ttl(&self, key: &str, value: &str, ttl: Duration) {
        let entry = Entry {
            value: value.to_string(),
            ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
