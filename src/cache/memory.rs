//! In-memory response caches
//!
//! - `MemoryResponseCache`: byte-weighted moka cache with a TTL
//! - `NullCache`: caching disabled

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::config::CacheConfig;
use super::entry::{CacheKey, CachedImage};
use super::error::CacheError;
use super::stats::CacheStats;
use super::traits::ResponseCache;

/// Lookup and eviction counters, shared with moka's eviction listener
#[derive(Default)]
pub(crate) struct LookupCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl LookupCounters {
    fn record_lookup(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    fn to_stats(
        &self,
        current_size_bytes: u64,
        current_item_count: u64,
        max_size_bytes: u64,
    ) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            current_size_bytes,
            current_item_count,
            max_size_bytes,
        }
    }
}

pub struct MemoryResponseCache {
    cache: moka::future::Cache<CacheKey, CachedImage>,
    counters: Arc<LookupCounters>,
    max_item_size_bytes: u64,
    max_size_bytes: u64,
}

impl MemoryResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        let counters = Arc::new(LookupCounters::default());
        let listener_counters = counters.clone();

        let cache = moka::future::Cache::builder()
            .max_capacity(config.max_cache_size_bytes())
            .time_to_live(Duration::from_secs(config.ttl_seconds))
            .weigher(|_key, image: &CachedImage| {
                u32::try_from(image.size_bytes()).unwrap_or(u32::MAX)
            })
            .eviction_listener(move |_key, _value, cause| {
                use moka::notification::RemovalCause;
                // Replacing a key is not an eviction
                if matches!(cause, RemovalCause::Size | RemovalCause::Expired) {
                    listener_counters.record_eviction();
                }
            })
            .build();

        Self {
            cache,
            counters,
            max_item_size_bytes: config.max_item_size_bytes(),
            max_size_bytes: config.max_cache_size_bytes(),
        }
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedImage>, CacheError> {
        let found = self.cache.get(key).await;
        self.counters.record_lookup(found.is_some());
        Ok(found)
    }

    async fn put(&self, key: CacheKey, image: CachedImage) -> Result<(), CacheError> {
        let size = image.size_bytes() as u64;
        if size > self.max_item_size_bytes {
            return Err(CacheError::ItemTooLarge {
                size,
                max_size: self.max_item_size_bytes,
            });
        }

        self.cache.insert(key, image).await;
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        // Sizes lag inserts until moka's pending maintenance runs
        self.cache.run_pending_tasks().await;
        self.counters.to_stats(
            self.cache.weighted_size(),
            self.cache.entry_count(),
            self.max_size_bytes,
        )
    }
}

/// Cache that stores nothing; every lookup misses
pub struct NullCache;

#[async_trait]
impl ResponseCache for NullCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<CachedImage>, CacheError> {
        Ok(None)
    }

    async fn put(&self, _key: CacheKey, _image: CachedImage) -> Result<(), CacheError> {
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}
