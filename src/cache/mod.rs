//! Response cache
//!
//! Stores the final encoded image per (identifier, width, height) so repeat
//! requests skip the fetch and the crop. The cache is keyed by the identifier
//! exactly as requested: a name and one of its aliases get separate entries.

pub mod config;
pub mod entry;
pub mod error;
pub mod memory;
pub mod stats;
pub mod traits;

use std::sync::Arc;

pub use config::CacheConfig;
pub use entry::{CacheKey, CachedImage};
pub use error::CacheError;
pub use memory::{MemoryResponseCache, NullCache};
pub use stats::CacheStats;
pub use traits::ResponseCache;

/// Build the configured cache; `NullCache` when caching is disabled
pub fn from_config(config: &CacheConfig) -> Arc<dyn ResponseCache> {
    if config.enabled {
        tracing::info!(
            max_cache_size_mb = config.max_cache_size_mb,
            max_item_size_mb = config.max_item_size_mb,
            ttl_seconds = config.ttl_seconds,
            "Response cache enabled"
        );
        Arc::new(MemoryResponseCache::new(config))
    } else {
        tracing::info!("Response cache disabled");
        Arc::new(NullCache)
    }
}
