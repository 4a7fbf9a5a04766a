//! `cache:` section of the configuration file
//!
//! ```yaml
//! cache:
//!   enabled: true
//!   max_cache_size_mb: 256
//!   max_item_size_mb: 10
//!   ttl_seconds: 3600
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_CACHE_SIZE_MB, DEFAULT_MAX_ITEM_SIZE_MB, DEFAULT_TTL_SECONDS};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Total bytes of encoded images kept in memory
    pub max_cache_size_mb: u64,
    /// Larger images are served but never stored
    pub max_item_size_mb: u64,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_cache_size_mb: DEFAULT_MAX_CACHE_SIZE_MB,
            max_item_size_mb: DEFAULT_MAX_ITEM_SIZE_MB,
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl CacheConfig {
    pub fn max_cache_size_bytes(&self) -> u64 {
        self.max_cache_size_mb.saturating_mul(MIB)
    }

    pub fn max_item_size_bytes(&self) -> u64 {
        self.max_item_size_mb.saturating_mul(MIB)
    }

    /// Limits only matter when the cache is on
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if self.max_cache_size_mb == 0 || self.ttl_seconds == 0 {
            return Err("cache.max_cache_size_mb and cache.ttl_seconds must be positive".to_string());
        }
        if self.max_item_size_mb > self.max_cache_size_mb {
            return Err(format!(
                "cache.max_item_size_mb ({}) exceeds cache.max_cache_size_mb ({})",
                self.max_item_size_mb, self.max_cache_size_mb
            ));
        }
        Ok(())
    }
}
