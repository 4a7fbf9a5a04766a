//! Cache statistics

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped for size or TTL
    pub evictions: u64,
    pub current_size_bytes: u64,
    pub current_item_count: u64,
    pub max_size_bytes: u64,
}

impl CacheStats {
    /// Hits over total lookups, 0.0 when nothing was looked up yet
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
