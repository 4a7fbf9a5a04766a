//! Response cache port

use async_trait::async_trait;

use super::entry::{CacheKey, CachedImage};
use super::error::CacheError;
use super::stats::CacheStats;

/// Byte cache keyed by (identifier, width, height)
///
/// Expiry and eviction are up to the implementation.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// `None` when the key is absent or expired
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedImage>, CacheError>;

    /// Overwrites an existing value for the same key
    async fn put(&self, key: CacheKey, image: CachedImage) -> Result<(), CacheError>;

    async fn stats(&self) -> CacheStats;
}
