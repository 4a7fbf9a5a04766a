//! Cache error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// Value is larger than the configured per-item limit
    #[error("cache item of {size} bytes exceeds the {max_size} byte limit")]
    ItemTooLarge { size: u64, max_size: u64 },

    #[error("cache backend error: {0}")]
    Backend(String),
}
