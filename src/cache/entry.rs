//! Cache key and cached value types

use bytes::Bytes;
use std::fmt;

/// Identifies one rendered image: the identifier exactly as requested plus
/// the target size
///
/// Renders as `{percent-encoded identifier}/{width}/{height}`, so identifiers
/// containing `/` cannot collide with other keys.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub identifier: String,
    pub width: u32,
    pub height: u32,
}

impl CacheKey {
    pub fn new(identifier: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            identifier: identifier.into(),
            width,
            height,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            urlencoding::encode(&self.identifier),
            self.width,
            self.height
        )
    }
}

/// Encoded image bytes ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImage {
    pub data: Bytes,
    pub content_type: String,
}

impl CachedImage {
    pub fn new(data: Bytes, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}
