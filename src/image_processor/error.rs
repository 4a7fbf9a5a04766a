//! Image processing errors

use thiserror::Error;

/// Failure while decoding, reframing or encoding a raster
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("cannot decode image: {0}")]
    Decode(String),

    /// Scaling or cropping failed
    #[error("cannot reframe image: {0}")]
    Reframe(String),

    #[error("cannot encode jpeg: {0}")]
    Encode(String),

    /// Decoded raster would be larger than allowed
    #[error("source is {width}x{height}, more than {max_pixels} pixels")]
    TooManyPixels {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    #[error("source is {size} bytes, limit is {max_size}")]
    SourceTooLarge { size: usize, max_size: usize },

    #[error("cannot produce {width}x{height}: {reason}")]
    BadTarget {
        width: u32,
        height: u32,
        reason: String,
    },
}

impl ImageError {
    pub fn decode(message: impl Into<String>) -> Self {
        ImageError::Decode(message.into())
    }

    pub fn reframe(message: impl Into<String>) -> Self {
        ImageError::Reframe(message.into())
    }

    pub fn encode(message: impl Into<String>) -> Self {
        ImageError::Encode(message.into())
    }

    pub fn bad_target(width: u32, height: u32, reason: impl Into<String>) -> Self {
        ImageError::BadTarget {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Pixel count of the offending source, for log fields
    pub fn pixels(&self) -> Option<u64> {
        match self {
            ImageError::TooManyPixels { width, height, .. } => Some(*width as u64 * *height as u64),
            _ => None,
        }
    }
}
