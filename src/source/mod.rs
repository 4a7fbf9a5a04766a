//! Square image sources
//!
//! An [`ImageSource`] hands back a JPEG raster center-cropped to a square of
//! the requested side. Two implementations exist:
//! - [`ServingUrlSource`]: a remote image-serving endpoint does the cropping
//!   and the bytes are passed through untouched
//! - [`BlobCropSource`]: the original is read from a [`BlobStore`] and cropped
//!   in-process
//!
//! [`BlobStore`]: crate::blob::BlobStore

pub mod blob_crop;
pub mod serving;

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

use crate::blob::{BlobError, BlobRef};
use crate::image_processor::ImageError;

pub use blob_crop::BlobCropSource;
pub use serving::ServingUrlSource;

/// Failure to obtain a square raster from upstream
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error("stored image is unusable: {0}")]
    InvalidImage(ImageError),

    #[error("image worker failed: {0}")]
    Worker(String),

    #[error("invalid image source configuration: {0}")]
    Config(String),
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    /// JPEG bytes of the blob's centered square at `side` x `side`
    async fn fetch_square(&self, blob_ref: &BlobRef, side: u32) -> Result<Bytes, SourceError>;
}
