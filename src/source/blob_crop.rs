//! In-process square cropping over a blob store
//!
//! Used when no remote image-serving endpoint is available. The stored
//! original is decoded, center-cropped to a square, scaled to the requested
//! side and encoded as JPEG on the blocking thread pool.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use super::{ImageSource, SourceError};
use crate::blob::{BlobRef, BlobStore};
use crate::image_processor::ImageProcessor;

pub struct BlobCropSource {
    blobs: Arc<dyn BlobStore>,
    processor: ImageProcessor,
}

impl BlobCropSource {
    pub fn new(blobs: Arc<dyn BlobStore>, processor: ImageProcessor) -> Self {
        Self { blobs, processor }
    }
}

#[async_trait]
impl ImageSource for BlobCropSource {
    async fn fetch_square(&self, blob_ref: &BlobRef, side: u32) -> Result<Bytes, SourceError> {
        let original = self.blobs.get(blob_ref).await?;
        let processor = self.processor.clone();

        tokio::task::spawn_blocking(move || {
            let img = processor
                .decode(&original)
                .map_err(SourceError::InvalidImage)?;
            let square = processor
                .square(&img, side)
                .map_err(SourceError::InvalidImage)?;
            processor.encode(&square).map_err(SourceError::InvalidImage)
        })
        .await
        .map_err(|e| SourceError::Worker(e.to_string()))?
    }
}
