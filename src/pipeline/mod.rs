//! Image delivery pipeline
//!
//! One request flows through:
//!
//! ```text
//! validate size -> resolve identifier -> cache lookup -> fetch square
//!     -> [crop to fill when width != height] -> cache store -> respond
//! ```
//!
//! The square is fetched at `max(width, height)`, so a square request needs
//! no processing at all and its bytes go out exactly as the source returned
//! them. Non-square requests are decoded, center-cropped on the blocking pool
//! and re-encoded as JPEG.
//!
//! Every failure is an explicit [`ServeError`]; a bad image for one creature
//! never affects other requests.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{CacheKey, CacheStats, CachedImage, ResponseCache};
use crate::constants::JPEG_CONTENT_TYPE;
use crate::error::{NotFoundCause, ServeError};
use crate::image_processor::{ImageError, ImageProcessor};
use crate::metrics::Metrics;
use crate::registry::{CreatureRegistry, RegistryError};
use crate::source::ImageSource;

/// Encoded image ready to be written to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedImage {
    pub data: Bytes,
    pub content_type: String,
    /// True when the bytes came from the response cache
    pub cache_hit: bool,
}

pub struct DeliveryPipeline {
    registry: CreatureRegistry,
    source: Arc<dyn ImageSource>,
    processor: ImageProcessor,
    cache: Arc<dyn ResponseCache>,
    max_dimension: u32,
    metrics: Option<Arc<Metrics>>,
}

impl DeliveryPipeline {
    pub fn new(
        registry: CreatureRegistry,
        source: Arc<dyn ImageSource>,
        processor: ImageProcessor,
        cache: Arc<dyn ResponseCache>,
        max_dimension: u32,
    ) -> Self {
        Self {
            registry,
            source,
            processor,
            cache,
            max_dimension,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &CreatureRegistry {
        &self.registry
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Produce `identifier` as a `width` x `height` JPEG
    pub async fn serve(
        &self,
        identifier: &str,
        width: u32,
        height: u32,
    ) -> Result<ServedImage, ServeError> {
        let start = Instant::now();
        let result = self.serve_uncounted(identifier, width, height).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_serve_duration(start.elapsed());
            if let Err(err) = &result {
                metrics.record_failure(err.kind());
            }
        }

        match &result {
            Ok(image) => tracing::debug!(
                identifier = %identifier,
                width = width,
                height = height,
                bytes = image.data.len(),
                cache_hit = image.cache_hit,
                duration_ms = start.elapsed().as_millis() as u64,
                "Served image"
            ),
            Err(err) => tracing::info!(
                identifier = %identifier,
                width = width,
                height = height,
                error = %err,
                kind = err.kind(),
                "Image request failed"
            ),
        }

        result
    }

    async fn serve_uncounted(
        &self,
        identifier: &str,
        width: u32,
        height: u32,
    ) -> Result<ServedImage, ServeError> {
        if width == 0 || height == 0 || width > self.max_dimension || height > self.max_dimension
        {
            return Err(NotFoundCause::InvalidDimensions { width, height }.into());
        }

        let creature = self
            .registry
            .resolve(identifier)
            .await
            .map_err(|e| match e {
                RegistryError::NotFound(_) => NotFoundCause::UnknownCreature(identifier.to_string()),
                other => NotFoundCause::Registry(other),
            })?;

        let key = CacheKey::new(identifier, width, height);
        if let Some(cached) = self.cached(&key).await {
            return Ok(ServedImage {
                data: cached.data,
                content_type: cached.content_type,
                cache_hit: true,
            });
        }

        let blob_ref = creature
            .blob_ref()
            .ok_or_else(|| NotFoundCause::MissingBlob(creature.name().to_string()))?;

        let side = width.max(height);
        let fetched = self.source.fetch_square(blob_ref, side).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_upstream_fetch(fetched.is_ok());
        }
        let square = fetched.map_err(NotFoundCause::Upstream)?;

        let data = if width == height {
            square
        } else {
            self.crop(square, width, height).await?
        };

        let image = CachedImage::new(data, JPEG_CONTENT_TYPE);
        if let Err(e) = self.cache.put(key.clone(), image.clone()).await {
            tracing::warn!(key = %key, error = %e, "Failed to store image in cache");
        }

        Ok(ServedImage {
            data: image.data,
            content_type: image.content_type,
            cache_hit: false,
        })
    }

    /// Cache lookup; a failing cache counts as a miss
    async fn cached(&self, key: &CacheKey) -> Option<CachedImage> {
        let found = match self.cache.get(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache lookup failed");
                None
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_cache_lookup(found.is_some());
        }
        found
    }

    async fn crop(&self, square: Bytes, width: u32, height: u32) -> Result<Bytes, ServeError> {
        let processor = self.processor.clone();
        tokio::task::spawn_blocking(move || {
            let img = processor.decode(&square).map_err(ServeError::Decode)?;
            let cropped = processor
                .crop_to_fill(&img, width, height)
                .map_err(ServeError::Encode)?;
            processor.encode(&cropped).map_err(ServeError::Encode)
        })
        .await
        .map_err(|e| ServeError::Encode(ImageError::encode(e.to_string())))?
    }
}
