//! Startup wiring: builds stores, source, cache and pipeline from `Config`

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

use crate::blob::{BlobStore, MemoryBlobStore, S3BlobStore};
use crate::cache;
use crate::config::{BlobStoreConfig, Config, ImageSourceConfig};
use crate::image_processor::ImageProcessor;
use crate::importer::{ImportReport, Importer};
use crate::metrics::Metrics;
use crate::pipeline::DeliveryPipeline;
use crate::registry::{CreatureRegistry, CreatureStore, JsonFileCreatureStore, MemoryCreatureStore};
use crate::server::PlaceCreatureService;
use crate::source::{BlobCropSource, ImageSource, ServingUrlSource};

pub struct App {
    config: Config,
    registry: CreatureRegistry,
    blobs: Arc<dyn BlobStore>,
    pipeline: Arc<DeliveryPipeline>,
    metrics: Arc<Metrics>,
}

impl App {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn CreatureStore> = match &config.registry.path {
            Some(path) => Arc::new(
                JsonFileCreatureStore::open(path)
                    .await
                    .with_context(|| format!("Failed to open creature store {}", path))?,
            ),
            None => Arc::new(MemoryCreatureStore::new()),
        };
        let registry = CreatureRegistry::new(store, config.registry.namespace.clone());

        let blobs: Arc<dyn BlobStore> = match &config.blob_store {
            BlobStoreConfig::Memory => Arc::new(MemoryBlobStore::new()),
            BlobStoreConfig::S3(s3) => {
                tracing::info!(bucket = %s3.bucket, region = %s3.region, "Using S3 blob store");
                Arc::new(S3BlobStore::from_config(s3).await)
            }
        };

        let processor = ImageProcessor::new(&config.image);
        let source: Arc<dyn ImageSource> = match &config.image_source {
            ImageSourceConfig::ServingUrl(serving) => {
                tracing::info!(base_url = %serving.base_url, "Using image serving endpoint");
                Arc::new(
                    ServingUrlSource::from_config(serving)
                        .context("Failed to configure image serving endpoint")?,
                )
            }
            ImageSourceConfig::BlobCrop => {
                tracing::info!("Cropping squares from stored blobs");
                Arc::new(BlobCropSource::new(blobs.clone(), processor.clone()))
            }
        };

        let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);
        let pipeline = DeliveryPipeline::new(
            registry.clone(),
            source,
            processor,
            cache::from_config(&config.cache),
            config.image.max_dimension,
        )
        .with_metrics(metrics.clone());

        Ok(Self {
            config,
            registry,
            blobs,
            pipeline: Arc::new(pipeline),
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &CreatureRegistry {
        &self.registry
    }

    pub fn importer(&self) -> anyhow::Result<Importer> {
        Importer::new(
            self.registry.clone(),
            self.blobs.clone(),
            self.config.server.request_timeout(),
            self.config.image.max_source_bytes,
        )
        .context("Failed to create importer")
    }

    pub async fn import_file(&self, path: impl AsRef<Path>) -> anyhow::Result<ImportReport> {
        let path = path.as_ref();
        self.importer()?
            .import_file(path)
            .await
            .with_context(|| format!("Failed to import {}", path.display()))
    }

    pub fn service(&self) -> PlaceCreatureService {
        PlaceCreatureService::new(
            self.pipeline.clone(),
            self.metrics.clone(),
            self.config.server.request_timeout(),
        )
    }
}
