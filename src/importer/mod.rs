//! Fixture import
//!
//! A fixture is a JSON array of creatures:
//!
//! ```json
//! [
//!   {
//!     "name": "cat",
//!     "is_public": true,
//!     "aliases": ["kitty"],
//!     "images": [
//!       {
//!         "source": "https://example.com/cat.jpg",
//!         "license": "CC-BY-2.0",
//!         "author_name": "Jo",
//!         "author_url": "https://example.com/jo",
//!         "original_url": "https://example.com/photos/1"
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! Only the first image of each entry is used. Entries whose name is already
//! registered are skipped. For the rest the `source` URL is downloaded once,
//! stored as a blob and the creature is registered with the blob reference.
//! A failing entry is recorded in the [`ImportReport`] and the batch carries
//! on.

use bytes::Bytes;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::blob::{BlobError, BlobStore};
use crate::constants::JPEG_CONTENT_TYPE;
use crate::creature::{Creature, CreatureError, Provenance};
use crate::image_processor::{validate_file_size, ImageError};
use crate::registry::{CreatureRegistry, RegistryError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid fixture JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("creature '{0}' has no images")]
    NoImage(String),

    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("fetching {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("source {0} is not a recognizable image")]
    NotAnImage(String),

    #[error(transparent)]
    TooLarge(#[from] ImageError),

    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Creature(#[from] CreatureError),

    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureEntry {
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub images: Vec<Provenance>,
}

/// What happened to each fixture entry
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, ImportError)>,
}

impl ImportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

enum Outcome {
    Imported,
    Skipped,
}

pub struct Importer {
    registry: CreatureRegistry,
    blobs: Arc<dyn BlobStore>,
    http_client: reqwest::Client,
    max_source_bytes: usize,
}

impl Importer {
    pub fn new(
        registry: CreatureRegistry,
        blobs: Arc<dyn BlobStore>,
        fetch_timeout: Duration,
        max_source_bytes: usize,
    ) -> Result<Self, ImportError> {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| ImportError::Client(e.to_string()))?;

        Ok(Self {
            registry,
            blobs,
            http_client,
            max_source_bytes,
        })
    }

    pub async fn import_file(&self, path: impl AsRef<Path>) -> Result<ImportReport, ImportError> {
        let path = path.as_ref();
        let contents = tokio::fs::read(path).await?;
        tracing::info!(path = %path.display(), "Importing fixture file");
        self.import(&contents).await
    }

    /// Import every entry of a fixture document
    ///
    /// # Errors
    ///
    /// Only a document that is not a valid fixture fails the whole call;
    /// per-entry failures land in the report.
    pub async fn import(&self, json: &[u8]) -> Result<ImportReport, ImportError> {
        let entries: Vec<FixtureEntry> = serde_json::from_slice(json)?;
        let mut report = ImportReport::default();

        for entry in entries {
            let name = entry.name.clone();
            match self.import_entry(entry).await {
                Ok(Outcome::Imported) => report.imported.push(name),
                Ok(Outcome::Skipped) => {
                    tracing::debug!(creature = %name, "Creature already registered, skipping");
                    report.skipped.push(name);
                }
                Err(e) => {
                    tracing::warn!(creature = %name, error = %e, "Failed to import creature");
                    report.failed.push((name, e));
                }
            }
        }

        tracing::info!(
            imported = report.imported.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Fixture import finished"
        );
        Ok(report)
    }

    async fn import_entry(&self, entry: FixtureEntry) -> Result<Outcome, ImportError> {
        if self.registry.find_by_name(&entry.name).await?.is_some() {
            return Ok(Outcome::Skipped);
        }

        let provenance = entry
            .images
            .into_iter()
            .next()
            .ok_or_else(|| ImportError::NoImage(entry.name.clone()))?;
        let creature = Creature::new(entry.name, entry.aliases, entry.is_public)?;

        let data = self.fetch(&provenance.source).await?;
        let blob_ref = self.blobs.put(data, JPEG_CONTENT_TYPE).await?;
        let creature = creature
            .with_provenance(provenance)
            .with_blob_ref(blob_ref.clone());

        let outcome: Result<Outcome, ImportError> = match self.registry.register(creature).await {
            Ok(()) => return Ok(Outcome::Imported),
            // Registered concurrently since the lookup above
            Err(RegistryError::AlreadyExists(_)) => Ok(Outcome::Skipped),
            Err(e) => Err(e.into()),
        };

        // No record points at the blob; drop it
        if let Err(e) = self.blobs.delete(&blob_ref).await {
            tracing::warn!(
                blob = %blob_ref,
                error = %e,
                "Failed to delete unreferenced blob"
            );
        }
        outcome
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, ImportError> {
        let fetch_error = |e: reqwest::Error| ImportError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.http_client.get(url).send().await.map_err(fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if let Some(length) = response.content_length() {
            validate_file_size(length as usize, self.max_source_bytes)?;
        }

        let data = response.bytes().await.map_err(fetch_error)?;
        validate_file_size(data.len(), self.max_source_bytes)?;
        if image::guess_format(&data).is_err() {
            return Err(ImportError::NotAnImage(url.to_string()));
        }

        tracing::debug!(url = %url, bytes = data.len(), "Fetched source image");
        Ok(data)
    }
}
