//! Durable blob storage for creature source images
//!
//! Blobs are written once by the importer and read back by
//! [`BlobCropSource`](crate::source::BlobCropSource). A [`BlobRef`] is the
//! opaque handle a creature keeps to its stored image.

pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use s3::S3BlobStore;

/// Opaque reference into a [`BlobStore`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(BlobRef),

    #[error("blob storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` and return a fresh reference to it
    async fn put(&self, data: Bytes, content_type: &str) -> Result<BlobRef, BlobError>;

    /// Read a previously stored blob
    async fn get(&self, blob_ref: &BlobRef) -> Result<Bytes, BlobError>;

    /// Remove a blob; deleting a missing blob is not an error
    async fn delete(&self, blob_ref: &BlobRef) -> Result<(), BlobError>;
}

/// In-process blob store, used for tests and single-node demos
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<BlobRef, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, data: Bytes, _content_type: &str) -> Result<BlobRef, BlobError> {
        let blob_ref = BlobRef::new(uuid::Uuid::new_v4().to_string());
        self.blobs.write().insert(blob_ref.clone(), data);
        Ok(blob_ref)
    }

    async fn get(&self, blob_ref: &BlobRef) -> Result<Bytes, BlobError> {
        self.blobs
            .read()
            .get(blob_ref)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(blob_ref.clone()))
    }

    async fn delete(&self, blob_ref: &BlobRef) -> Result<(), BlobError> {
        self.blobs.write().remove(blob_ref);
        Ok(())
    }
}
