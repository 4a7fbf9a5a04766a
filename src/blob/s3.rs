//! S3-backed blob store

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;

use super::{BlobError, BlobRef, BlobStore};
use crate::config::S3BlobConfig;

pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build a client from the default AWS credential chain plus the
    /// configured region and optional custom endpoint (MinIO, LocalStack).
    pub async fn from_config(config: &S3BlobConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Self::new(
            S3Client::from_conf(s3_config),
            config.bucket.clone(),
            config.prefix.clone(),
        )
    }

    fn object_key(&self) -> String {
        let id = uuid::Uuid::new_v4();
        if self.prefix.is_empty() {
            id.to_string()
        } else {
            format!("{}/{}", self.prefix, id)
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, data: Bytes, content_type: &str) -> Result<BlobRef, BlobError> {
        let key = self.object_key();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| BlobError::Storage(format!("S3 put failed: {e}")))?;

        tracing::debug!(bucket = %self.bucket, key = %key, "Stored blob in S3");
        Ok(BlobRef::new(key))
    }

    async fn get(&self, blob_ref: &BlobRef) -> Result<Bytes, BlobError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(blob_ref.as_str())
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    BlobError::NotFound(blob_ref.clone())
                } else {
                    BlobError::Storage(format!("S3 fetch failed: {e}"))
                }
            })?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| BlobError::Storage(format!("Failed to read S3 body: {e}")))?;

        Ok(body.into_bytes())
    }

    async fn delete(&self, blob_ref: &BlobRef) -> Result<(), BlobError> {
        // S3 answers 204 for missing keys as well
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(blob_ref.as_str())
            .send()
            .await
            .map_err(|e| BlobError::Storage(format!("S3 delete failed: {e}")))?;

        tracing::debug!(bucket = %self.bucket, key = %blob_ref, "Deleted blob from S3");
        Ok(())
    }
}
