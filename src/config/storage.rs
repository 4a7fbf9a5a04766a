//! Registry, blob store and image source configuration

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BLOB_PREFIX, DEFAULT_NAMESPACE, DEFAULT_SOURCE_TIMEOUT_SECS, DEFAULT_URL_TEMPLATE,
};
use crate::retry::RetryPolicy;

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// `registry:` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// JSON file the creature records persist to; in-memory when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            path: None,
        }
    }
}

/// `blob_store:` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlobStoreConfig {
    #[default]
    Memory,
    S3(S3BlobConfig),
}

fn default_blob_prefix() -> String {
    DEFAULT_BLOB_PREFIX.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3BlobConfig {
    pub bucket: String,
    pub region: String,
    #[serde(default = "default_blob_prefix")]
    pub prefix: String,
    /// Custom endpoint (MinIO, LocalStack); enables path-style addressing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// `image_source:` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSourceConfig {
    ServingUrl(ServingUrlConfig),
    #[default]
    BlobCrop,
}

fn default_url_template() -> String {
    DEFAULT_URL_TEMPLATE.to_string()
}

fn default_source_timeout() -> u64 {
    DEFAULT_SOURCE_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServingUrlConfig {
    pub base_url: String,
    #[serde(default = "default_url_template")]
    pub url_template: String,
    #[serde(default = "default_source_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.namespace.is_empty() {
            return Err("registry.namespace cannot be empty".to_string());
        }
        Ok(())
    }
}

impl BlobStoreConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let BlobStoreConfig::S3(s3) = self {
            if s3.bucket.is_empty() {
                return Err("blob_store.bucket cannot be empty".to_string());
            }
            if s3.region.is_empty() {
                return Err("blob_store.region cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl ImageSourceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let ImageSourceConfig::ServingUrl(serving) = self {
            if serving.base_url.is_empty() {
                return Err("image_source.base_url cannot be empty".to_string());
            }
            for placeholder in ["{blob}", "{side}"] {
                if !serving.url_template.contains(placeholder) {
                    return Err(format!(
                        "image_source.url_template must contain {}",
                        placeholder
                    ));
                }
            }
            if serving.timeout_seconds == 0 {
                return Err("image_source.timeout_seconds must be greater than 0".to_string());
            }
        }
        Ok(())
    }
}
