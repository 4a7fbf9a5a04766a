//! Service configuration
//!
//! Loaded from a YAML file. `${VAR_NAME}` references are replaced with
//! environment variable values before parsing; a reference to an unset
//! variable is an error. Every section is optional.
//!
//! ```yaml
//! server:
//!   address: 0.0.0.0
//!   port: 8080
//! registry:
//!   namespace: creatures
//!   path: /var/lib/placecreature/creatures.json
//! blob_store:
//!   type: s3
//!   bucket: creature-images
//!   region: us-east-1
//! image_source:
//!   type: serving_url
//!   base_url: ${IMAGE_SERVING_URL}
//! image:
//!   quality: 80
//! cache:
//!   enabled: true
//! fixtures: fixtures/creatures.json
//! ```

pub mod server;
pub mod storage;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::cache::CacheConfig;
use crate::image_processor::ImageConfig;

pub use server::ServerConfig;
pub use storage::{
    BlobStoreConfig, ImageSourceConfig, RegistryConfig, S3BlobConfig, ServingUrlConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub blob_store: BlobStoreConfig,
    #[serde(default)]
    pub image_source: ImageSourceConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Fixture file imported at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<String>,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        // Resolve every reference up front so a missing one is reported by name
        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    missing.get_or_insert_with(|| var_name.to_string());
                    String::new()
                }
            }
        });
        if let Some(var_name) = missing {
            return Err(ConfigError::MissingEnvVar(var_name));
        }

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Reports the first invalid field
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate().map_err(ConfigError::Invalid)?;
        self.registry.validate().map_err(ConfigError::Invalid)?;
        self.blob_store.validate().map_err(ConfigError::Invalid)?;
        self.image_source.validate().map_err(ConfigError::Invalid)?;
        self.image.validate().map_err(ConfigError::Invalid)?;
        self.cache.validate().map_err(ConfigError::Invalid)?;
        self.validate_storage_pairing()?;

        if let Some(fixtures) = &self.fixtures {
            if fixtures.is_empty() {
                return Err(ConfigError::Invalid(
                    "fixtures path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// A memory blob store only works when nothing outlives the process
    /// and nothing outside it needs to read the blobs
    fn validate_storage_pairing(&self) -> Result<(), ConfigError> {
        if !matches!(self.blob_store, BlobStoreConfig::Memory) {
            return Ok(());
        }
        if self.registry.path.is_some() {
            return Err(ConfigError::Invalid(
                "registry.path requires a durable blob_store (s3); memory blobs are lost on restart"
                    .to_string(),
            ));
        }
        if matches!(self.image_source, ImageSourceConfig::ServingUrl(_)) {
            return Err(ConfigError::Invalid(
                "image_source serving_url cannot read a memory blob_store; use s3".to_string(),
            ));
        }
        Ok(())
    }
}
