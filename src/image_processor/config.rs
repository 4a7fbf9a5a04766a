use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIMENSION, DEFAULT_MAX_SOURCE_BYTES,
    DEFAULT_MAX_SOURCE_PIXELS,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// JPEG quality for re-encoded output (1-100)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Largest width or height a request may ask for
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// Largest decoded image (width * height) accepted
    #[serde(default = "default_max_source_pixels")]
    pub max_source_pixels: u64,

    /// Largest source file accepted on import
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            max_dimension: default_max_dimension(),
            max_source_pixels: default_max_source_pixels(),
            max_source_bytes: default_max_source_bytes(),
        }
    }
}

impl ImageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.quality == 0 || self.quality > 100 {
            return Err(format!(
                "image.quality must be between 1 and 100, got {}",
                self.quality
            ));
        }
        if self.max_dimension == 0 {
            return Err("image.max_dimension must be greater than 0".to_string());
        }
        if (self.max_dimension as u64) * (self.max_dimension as u64) > self.max_source_pixels {
            return Err(format!(
                "image.max_source_pixels ({}) is smaller than a max_dimension square ({}x{})",
                self.max_source_pixels, self.max_dimension, self.max_dimension
            ));
        }
        Ok(())
    }
}

fn default_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

fn default_max_source_pixels() -> u64 {
    DEFAULT_MAX_SOURCE_PIXELS
}

fn default_max_source_bytes() -> usize {
    DEFAULT_MAX_SOURCE_BYTES
}
