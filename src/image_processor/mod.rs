//! Image processing module
//!
//! Turns a square creature raster into the exact size a request asked for:
//! - Decode with image bomb protection
//! - Center crop-to-fill (Lanczos3 rescale only when the input does not
//!   already cover the target)
//! - JPEG encode at the configured quality
//!
//! JPEG is the only delivery format.

pub mod config;
pub mod encoder;
pub mod error;
pub mod processor;
pub mod security;

pub use config::ImageConfig;
pub use encoder::{EncoderQuality, JpegEncoder};
pub use error::ImageError;
pub use processor::{fill_dimensions, ImageProcessor};
pub use security::{validate_dimensions, validate_file_size};
