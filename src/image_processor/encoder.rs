//! JPEG encoding for delivered rasters

use bytes::Bytes;
use image::DynamicImage;

use super::error::ImageError;
use crate::constants::DEFAULT_JPEG_QUALITY;

/// Quality settings for JPEG encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderQuality {
    /// Quality value (1-100, where 100 is best quality)
    pub quality: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl EncoderQuality {
    /// Create quality settings with specified quality level
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

/// JPEG encoder using the image crate
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegEncoder {
    quality: EncoderQuality,
}

impl JpegEncoder {
    pub fn new(quality: EncoderQuality) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> EncoderQuality {
        self.quality
    }

    pub fn encode(&self, img: &DynamicImage) -> Result<Bytes, ImageError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
        use image::ImageEncoder as _;
        use std::io::Cursor;

        // JPEG has no alpha channel
        let rgb = img.to_rgb8();

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageJpegEncoder::new_with_quality(&mut output, self.quality.quality);

        encoder
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)
            .map_err(|e| ImageError::encode(e.to_string()))?;

        Ok(Bytes::from(output.into_inner()))
    }
}
