//! Raster operations: decode, crop-to-fill, square, encode

use bytes::Bytes;
use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::io::Cursor;
use std::num::NonZeroU32;

use super::config::ImageConfig;
use super::encoder::{EncoderQuality, JpegEncoder};
use super::error::ImageError;
use super::security::validate_dimensions;

/// Decodes, reframes and re-encodes creature images
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    encoder: JpegEncoder,
    max_source_pixels: u64,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(&ImageConfig::default())
    }
}

impl ImageProcessor {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            encoder: JpegEncoder::new(EncoderQuality::with_quality(config.quality)),
            max_source_pixels: config.max_source_pixels,
        }
    }

    /// Decode raster bytes, rejecting images over the pixel limit
    pub fn decode(&self, data: &[u8]) -> Result<DynamicImage, ImageError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ImageError::decode(e.to_string()))?;

        // Check the header before allocating the full pixel buffer
        if let Ok((width, height)) = reader.into_dimensions() {
            if let Err(err) = validate_dimensions(width, height, self.max_source_pixels) {
                tracing::warn!(
                    pixels = err.pixels(),
                    max_pixels = self.max_source_pixels,
                    "Refusing to decode oversized source"
                );
                return Err(err);
            }
        }

        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ImageError::decode(e.to_string()))?
            .decode()
            .map_err(|e| ImageError::decode(e.to_string()))
    }

    pub fn encode(&self, img: &DynamicImage) -> Result<Bytes, ImageError> {
        self.encoder.encode(img)
    }

    /// Produce exactly `width` x `height` from `img` with no distortion and no
    /// letterboxing: scale until the image covers the target, then trim the
    /// overhang equally from both sides of the longer axis.
    ///
    /// For a square input of side `max(width, height)` no scaling happens and
    /// this is a pure center crop.
    pub fn crop_to_fill(
        &self,
        img: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::bad_target(
                width,
                height,
                "target dimensions must be positive",
            ));
        }

        let (fill_w, fill_h) = fill_dimensions(img.width(), img.height(), width, height)?;
        let covered = if (fill_w, fill_h) != (img.width(), img.height()) {
            resize(img, fill_w, fill_h)?
        } else {
            img.clone()
        };

        let x = (fill_w - width) / 2;
        let y = (fill_h - height) / 2;
        Ok(covered.crop_imm(x, y, width, height))
    }

    /// Center-crop `img` to a square and scale it to `side` x `side`
    pub fn square(&self, img: &DynamicImage, side: u32) -> Result<DynamicImage, ImageError> {
        self.crop_to_fill(img, side, side)
    }
}

/// Size `src` must be scaled to so that it covers `target` while keeping its
/// aspect ratio. At least one returned dimension equals the target exactly.
pub fn fill_dimensions(
    src_width: u32,
    src_height: u32,
    target_width: u32,
    target_height: u32,
) -> Result<(u32, u32), ImageError> {
    if src_width == 0 || src_height == 0 {
        return Err(ImageError::bad_target(
            src_width,
            src_height,
            "source image is empty",
        ));
    }

    let (sw, sh) = (src_width as u64, src_height as u64);
    let (tw, th) = (target_width as u64, target_height as u64);

    // Integer comparison of tw/sw against th/sh
    let (fill_w, fill_h) = if tw * sh >= th * sw {
        (tw, div_ceil(sh * tw, sw))
    } else {
        (div_ceil(sw * th, sh), th)
    };

    Ok((fill_w as u32, fill_h as u32))
}

fn div_ceil(numerator: u64, denominator: u64) -> u64 {
    (numerator + denominator - 1) / denominator
}

/// Resize using fast-image-resize with Lanczos3 filter
fn resize(img: &DynamicImage, target_w: u32, target_h: u32) -> Result<DynamicImage, ImageError> {
    let src_width = NonZeroU32::new(img.width())
        .ok_or_else(|| ImageError::reframe("Source width is 0"))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| ImageError::reframe("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImageError::reframe("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ImageError::reframe("Target height is 0"))?;

    // Output is JPEG, so alpha is dropped before resizing
    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgb8().into_raw(),
        PixelType::U8x3,
    )
    .map_err(|e| ImageError::reframe(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x3);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ImageError::reframe(format!("Resize operation failed: {:?}", e)))?;

    let rgb_image = image::RgbImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ImageError::reframe("Failed to create output image buffer"))?;

    Ok(DynamicImage::ImageRgb8(rgb_image))
}
