//! Input limits checked before a source is decoded or stored

use super::error::ImageError;

/// Fail when a `width` x `height` raster holds more than `max_pixels`
pub fn validate_dimensions(width: u32, height: u32, max_pixels: u64) -> Result<(), ImageError> {
    if width as u64 * height as u64 > max_pixels {
        return Err(ImageError::TooManyPixels {
            width,
            height,
            max_pixels,
        });
    }
    Ok(())
}

/// Fail when an encoded source is over `max_size` bytes
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ImageError> {
    if size > max_size {
        return Err(ImageError::SourceTooLarge { size, max_size });
    }
    Ok(())
}
