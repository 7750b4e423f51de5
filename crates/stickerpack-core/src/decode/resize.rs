//! Raster scaling used by the surface.
//!
//! The input is never modified; a new `RasterImage` is returned.

use super::{rgba_len, DecodeError, FilterType, RasterImage};

/// Scale an image to exact dimensions, ignoring aspect ratio.
///
/// This mirrors `drawImage(img, 0, 0, width, height)` on a canvas: the whole
/// source is stretched over the whole target.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` for zero-sized or oversized targets
/// and for an empty source.
pub fn resize(
    image: &RasterImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<RasterImage, DecodeError> {
    if rgba_len(width, height).is_none() {
        return Err(DecodeError::InvalidDimensions { width, height });
    }
    if image.is_empty() {
        return Err(DecodeError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgba = image
        .to_rgba_image()
        .ok_or_else(|| DecodeError::CorruptedFile("Pixel buffer size mismatch".to_string()))?;

    let resized = image::imageops::resize(&rgba, width, height, filter.to_image_filter());

    Ok(RasterImage::from_rgba_image(resized))
}
