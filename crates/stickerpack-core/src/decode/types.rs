//! Core types for image decoding and frame extraction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delay applied to frames whose container declares zero or no delay.
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

/// Largest canvas a decoder will allocate, in pixels (8192 x 8192).
pub const MAX_CANVAS_PIXELS: u64 = 8192 * 8192;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The source container cannot be handled by this pipeline.
    #[error("Unsupported source container: {0}")]
    UnsupportedContainer(String),

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// Target or source dimensions are unusable.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Decoded frames would exceed the memory budget.
    #[error("Decoded frames exceed {limit} bytes after {frames} frames")]
    TooLarge { frames: usize, limit: usize },
}

/// Filter type for image scaling operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation, the browser canvas default.
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// A decoded raster with straight (non-premultiplied) RGBA samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGBA pixel data in row-major order (4 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Create a new RasterImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 4,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A fully transparent canvas.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::InvalidDimensions` for zero-sized canvases and for
    /// anything above [`MAX_CANVAS_PIXELS`].
    pub fn blank(width: u32, height: u32) -> Result<Self, DecodeError> {
        let len = rgba_len(width, height).ok_or(DecodeError::InvalidDimensions { width, height })?;
        Ok(Self {
            width,
            height,
            pixels: vec![0u8; len],
        })
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Convert to an image::RgbaImage for further processing.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

/// Byte length of a `width` x `height` RGBA buffer, or `None` when the canvas
/// is empty, above [`MAX_CANVAS_PIXELS`], or not addressable on this target.
pub fn rgba_len(width: u32, height: u32) -> Option<usize> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels == 0 || pixels > MAX_CANVAS_PIXELS {
        return None;
    }
    usize::try_from(pixels).ok()?.checked_mul(4)
}

/// One fully composited snapshot of an image plus its display delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub image: RasterImage,
    /// Display delay in milliseconds.
    pub delay_ms: u32,
}

impl Frame {
    pub fn new(image: RasterImage, delay_ms: u32) -> Self {
        Self { image, delay_ms }
    }

    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_type_conversion() {
        assert!(matches!(
            FilterType::Nearest.to_image_filter(),
            image::imageops::FilterType::Nearest
        ));
        assert!(matches!(
            FilterType::Bilinear.to_image_filter(),
            image::imageops::FilterType::Triangle
        ));
        assert!(matches!(
            FilterType::Lanczos3.to_image_filter(),
            image::imageops::FilterType::Lanczos3
        ));
    }

    #[test]
    fn test_filter_type_serde_names() {
        let parsed: FilterType = serde_json::from_str("\"lanczos3\"").unwrap();
        assert_eq!(parsed, FilterType::Lanczos3);
        assert_eq!(serde_json::to_string(&FilterType::Bilinear).unwrap(), "\"bilinear\"");
    }

    #[test]
    fn test_raster_image_creation() {
        let img = RasterImage::new(100, 50, vec![0u8; 100 * 50 * 4]);

        assert_eq!(img.pixel_count(), 5000);
        assert_eq!(img.byte_size(), 20000);
        assert!(!img.is_empty());
    }

    #[test]
    fn test_blank_is_transparent() {
        let img = RasterImage::blank(3, 2).unwrap();
        assert_eq!(img.byte_size(), 24);
        assert!(img.pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_blank_rejects_oversized_canvas() {
        assert!(matches!(
            RasterImage::blank(u32::from(u16::MAX), u32::from(u16::MAX)),
            Err(DecodeError::InvalidDimensions {
                width: 65535,
                height: 65535
            })
        ));
        assert!(RasterImage::blank(0, 4).is_err());
        assert_eq!(rgba_len(8192, 8192), Some(8192 * 8192 * 4));
    }

    #[test]
    fn test_rgba_len_bounds() {
        assert_eq!(rgba_len(2, 3), Some(24));
        assert_eq!(rgba_len(0, 3), None);
        assert_eq!(rgba_len(8193, 8192), None);
        assert_eq!(rgba_len(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_raster_image_empty() {
        let img = RasterImage::new(0, 0, vec![]);
        assert!(img.is_empty());
    }

    #[test]
    fn test_rgba_image_round_trip_keeps_dimensions() {
        let img = RasterImage::new(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let rgba = img.to_rgba_image().unwrap();
        assert_eq!(rgba.dimensions(), (2, 1));
        assert_eq!(RasterImage::from_rgba_image(rgba), img);
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::UnsupportedContainer("image/tiff".to_string());
        assert_eq!(err.to_string(), "Unsupported source container: image/tiff");

        let err = DecodeError::InvalidDimensions {
            width: 0,
            height: 10,
        };
        assert_eq!(err.to_string(), "Invalid dimensions: 0x10");
    }
}
