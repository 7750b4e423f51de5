//! WASM-compatible wrapper types for frames and transcoded images.
//!
//! This module provides JavaScript-friendly types that wrap the core stickerpack
//! types, handling the conversion between Rust and JavaScript data representations.

use stickerpack_core::decode::{FilterType, Frame, RasterImage};
use stickerpack_core::encode::ContainerFormat;
use stickerpack_core::ProcessedImage;
use wasm_bindgen::prelude::*;

/// One composited frame of an animated image.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`, ready for `new ImageData(...)`.
#[wasm_bindgen]
pub struct JsFrame {
    width: u32,
    height: u32,
    delay_ms: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsFrame {
    /// Create a frame from RGBA pixel data (4 bytes per pixel, row-major order).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, delay_ms: u32, pixels: Vec<u8>) -> JsFrame {
        JsFrame {
            width,
            height,
            delay_ms,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Display time of this frame in milliseconds
    #[wasm_bindgen(getter)]
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl JsFrame {
    pub(crate) fn from_frame(frame: Frame) -> Self {
        Self {
            width: frame.image.width,
            height: frame.image.height,
            delay_ms: frame.delay_ms,
            pixels: frame.image.pixels,
        }
    }

    /// Clones the pixel data.
    pub(crate) fn to_frame(&self) -> Frame {
        Frame::new(
            RasterImage::new(self.width, self.height, self.pixels.clone()),
            self.delay_ms,
        )
    }
}

/// Encoded output of a resize or re-encode.
#[wasm_bindgen]
pub struct JsProcessedImage {
    bytes: Vec<u8>,
    mime_type: String,
    width: u32,
    height: u32,
}

#[wasm_bindgen]
impl JsProcessedImage {
    /// Encoded file bytes as a `Uint8Array` (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl From<ProcessedImage> for JsProcessedImage {
    fn from(image: ProcessedImage) -> Self {
        Self {
            bytes: image.bytes,
            mime_type: image.mime_type.to_string(),
            width: image.width,
            height: image.height,
        }
    }
}

/// Convert a u8 filter type value to the core FilterType enum.
///
/// Values:
/// - 0 = Nearest
/// - 1 = Bilinear (canvas default)
/// - 2 = Lanczos3
///
/// Any other value defaults to Bilinear.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        2 => FilterType::Lanczos3,
        _ => FilterType::Bilinear,
    }
}

/// Parse a container name (`png`, `jpg`, `jpeg`, `webp`, `gif`) or MIME type.
pub(crate) fn container_from_str(value: &str) -> Result<ContainerFormat, JsValue> {
    value.parse().map_err(|e: String| JsValue::from_str(&e))
}
