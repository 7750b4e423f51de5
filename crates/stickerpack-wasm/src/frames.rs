//! Frame extraction WASM bindings.
//!
//! # Functions
//!
//! - [`is_animated`] - Check whether GIF bytes hold more than one frame
//! - [`is_animated_image`] - Same, gated on the file's MIME type
//! - [`count_frames`] - Number of frames in a file
//! - [`extract_frames`] - Every composited frame, for frame pickers
//! - [`extract_frame`] - One frame, index clamped into range
//! - [`extract_frame_as_cover`] - One frame scaled and encoded as PNG
//!
//! # Example
//!
//! ```typescript
//! import { is_animated_image, extract_frames } from '@stickerpack/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! if (is_animated_image(bytes, file.type)) {
//!   const frames = extract_frames(bytes, file.type);
//!   const data = new ImageData(new Uint8ClampedArray(frames[0].pixels()), frames[0].width);
//! }
//! ```

use crate::types::JsFrame;
use stickerpack_core::decode;
use stickerpack_core::encode::ContainerFormat;
use stickerpack_core::surface::ImageSurface;
use stickerpack_core::transcode::{self, ResizeOptions, ResizeSource};
use wasm_bindgen::prelude::*;

/// Default cover size used when the caller has no cover definition.
pub const DEFAULT_COVER_SIZE: u32 = 200;

/// Check whether the bytes are a GIF with at least two frames.
///
/// Walks the block structure only; no pixels are decompressed.
#[wasm_bindgen]
pub fn is_animated(bytes: &[u8]) -> bool {
    decode::is_animated(bytes)
}

/// MIME-aware animation check. Only `image/gif` can be animated.
#[wasm_bindgen]
pub fn is_animated_image(bytes: &[u8], mime_type: &str) -> bool {
    decode::is_animated_image(bytes, mime_type)
}

/// Number of frames (1 for still images, 0 for empty input).
#[wasm_bindgen]
pub fn count_frames(bytes: &[u8], mime_type: &str) -> Result<usize, JsValue> {
    decode::extract_frames(bytes, mime_type)
        .map(|frames| frames.len())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extract every frame, composited onto the logical screen.
#[wasm_bindgen]
pub fn extract_frames(bytes: &[u8], mime_type: &str) -> Result<Vec<JsFrame>, JsValue> {
    decode::extract_frames(bytes, mime_type)
        .map(|frames| frames.into_iter().map(JsFrame::from_frame).collect())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extract one frame; out-of-range indices use the last frame.
#[wasm_bindgen]
pub fn extract_frame(bytes: &[u8], mime_type: &str, index: usize) -> Result<JsFrame, JsValue> {
    decode::extract_frame(bytes, mime_type, index)
        .map(JsFrame::from_frame)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extract one frame and encode it as a PNG cover.
///
/// `width` and `height` of 0 fall back to 200.
#[wasm_bindgen]
pub fn extract_frame_as_cover(
    bytes: &[u8],
    mime_type: &str,
    index: usize,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, JsValue> {
    let frame = decode::extract_frame(bytes, mime_type, index)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let size = |v: u32| if v == 0 { DEFAULT_COVER_SIZE } else { v };

    transcode::resize(
        &ImageSurface::default(),
        ResizeSource::Frame(&frame),
        &ResizeOptions::new(size(width), size(height), ContainerFormat::Png),
    )
    .map(|processed| processed.bytes)
    .map_err(|e| JsValue::from_str(&e.to_string()))
}



/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_count_and_extract() {
        let gif = fixtures::animated_gif(6, 4, 3);
        assert_eq!(count_frames(&gif, "image/gif").unwrap(), 3);

        let frames = extract_frames(&gif, "image/gif").unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].width(), 6);
        assert_eq!(frames[0].delay_ms(), 50);
    }

    #[wasm_bindgen_test]
    fn test_empty_input() {
        assert_eq!(count_frames(&[], "image/gif").unwrap(), 0);
        assert!(extract_frame(&[], "image/gif", 0).is_err());
    }

    #[wasm_bindgen_test]
    fn test_extract_frame_as_cover_default_size() {
        let gif = fixtures::animated_gif(10, 10, 2);
        let png = extract_frame_as_cover(&gif, "image/gif", 5, 0, 0).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[wasm_bindgen_test]
    fn test_extract_frame_invalid_bytes() {
        assert!(extract_frame(&[1, 2, 3], "image/png", 0).is_err());
    }
}
