//! Resize/transcode and naming WASM bindings.
//!
//! # Example
//!
//! ```typescript
//! import { resize_image, generate_file_name } from '@stickerpack/wasm';
//!
//! const out = resize_image(bytes, 300, 300, 'png', 0.9, 1);
//! const name = generate_file_name('{name}_{index:02d}.png', 'smile', 1);
//! ```

use crate::types::{container_from_str, filter_from_u8, JsFrame, JsProcessedImage};
use stickerpack_core::naming::{self, NameValidationRule};
use stickerpack_core::surface::ImageSurface;
use stickerpack_core::transcode::{self, AnimatedOptions, ResizeOptions, ResizeSource};
use wasm_bindgen::prelude::*;

/// Decode, scale to exactly `width` x `height`, and encode.
///
/// # Arguments
///
/// * `format` - `png`, `jpg`/`jpeg`, `webp`, `gif`, or a MIME type
/// * `quality` - 0.0 to 1.0
/// * `filter` - 0 = Nearest, 1 = Bilinear, 2 = Lanczos3
#[wasm_bindgen]
pub fn resize_image(
    bytes: &[u8],
    width: u32,
    height: u32,
    format: &str,
    quality: f32,
    filter: u8,
) -> Result<JsProcessedImage, JsValue> {
    let options = ResizeOptions::new(width, height, container_from_str(format)?).with_quality(quality);
    transcode::resize(
        &ImageSurface::new(filter_from_u8(filter)),
        ResizeSource::Bytes(bytes),
        &options,
    )
    .map(JsProcessedImage::from)
    .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Scale an already extracted frame and encode it.
#[wasm_bindgen]
pub fn resize_frame(
    frame: &JsFrame,
    width: u32,
    height: u32,
    format: &str,
    quality: f32,
    filter: u8,
) -> Result<JsProcessedImage, JsValue> {
    let options = ResizeOptions::new(width, height, container_from_str(format)?).with_quality(quality);
    let frame = frame.to_frame();
    transcode::resize(
        &ImageSurface::new(filter_from_u8(filter)),
        ResizeSource::Frame(&frame),
        &options,
    )
    .map(JsProcessedImage::from)
    .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Re-encode a GIF's frames at a new size, keeping the animation.
#[wasm_bindgen]
pub fn resize_animated(
    bytes: &[u8],
    mime_type: &str,
    width: u32,
    height: u32,
    quality: f32,
    filter: u8,
) -> Result<JsProcessedImage, JsValue> {
    let frames = stickerpack_core::decode::extract_frames(bytes, mime_type)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    transcode::reencode_animated(
        &ImageSurface::new(filter_from_u8(filter)),
        &frames,
        &AnimatedOptions::new(width, height).with_quality(quality),
    )
    .map(JsProcessedImage::from)
    .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Expand `{name}`, `{index}` and `{index:0Nd}` in a filename template.
#[wasm_bindgen]
pub fn generate_file_name(template: &str, name: &str, index: usize) -> String {
    naming::generate_file_name(template, name, index)
}

/// Name length where characters outside the BMP count 2.
#[wasm_bindgen]
pub fn display_length(name: &str) -> usize {
    naming::display_length(name)
}

/// Check a name against a rule object `{ maxLength?, allowedChars? }`.
///
/// `null` or `undefined` accepts every name.
#[wasm_bindgen]
pub fn validate_image_name(name: &str, rule: JsValue) -> Result<bool, JsValue> {
    if rule.is_null() || rule.is_undefined() {
        return Ok(true);
    }
    let rule: NameValidationRule = serde_wasm_bindgen::from_value(rule)
        .map_err(|e| JsValue::from_str(&format!("Invalid name rule: {}", e)))?;
    Ok(naming::validate_image_name(name, Some(&rule)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_file_name() {
        assert_eq!(generate_file_name("{name}_{index:02d}.gif", "smile", 1), "smile_01.gif");
        assert_eq!(generate_file_name("{index:03d}.png", "x", 12), "012.png");
    }

    #[test]
    fn test_display_length() {
        assert_eq!(display_length("开心ab"), 4);
        assert_eq!(display_length("😀ab"), 4);
    }
}

/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::frames::fixtures;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_resize_image_to_jpeg() {
        let gif = fixtures::animated_gif(8, 8, 1);
        let out = resize_image(&gif, 16, 12, "jpeg", 0.8, 1).unwrap();
        assert_eq!(out.mime_type(), "image/jpeg");
        assert_eq!((out.width(), out.height()), (16, 12));
        assert_eq!(&out.bytes()[0..2], &[0xFF, 0xD8]);
    }

    #[wasm_bindgen_test]
    fn test_resize_image_bad_format() {
        let gif = fixtures::animated_gif(8, 8, 1);
        assert!(resize_image(&gif, 16, 16, "bmp", 0.9, 1).is_err());
        assert!(resize_image(&gif, 0, 16, "png", 0.9, 1).is_err());
    }

    #[wasm_bindgen_test]
    fn test_resize_animated_keeps_frames() {
        let gif = fixtures::animated_gif(8, 8, 3);
        let out = resize_animated(&gif, "image/gif", 4, 4, 0.9, 1).unwrap();
        assert!(crate::frames::is_animated(&out.bytes()));
    }

    #[wasm_bindgen_test]
    fn test_resize_frame() {
        let frame = JsFrame::new(2, 2, 100, vec![255u8; 16]);
        let out = resize_frame(&frame, 4, 4, "png", 0.9, 0).unwrap();
        assert_eq!(out.mime_type(), "image/png");
    }

    #[wasm_bindgen_test]
    fn test_validate_image_name() {
        let rule = js_sys::JSON::parse(r#"{"maxLength": 8, "allowedChars": ["cjkIdeograph", "asciiLetter"]}"#)
            .unwrap();
        assert!(validate_image_name("开心", rule.clone()).unwrap());
        assert!(validate_image_name("开心开心开心", rule.clone()).unwrap());
        assert!(!validate_image_name("开心开心开心开心呀", rule.clone()).unwrap());
        assert!(!validate_image_name("a1", rule).unwrap());
        assert!(validate_image_name("", JsValue::NULL).unwrap());
        assert!(validate_image_name("x", JsValue::from_f64(3.0)).is_err());
    }
}
