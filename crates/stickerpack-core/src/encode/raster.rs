//! Single-image encoding for PNG, JPEG, WEBP and still GIF output.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::animation::encode_gif;
use super::{ContainerFormat, EncodeError};
use crate::decode::{Frame, RasterImage};

/// Encode an RGBA raster into `format`.
///
/// # Arguments
///
/// * `image` - RGBA raster to encode
/// * `format` - Target container
/// * `quality` - 0.0 to 1.0; drives JPEG quality and GIF palette sampling,
///   ignored for PNG and (lossless) WEBP
///
/// JPEG has no alpha channel, so transparent pixels are flattened onto black
/// the way a canvas export does.
///
/// # Errors
///
/// Returns an error for zero dimensions, a pixel buffer that doesn't match the
/// dimensions, or an encoder failure.
pub fn encode_raster(
    image: &RasterImage,
    format: ContainerFormat,
    quality: f32,
) -> Result<Vec<u8>, EncodeError> {
    validate(image)?;

    let failed = |e: image::ImageError| EncodeError::EncodingFailed {
        container: format,
        message: e.to_string(),
    };

    let mut buffer = Cursor::new(Vec::new());
    match format {
        ContainerFormat::Png => PngEncoder::new(&mut buffer)
            .write_image(&image.pixels, image.width, image.height, ExtendedColorType::Rgba8)
            .map_err(failed)?,
        ContainerFormat::Jpeg => {
            let rgb = flatten_onto_black(&image.pixels);
            JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality))
                .write_image(&rgb, image.width, image.height, ExtendedColorType::Rgb8)
                .map_err(failed)?
        }
        ContainerFormat::Webp => WebPEncoder::new_lossless(&mut buffer)
            .write_image(&image.pixels, image.width, image.height, ExtendedColorType::Rgba8)
            .map_err(failed)?,
        ContainerFormat::Gif => {
            let frame = Frame::new(image.clone(), 0);
            return encode_gif(std::slice::from_ref(&frame), quality);
        }
    }

    Ok(buffer.into_inner())
}

pub(super) fn validate(image: &RasterImage) -> Result<(), EncodeError> {
    if image.width == 0 || image.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }

    let expected = (image.width as usize) * (image.height as usize) * 4;
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }

    Ok(())
}

/// Map a 0.0-1.0 quality to the JPEG encoder's 1-100 scale.
fn jpeg_quality(quality: f32) -> u8 {
    let scaled = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
    scaled.clamp(1, 100)
}

fn flatten_onto_black(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let alpha = u16::from(px[3]);
        for &channel in &px[..3] {
            rgb.push(((u16::from(channel) * alpha + 127) / 255) as u8);
        }
    }
    rgb
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn container_strategy() -> impl Strategy<Value = ContainerFormat> {
        prop_oneof![
            Just(ContainerFormat::Png),
            Just(ContainerFormat::Jpeg),
            Just(ContainerFormat::Webp),
            Just(ContainerFormat::Gif),
        ]
    }

    proptest! {
        /// Property: Valid rasters encode in every container.
        #[test]
        fn prop_valid_input_encodes(
            (width, height) in (1u32..=24, 1u32..=24),
            format in container_strategy(),
            quality in 0.0f32..=1.0,
        ) {
            let image = RasterImage::new(width, height, vec![90u8; (width * height * 4) as usize]);
            let bytes = encode_raster(&image, format, quality);
            prop_assert!(bytes.is_ok(), "{} should encode", format);
            prop_assert!(!bytes.unwrap().is_empty());
        }

        /// Property: Lossless output decodes back to the requested dimensions.
        #[test]
        fn prop_png_preserves_dimensions((width, height) in (1u32..=32, 1u32..=32)) {
            let image = RasterImage::new(width, height, vec![17u8; (width * height * 4) as usize]);
            let png = encode_raster(&image, ContainerFormat::Png, 0.9).unwrap();
            let decoded = image::load_from_memory(&png).unwrap();
            prop_assert_eq!((decoded.width(), decoded.height()), (width, height));
        }
    }
}
