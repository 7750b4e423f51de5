//! The raster surface: decode, scale and encode behind one narrow trait.
//!
//! In the browser this is the job of an off-screen canvas. Keeping it behind a
//! trait lets the transcoding and export logic run against a counting or
//! failing surface in tests.

use crate::decode::{self, DecodeError, FilterType, Frame, RasterImage};
use crate::encode::{self, ContainerFormat, EncodeError};

/// Decode/scale/encode capability used by the transcoder.
pub trait RasterSurface {
    /// Decode encoded bytes to an RGBA raster.
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError>;

    /// Scale a raster to exactly `width` x `height`.
    fn scale(&self, image: &RasterImage, width: u32, height: u32)
        -> Result<RasterImage, DecodeError>;

    /// Encode a raster into a still container.
    fn encode(
        &self,
        image: &RasterImage,
        format: ContainerFormat,
        quality: f32,
    ) -> Result<Vec<u8>, EncodeError>;

    /// Encode a frame sequence into an animated GIF.
    fn encode_animation(&self, frames: &[Frame], quality: f32) -> Result<Vec<u8>, EncodeError>;
}

/// Default surface backed by the `image` and `gif` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageSurface {
    filter: FilterType,
}

impl ImageSurface {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }
}

impl RasterSurface for ImageSurface {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError> {
        decode::decode_raster(bytes)
    }

    fn scale(
        &self,
        image: &RasterImage,
        width: u32,
        height: u32,
    ) -> Result<RasterImage, DecodeError> {
        decode::resize(image, width, height, self.filter)
    }

    fn encode(
        &self,
        image: &RasterImage,
        format: ContainerFormat,
        quality: f32,
    ) -> Result<Vec<u8>, EncodeError> {
        encode::encode_raster(image, format, quality)
    }

    fn encode_animation(&self, frames: &[Frame], quality: f32) -> Result<Vec<u8>, EncodeError> {
        encode::encode_gif(frames, quality)
    }
}

impl<S: RasterSurface + ?Sized> RasterSurface for &S {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError> {
        (**self).decode(bytes)
    }

    fn scale(
        &self,
        image: &RasterImage,
        width: u32,
        height: u32,
    ) -> Result<RasterImage, DecodeError> {
        (**self).scale(image, width, height)
    }

    fn encode(
        &self,
        image: &RasterImage,
        format: ContainerFormat,
        quality: f32,
    ) -> Result<Vec<u8>, EncodeError> {
        (**self).encode(image, format, quality)
    }

    fn encode_animation(&self, frames: &[Frame], quality: f32) -> Result<Vec<u8>, EncodeError> {
        (**self).encode_animation(frames, quality)
    }
}
