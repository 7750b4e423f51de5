//! Image decoding pipeline.
//!
//! This module provides functionality for:
//! - Decoding still images (PNG, JPEG, WEBP, GIF) with EXIF orientation applied
//! - Detecting animated GIFs without decompressing pixel data
//! - Extracting fully composited frames from animated GIFs
//! - Scaling rasters to exact dimensions
//!
//! # Architecture
//!
//! The decoding pipeline is designed to be used from the browser via WASM
//! bindings. All operations are synchronous and single-threaded within WASM.
//! Frames are transient: they are produced here and consumed immediately by a
//! resize/encode step or a preview render.
//!
//! # Examples
//!
//! ```ignore
//! use stickerpack_core::decode::{extract_frames, is_animated};
//!
//! let bytes = std::fs::read("wave.gif").unwrap();
//! if is_animated(&bytes) {
//!     let frames = extract_frames(&bytes, "image/gif").unwrap();
//!     println!("{} frames", frames.len());
//! }
//! ```

mod frames;
mod raster;
mod resize;
mod types;

pub use frames::{
    extract_frame, extract_frames, is_animated, is_animated_image, is_gif_mime, GIF_MIME,
    MAX_DECODED_BYTES,
};
pub use raster::{decode_raster, read_orientation, Orientation};
pub use resize::resize;
pub use types::{
    rgba_len, DecodeError, FilterType, Frame, RasterImage, DEFAULT_FRAME_DELAY_MS,
    MAX_CANVAS_PIXELS,
};

#[cfg(test)]
pub(crate) use frames::test_gifs;
