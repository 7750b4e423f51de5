//! Image encoding pipeline.
//!
//! This module provides functionality for:
//! - Encoding RGBA rasters to PNG, JPEG, lossless WEBP and still GIF
//! - Encoding frame sequences to a looping animated GIF
//!
//! # Architecture
//!
//! The encoding pipeline is designed to be used from the browser via WASM
//! bindings. All operations are synchronous and single-threaded within WASM.
//!
//! # Examples
//!
//! ```ignore
//! use stickerpack_core::decode::RasterImage;
//! use stickerpack_core::encode::{encode_raster, ContainerFormat};
//!
//! let image = RasterImage::new(100, 100, vec![128u8; 100 * 100 * 4]);
//! let png = encode_raster(&image, ContainerFormat::Png, 0.9).unwrap();
//! println!("Encoded {} bytes", png.len());
//! ```

mod animation;
mod raster;
mod types;

pub use animation::encode_gif;
pub use raster::encode_raster;
pub use types::{ContainerFormat, EncodeError};
