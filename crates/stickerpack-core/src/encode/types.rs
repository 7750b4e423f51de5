//! Output containers and encoding errors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while encoding a raster.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero, or too large for the container
    #[error("Invalid dimensions: {width}x{height} cannot be encoded")]
    InvalidDimensions { width: u32, height: u32 },

    /// Animated output needs at least one frame
    #[error("Cannot encode an animation without frames")]
    NoFrames,

    /// Frames of one animation must share dimensions
    #[error("Frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSizeMismatch {
        index: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    /// The underlying encoder failed
    #[error("{container} encoding failed: {message}")]
    EncodingFailed {
        container: ContainerFormat,
        message: String,
    },
}

/// Target container for an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerFormat {
    #[serde(rename = "png")]
    Png,
    #[serde(rename = "jpg", alias = "jpeg")]
    Jpeg,
    #[serde(rename = "webp")]
    Webp,
    #[serde(rename = "gif")]
    Gif,
}

impl ContainerFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ContainerFormat::Png => "image/png",
            ContainerFormat::Jpeg => "image/jpeg",
            ContainerFormat::Webp => "image/webp",
            ContainerFormat::Gif => "image/gif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ContainerFormat::Png => "png",
            ContainerFormat::Jpeg => "jpg",
            ContainerFormat::Webp => "webp",
            ContainerFormat::Gif => "gif",
        }
    }

    /// Whether this pipeline can write an animated sequence into the container.
    ///
    /// WEBP animation is not written; animated sources targeting WEBP use a
    /// single selected frame.
    pub fn supports_animation(self) -> bool {
        matches!(self, ContainerFormat::Gif)
    }

    /// Look up a container by MIME type, e.g. `image/jpeg`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ContainerFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ContainerFormat::Jpeg),
            "image/webp" => Some(ContainerFormat::Webp),
            "image/gif" => Some(ContainerFormat::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContainerFormat::Png => "PNG",
            ContainerFormat::Jpeg => "JPEG",
            ContainerFormat::Webp => "WEBP",
            ContainerFormat::Gif => "GIF",
        })
    }
}

impl FromStr for ContainerFormat {
    type Err = String;

    /// Parses short names (`png`, `jpg`, `jpeg`, `webp`, `gif`) or MIME types.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ContainerFormat::Png),
            "jpg" | "jpeg" => Ok(ContainerFormat::Jpeg),
            "webp" => Ok(ContainerFormat::Webp),
            "gif" => Ok(ContainerFormat::Gif),
            other => {
                ContainerFormat::from_mime_type(other).ok_or_else(|| format!("Unknown container: {s}"))
            }
        }
    }
}
