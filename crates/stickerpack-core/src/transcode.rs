//! Resize/transcode and animated re-encode.
//!
//! These are the per-item steps of an export: a still source (encoded bytes
//! or one pre-extracted frame) is scaled and written into a target container,
//! or a whole frame sequence is scaled and written back out as an animated GIF.
//! A failure here concerns one item only; the caller decides what happens to
//! the rest of its batch.

use thiserror::Error;
use tracing::debug;

use crate::decode::{DecodeError, Frame};
use crate::encode::{ContainerFormat, EncodeError};
use crate::surface::RasterSurface;

/// Default quality used across exports (canvas `toBlob` default in the front-end).
pub const DEFAULT_QUALITY: f32 = 0.9;

/// Errors from a single resize or re-encode.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("Invalid target size {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },

    #[error("Source has no frames")]
    NoFrames,
}

/// What to resize: encoded file bytes, or a frame that is already composited.
#[derive(Debug, Clone, Copy)]
pub enum ResizeSource<'a> {
    Bytes(&'a [u8]),
    Frame(&'a Frame),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    pub width: u32,
    pub height: u32,
    pub format: ContainerFormat,
    /// 0.0 to 1.0; only meaningful for lossy and palette containers.
    pub quality: f32,
}

impl ResizeOptions {
    pub fn new(width: u32, height: u32, format: ContainerFormat) -> Self {
        Self {
            width,
            height,
            format,
            quality: DEFAULT_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatedOptions {
    pub width: u32,
    pub height: u32,
    pub quality: f32,
}

impl AnimatedOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            quality: DEFAULT_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }
}

/// Encoded output of one transcode step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Scale a still source to the target size and encode it.
///
/// # Errors
///
/// Returns `TranscodeError::InvalidTarget` for zero dimensions, otherwise the
/// decode or encode failure reported by the surface.
pub fn resize<S: RasterSurface + ?Sized>(
    surface: &S,
    source: ResizeSource<'_>,
    options: &ResizeOptions,
) -> Result<ProcessedImage, TranscodeError> {
    check_target(options.width, options.height)?;

    let scaled = match source {
        ResizeSource::Bytes(bytes) => {
            let decoded = surface.decode(bytes)?;
            surface.scale(&decoded, options.width, options.height)?
        }
        ResizeSource::Frame(frame) => surface.scale(&frame.image, options.width, options.height)?,
    };

    let bytes = surface.encode(&scaled, options.format, options.quality)?;
    debug!(
        width = options.width,
        height = options.height,
        format = %options.format,
        size = bytes.len(),
        "resized image"
    );

    Ok(ProcessedImage {
        bytes,
        mime_type: options.format.mime_type(),
        width: options.width,
        height: options.height,
    })
}

/// Scale every frame to the target size and write them as one animated GIF.
///
/// Frame delays are kept as-is. The whole scaled sequence is held in memory
/// while encoding.
///
/// # Errors
///
/// Returns `TranscodeError::NoFrames` for an empty sequence; any scale or encode
/// failure fails the whole item.
pub fn reencode_animated<S: RasterSurface + ?Sized>(
    surface: &S,
    frames: &[Frame],
    options: &AnimatedOptions,
) -> Result<ProcessedImage, TranscodeError> {
    check_target(options.width, options.height)?;
    if frames.is_empty() {
        return Err(TranscodeError::NoFrames);
    }

    let scaled = frames
        .iter()
        .map(|frame| {
            surface
                .scale(&frame.image, options.width, options.height)
                .map(|image| Frame::new(image, frame.delay_ms))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let bytes = surface.encode_animation(&scaled, options.quality)?;
    debug!(
        frames = scaled.len(),
        width = options.width,
        height = options.height,
        size = bytes.len(),
        "re-encoded animation"
    );

    Ok(ProcessedImage {
        bytes,
        mime_type: ContainerFormat::Gif.mime_type(),
        width: options.width,
        height: options.height,
    })
}

fn check_target(width: u32, height: u32) -> Result<(), TranscodeError> {
    if width == 0 || height == 0 {
        return Err(TranscodeError::InvalidTarget { width, height });
    }
    Ok(())
}
