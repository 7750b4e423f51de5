//! GIF writing for still and animated output.
//!
//! Each frame is quantized to a 256-colour palette with the `gif` crate's
//! NeuQuant quantizer. The quantizer's sampling speed is derived from the
//! 0.0-1.0 quality knob the same way the browser encoder maps it.

use gif::{DisposalMethod, Encoder, Repeat};

use super::raster::validate;
use super::{ContainerFormat, EncodeError};
use crate::decode::Frame;

/// Encode frames into one GIF. More than one frame produces a looping animation.
///
/// All frames must share dimensions, and those dimensions must fit the
/// format's 16-bit size fields.
///
/// # Errors
///
/// Returns `EncodeError::NoFrames` for an empty slice, a size error for
/// mismatched or oversized frames, or the writer's failure.
pub fn encode_gif(frames: &[Frame], quality: f32) -> Result<Vec<u8>, EncodeError> {
    let first = frames.first().ok_or(EncodeError::NoFrames)?;
    let (width, height) = (first.width(), first.height());

    let (Ok(gif_width), Ok(gif_height)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(EncodeError::InvalidDimensions { width, height });
    };

    for (index, frame) in frames.iter().enumerate() {
        validate(&frame.image)?;
        if frame.width() != width || frame.height() != height {
            return Err(EncodeError::FrameSizeMismatch {
                index,
                width: frame.width(),
                height: frame.height(),
                expected_width: width,
                expected_height: height,
            });
        }
    }

    let failed = |e: gif::EncodingError| EncodeError::EncodingFailed {
        container: ContainerFormat::Gif,
        message: e.to_string(),
    };

    let speed = quantizer_speed(quality);
    let animated = frames.len() > 1;
    let mut buffer = Vec::new();
    {
        let mut encoder = Encoder::new(&mut buffer, gif_width, gif_height, &[]).map_err(failed)?;
        if animated {
            encoder.set_repeat(Repeat::Infinite).map_err(failed)?;
        }

        for frame in frames {
            let mut pixels = frame.image.pixels.clone();
            let mut gif_frame =
                gif::Frame::from_rgba_speed(gif_width, gif_height, &mut pixels, speed);
            if animated {
                gif_frame.delay = delay_centiseconds(frame.delay_ms);
                gif_frame.dispose = DisposalMethod::Background;
            }
            encoder.write_frame(&gif_frame).map_err(failed)?;
        }
    }

    Ok(buffer)
}

/// NeuQuant sampling factor: 1 is best, 30 fastest.
fn quantizer_speed(quality: f32) -> i32 {
    ((quality * 10.0).round() as i32).clamp(1, 30)
}

fn delay_centiseconds(delay_ms: u32) -> u16 {
    (delay_ms.saturating_add(5) / 10).min(u32::from(u16::MAX)) as u16
}
