//! Frame extraction for animated GIFs and static rasters.
//!
//! Animated GIFs are decoded record by record with the `gif` crate. Each record's
//! RGBA patch is written over a running canvas the size of the logical screen,
//! and a snapshot of the whole canvas becomes that record's frame. Disposal
//! methods are not interpreted: a patch simply overwrites what is below it.

use std::io::Cursor;

use gif::{ColorOutput, DecodeOptions};

use super::{decode_raster, DecodeError, Frame, RasterImage, DEFAULT_FRAME_DELAY_MS};

/// MIME type of the only container treated as animated.
pub const GIF_MIME: &str = "image/gif";

/// Upper bound on the summed size of all snapshots from one GIF.
pub const MAX_DECODED_BYTES: usize = 512 * 1024 * 1024;

const GIF_TRAILER: u8 = 0x3B;
const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_SEPARATOR: u8 = 0x2C;

pub fn is_gif_mime(mime: &str) -> bool {
    mime.trim().eq_ignore_ascii_case(GIF_MIME)
}

/// Cheap check for a GIF carrying more than one image.
///
/// Walks the block structure (headers, color tables, extension and image data
/// sub-blocks) without decompressing any pixels. Empty, truncated, or non-GIF
/// input answers `false`.
pub fn is_animated(bytes: &[u8]) -> bool {
    count_image_descriptors(bytes, 2) >= 2
}

/// MIME-aware variant of [`is_animated`]: only GIF sources are ever animated,
/// WEBP and everything else is handled as a still image.
pub fn is_animated_image(bytes: &[u8], mime: &str) -> bool {
    is_gif_mime(mime) && is_animated(bytes)
}

/// Extract every composited frame of a source image.
///
/// GIF sources yield one frame per image record; any other decodable raster
/// yields a single frame. Empty input yields no frames.
///
/// # Errors
///
/// Returns `DecodeError` when the container is malformed or cannot be decoded,
/// when a GIF's logical screen exceeds [`super::MAX_CANVAS_PIXELS`], or when its
/// snapshots together exceed [`MAX_DECODED_BYTES`].
pub fn extract_frames(bytes: &[u8], mime: &str) -> Result<Vec<Frame>, DecodeError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    if is_gif_mime(mime) {
        extract_gif_frames(bytes)
    } else {
        let image = decode_raster(bytes)?;
        Ok(vec![Frame::new(image, DEFAULT_FRAME_DELAY_MS)])
    }
}

/// Extract a single frame, clamping `index` into the available range.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` when the source has no frames at all.
pub fn extract_frame(bytes: &[u8], mime: &str, index: usize) -> Result<Frame, DecodeError> {
    let mut frames = extract_frames(bytes, mime)?;
    if frames.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }
    let index = index.min(frames.len() - 1);
    Ok(frames.swap_remove(index))
}

fn extract_gif_frames(bytes: &[u8]) -> Result<Vec<Frame>, DecodeError> {
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::RGBA);

    let mut decoder = options
        .read_info(Cursor::new(bytes))
        .map_err(|e| DecodeError::CorruptedFile(format!("GIF header: {e}")))?;

    let width = u32::from(decoder.width());
    let height = u32::from(decoder.height());
    let mut canvas = RasterImage::blank(width, height)?;
    let mut frames = Vec::new();
    let mut decoded_bytes = 0usize;

    while let Some(record) = decoder
        .read_next_frame()
        .map_err(|e| DecodeError::CorruptedFile(format!("GIF frame {}: {e}", frames.len())))?
    {
        let patch = Patch {
            left: u32::from(record.left),
            top: u32::from(record.top),
            width: u32::from(record.width),
            height: u32::from(record.height),
            pixels: &record.buffer,
        };
        blit_patch(&mut canvas, &patch)?;

        decoded_bytes = decoded_bytes.saturating_add(canvas.byte_size());
        if decoded_bytes > MAX_DECODED_BYTES {
            return Err(DecodeError::TooLarge {
                frames: frames.len() + 1,
                limit: MAX_DECODED_BYTES,
            });
        }
        frames.push(Frame::new(canvas.clone(), delay_ms(record.delay)));
    }

    Ok(frames)
}

fn delay_ms(centiseconds: u16) -> u32 {
    match centiseconds {
        0 => DEFAULT_FRAME_DELAY_MS,
        cs => u32::from(cs) * 10,
    }
}

struct Patch<'a> {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

/// Overwrite `patch` onto `canvas` at its offset, clipping at the canvas edges.
fn blit_patch(canvas: &mut RasterImage, patch: &Patch<'_>) -> Result<(), DecodeError> {
    let expected = (patch.width as usize) * (patch.height as usize) * 4;
    if patch.pixels.len() < expected {
        return Err(DecodeError::CorruptedFile(format!(
            "GIF patch holds {} bytes, expected {expected}",
            patch.pixels.len()
        )));
    }

    if patch.left >= canvas.width || patch.top >= canvas.height {
        return Ok(());
    }

    let visible_width = patch.width.min(canvas.width - patch.left) as usize;
    let visible_height = patch.height.min(canvas.height - patch.top) as usize;
    let src_stride = patch.width as usize * 4;
    let dst_stride = canvas.width as usize * 4;

    for row in 0..visible_height {
        let src_start = row * src_stride;
        let dst_start = (patch.top as usize + row) * dst_stride + patch.left as usize * 4;
        let len = visible_width * 4;
        canvas.pixels[dst_start..dst_start + len]
            .copy_from_slice(&patch.pixels[src_start..src_start + len]);
    }

    Ok(())
}

/// Count image descriptors in a GIF, stopping early once `limit` is reached.
fn count_image_descriptors(bytes: &[u8], limit: usize) -> usize {
    if bytes.len() < 13 || &bytes[0..3] != b"GIF" {
        return 0;
    }

    let screen_flags = bytes[10];
    let mut pos = 13 + color_table_len(screen_flags);
    let mut count = 0;

    while let Some(&block) = bytes.get(pos) {
        match block {
            EXTENSION_INTRODUCER => {
                // introducer + label, then data sub-blocks
                match skip_sub_blocks(bytes, pos + 2) {
                    Some(next) => pos = next,
                    None => break,
                }
            }
            IMAGE_SEPARATOR => {
                count += 1;
                if count >= limit {
                    break;
                }
                let Some(&image_flags) = bytes.get(pos + 9) else {
                    break;
                };
                // descriptor (10 bytes), local color table, LZW minimum code size
                let data_start = pos + 10 + color_table_len(image_flags) + 1;
                match skip_sub_blocks(bytes, data_start) {
                    Some(next) => pos = next,
                    None => break,
                }
            }
            GIF_TRAILER => break,
            _ => break,
        }
    }

    count
}

fn color_table_len(flags: u8) -> usize {
    if flags & 0x80 == 0 {
        0
    } else {
        3 * (1usize << ((flags & 0x07) + 1))
    }
}

/// Skip a chain of data sub-blocks, returning the position after the terminator.
fn skip_sub_blocks(bytes: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let size = *bytes.get(pos)? as usize;
        pos += 1;
        if size == 0 {
            return Some(pos);
        }
        pos += size;
    }
}
