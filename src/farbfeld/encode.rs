//! Farbfeld encoder.
//!
//! Forked from zune-farbfeld 0.5.2 by Caleb Etemesi (MIT/Apache-2.0/Zlib).

use alloc::vec::Vec;
use enough::Stop;

use crate::error::ImageError;
use crate::pixel::PixelFormat;

#[derive(Clone, Copy)]
enum Source {
    Rgba16,
    Rgba8,
    Rgb8,
    Gray8,
}

/// Encode the base level of a 2D image as farbfeld.
///
/// Accepts `ShortRgba` (direct), `R8G8B8A8` (expand via `val * 257`),
/// `R8G8B8` (expand + alpha=65535) and `L8` (replicate + alpha=65535).
pub(crate) fn encode_farbfeld(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    stop: &dyn Stop,
) -> Result<Vec<u8>, ImageError> {
    let source = match format {
        PixelFormat::ShortRgba => Source::Rgba16,
        PixelFormat::R8G8B8A8 => Source::Rgba8,
        PixelFormat::R8G8B8 => Source::Rgb8,
        PixelFormat::L8 => Source::Gray8,
        _ => {
            return Err(ImageError::Unsupported(alloc::format!(
                "cannot encode {format:?} as farbfeld (supported: ShortRgba, R8G8B8A8, R8G8B8, L8)"
            )));
        }
    };
    let too_large = || ImageError::DimensionsTooLarge {
        width,
        height,
        depth: 1,
    };
    let expected = format.memory_size(width, height, 1).ok_or_else(too_large)?;
    if pixels.len() < expected {
        return Err(ImageError::BufferTooSmall {
            needed: expected,
            actual: pixels.len(),
        });
    }
    let pixels = &pixels[..expected];

    // Output: 16 header + w*h*8 pixel bytes
    let total = PixelFormat::ShortRgba
        .memory_size(width, height, 1)
        .and_then(|n| n.checked_add(16))
        .ok_or_else(too_large)?;
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(super::decode::MAGIC);
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&height.to_be_bytes());

    stop.check()?;

    let row_bytes = width as usize * format.element_size();
    if row_bytes == 0 {
        return Ok(out);
    }
    let push = |out: &mut Vec<u8>, v: u16| out.extend_from_slice(&v.to_be_bytes());

    for (row_idx, row) in pixels.chunks_exact(row_bytes).enumerate() {
        if row_idx % 16 == 0 {
            stop.check()?;
        }
        match source {
            Source::Rgba16 => {
                for pair in row.chunks_exact(2) {
                    push(&mut out, u16::from_ne_bytes([pair[0], pair[1]]));
                }
            }
            Source::Rgba8 => {
                for &byte in row {
                    push(&mut out, u16::from(byte) * 257);
                }
            }
            Source::Rgb8 => {
                for px in row.chunks_exact(3) {
                    for &byte in px {
                        push(&mut out, u16::from(byte) * 257);
                    }
                    push(&mut out, u16::MAX);
                }
            }
            Source::Gray8 => {
                for &byte in row {
                    let val = u16::from(byte) * 257;
                    push(&mut out, val);
                    push(&mut out, val);
                    push(&mut out, val);
                    push(&mut out, u16::MAX);
                }
            }
        }
    }

    Ok(out)
}
