//! Farbfeld decoder.
//!
//! Forked from zune-farbfeld 0.5.2 by Caleb Etemesi (MIT/Apache-2.0/Zlib).

use alloc::vec::Vec;
use enough::Stop;

use crate::error::ImageError;

const HEADER_LEN: usize = 16;
pub(super) const MAGIC: &[u8; 8] = b"farbfeld";

/// Parse farbfeld header, returning (width, height).
pub(crate) fn parse_header(data: &[u8]) -> Result<(u32, u32), ImageError> {
    let header: &[u8; HEADER_LEN] = data.first_chunk().ok_or(ImageError::UnexpectedEof)?;
    if !header.starts_with(MAGIC) {
        return Err(ImageError::UnrecognizedFormat);
    }
    let field = |at: usize| {
        u32::from_be_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]])
    };
    let (width, height) = (field(8), field(12));
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidHeader(alloc::format!(
            "farbfeld image is {width}x{height}"
        )));
    }
    Ok((width, height))
}

/// Convert big-endian RGBA u16 samples to native-endian `ShortRgba` bytes.
pub(crate) fn decode_pixels(
    data: &[u8],
    width: u32,
    height: u32,
    stop: &dyn Stop,
) -> Result<Vec<u8>, ImageError> {
    let too_large = || ImageError::DimensionsTooLarge {
        width,
        height,
        depth: 1,
    };
    let row_bytes = (width as usize).checked_mul(8).ok_or_else(too_large)?;
    let input_bytes = row_bytes
        .checked_mul(height as usize)
        .ok_or_else(too_large)?;

    let pixel_data = HEADER_LEN
        .checked_add(input_bytes)
        .and_then(|end| data.get(HEADER_LEN..end))
        .ok_or(ImageError::UnexpectedEof)?;

    let mut out = Vec::with_capacity(input_bytes);
    for (row_idx, row) in pixel_data.chunks_exact(row_bytes).enumerate() {
        if row_idx % 16 == 0 {
            stop.check()?;
        }
        for pair in row.chunks_exact(2) {
            let val = u16::from_be_bytes([pair[0], pair[1]]);
            out.extend_from_slice(&val.to_ne_bytes());
        }
    }

    Ok(out)
}
