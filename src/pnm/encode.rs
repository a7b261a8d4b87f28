//! PNM encoder: P5, P6, P7, PFM.
//!
//! Credits: Draws from zune-ppm by Caleb Etemesi (MIT/Apache-2.0/Zlib).

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use enough::Stop;

use crate::error::ImageError;
use crate::pixel::PixelFormat;

/// Encode the base level of a 2D image, choosing the PNM variant from `format`.
pub(crate) fn encode_pnm(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    stop: &dyn Stop,
) -> Result<Vec<u8>, ImageError> {
    let expected = format
        .memory_size(width, height, 1)
        .ok_or(ImageError::DimensionsTooLarge {
            width,
            height,
            depth: 1,
        })?;
    if pixels.len() < expected {
        return Err(ImageError::BufferTooSmall {
            needed: expected,
            actual: pixels.len(),
        });
    }
    let pixels = &pixels[..expected];
    let row_bytes = (width as usize * format.element_size()).max(1);

    stop.check()?;

    match format {
        PixelFormat::L8 => Ok(with_header(format!("P5\n{width} {height}\n255\n"), pixels)),
        PixelFormat::R8G8B8 => Ok(with_header(format!("P6\n{width} {height}\n255\n"), pixels)),
        PixelFormat::R8G8B8A8 => {
            let header = pam_header(width, height, 4, 255, "RGB_ALPHA");
            Ok(with_header(header, pixels))
        }
        PixelFormat::ByteLa => {
            let header = pam_header(width, height, 2, 255, "GRAYSCALE_ALPHA");
            Ok(with_header(header, pixels))
        }
        PixelFormat::L16 => {
            let header = format!("P5\n{width} {height}\n65535\n");
            encode_wide(header, pixels, row_bytes, stop)
        }
        PixelFormat::ShortRgb => {
            let header = format!("P6\n{width} {height}\n65535\n");
            encode_wide(header, pixels, row_bytes, stop)
        }
        PixelFormat::ShortRgba => {
            let header = pam_header(width, height, 4, 65535, "RGB_ALPHA");
            encode_wide(header, pixels, row_bytes, stop)
        }
        PixelFormat::B8G8R8 => {
            let header = format!("P6\n{width} {height}\n255\n");
            encode_swizzled::<3>(header, pixels, row_bytes, stop)
        }
        PixelFormat::B8G8R8A8 => {
            let header = pam_header(width, height, 4, 255, "RGB_ALPHA");
            encode_swizzled::<4>(header, pixels, row_bytes, stop)
        }
        PixelFormat::Float32R => {
            let header = format!("Pf\n{width} {height}\n-1.0\n");
            encode_pfm(header, pixels, row_bytes, stop)
        }
        PixelFormat::Float32Rgb => {
            let header = format!("PF\n{width} {height}\n-1.0\n");
            encode_pfm(header, pixels, row_bytes, stop)
        }
        _ => Err(ImageError::Unsupported(format!(
            "cannot encode {format:?} as PNM"
        ))),
    }
}

fn pam_header(width: u32, height: u32, depth: usize, maxval: u32, tupltype: &str) -> String {
    format!(
        "P7\nWIDTH {width}\nHEIGHT {height}\nDEPTH {depth}\nMAXVAL {maxval}\nTUPLTYPE {tupltype}\nENDHDR\n"
    )
}

fn with_header(header: String, pixels: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(header.len() + pixels.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(pixels);
    out
}

/// Native-endian 16-bit samples to big-endian.
fn encode_wide(
    header: String,
    pixels: &[u8],
    row_bytes: usize,
    stop: &dyn Stop,
) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::with_capacity(header.len() + pixels.len());
    out.extend_from_slice(header.as_bytes());
    for (row_idx, row) in pixels.chunks(row_bytes).enumerate() {
        if row_idx % 16 == 0 {
            stop.check()?;
        }
        for pair in row.chunks_exact(2) {
            let v = u16::from_ne_bytes([pair[0], pair[1]]);
            out.extend_from_slice(&v.to_be_bytes());
        }
    }
    Ok(out)
}

/// Swap the first and third byte of each `N`-byte element (BGR(A) to RGB(A)).
fn encode_swizzled<const N: usize>(
    header: String,
    pixels: &[u8],
    row_bytes: usize,
    stop: &dyn Stop,
) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::with_capacity(header.len() + pixels.len());
    out.extend_from_slice(header.as_bytes());
    for (row_idx, row) in pixels.chunks(row_bytes).enumerate() {
        if row_idx % 16 == 0 {
            stop.check()?;
        }
        let (elements, _) = row.as_chunks::<N>();
        for px in elements {
            let mut px = *px;
            px.swap(0, 2);
            out.extend_from_slice(&px);
        }
    }
    Ok(out)
}

fn encode_pfm(
    header: String,
    pixels: &[u8],
    row_bytes: usize,
    stop: &dyn Stop,
) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::with_capacity(header.len() + pixels.len());
    out.extend_from_slice(header.as_bytes());

    // PFM stores bottom-to-top, little-endian for a negative scale
    for (i, row) in pixels.chunks(row_bytes).rev().enumerate() {
        if i % 16 == 0 {
            stop.check()?;
        }
        for sample in row.chunks_exact(4) {
            let v = f32::from_ne_bytes([sample[0], sample[1], sample[2], sample[3]]);
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    Ok(out)
}
