//! Resampling between pixel regions of different size and format.
//!
//! Nearest sampling copies raw elements and is specialised on element byte
//! width. Linear sampling has three paths: integer math on 8-bit channel
//! formats, direct math on 32-bit float RGB(A), and a generic path that
//! unpacks to [`Colour`](crate::Colour) and works for every accessible format.

mod linear;
mod nearest;

use alloc::format;
use alloc::vec;

use crate::error::ImageError;
use crate::pixel::PixelFormat;
use crate::pixel_box::{PixelBox, PixelBoxMut, bulk_convert};

/// Interpolation used by [`scale`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Nearest neighbour.
    Nearest,
    /// Linear interpolation; identical to [`Filter::Bilinear`].
    Linear,
    /// Bilinear (trilinear for volumes) interpolation.
    #[default]
    Bilinear,
}

/// Formats handled by the integer linear path.
fn is_byte_format(format: PixelFormat) -> bool {
    matches!(
        format,
        PixelFormat::L8
            | PixelFormat::R8
            | PixelFormat::A8
            | PixelFormat::ByteLa
            | PixelFormat::R8G8B8
            | PixelFormat::B8G8R8
            | PixelFormat::R8G8B8A8
            | PixelFormat::B8G8R8A8
            | PixelFormat::A8B8G8R8
            | PixelFormat::A8R8G8B8
            | PixelFormat::X8B8G8R8
            | PixelFormat::X8R8G8B8
    )
}

fn is_float32_colour(format: PixelFormat) -> bool {
    matches!(format, PixelFormat::Float32Rgb | PixelFormat::Float32Rgba)
}

/// Resample `src` into `dst`, converting pixel format if the two differ.
///
/// Compressed and unknown formats are rejected before any sampling.
pub fn scale(
    src: &PixelBox<'_>,
    dst: &mut PixelBoxMut<'_>,
    filter: Filter,
) -> Result<(), ImageError> {
    for format in [src.format, dst.format] {
        if !format.is_accessible() {
            return Err(ImageError::Unsupported(format!(
                "cannot scale {format:?} pixels"
            )));
        }
    }
    if dst.width == 0 || dst.height == 0 || dst.depth == 0 {
        return Ok(());
    }
    if src.width == 0 || src.height == 0 || src.depth == 0 {
        return Err(ImageError::InvalidParameters(format!(
            "cannot scale empty {}x{}x{} region into {}x{}x{}",
            src.width, src.height, src.depth, dst.width, dst.height, dst.depth
        )));
    }

    match filter {
        Filter::Nearest => via_source_format(src, dst, dispatch_nearest),
        Filter::Linear | Filter::Bilinear => {
            if is_byte_format(src.format) {
                log::trace!("linear scale: byte path for {:?}", src.format);
                via_source_format(src, dst, dispatch_linear_bytes)
            } else if is_float32_colour(src.format) && is_float32_colour(dst.format) {
                log::trace!("linear scale: float32 path");
                linear::scale_float32(src, dst);
                Ok(())
            } else {
                log::trace!(
                    "linear scale: generic path {:?} -> {:?}",
                    src.format,
                    dst.format
                );
                linear::scale_generic(src, dst);
                Ok(())
            }
        }
    }
}

/// Run a same-format resampler, staging through a temporary buffer in the
/// source format when the destination format differs.
fn via_source_format(
    src: &PixelBox<'_>,
    dst: &mut PixelBoxMut<'_>,
    resample: fn(&PixelBox<'_>, &mut PixelBoxMut<'_>) -> Result<(), ImageError>,
) -> Result<(), ImageError> {
    if src.format == dst.format {
        return resample(src, dst);
    }
    let size = src
        .format
        .memory_size(dst.width, dst.height, dst.depth)
        .ok_or(ImageError::DimensionsTooLarge {
            width: dst.width,
            height: dst.height,
            depth: dst.depth,
        })?;
    let mut staging = vec![0u8; size];
    let mut temp = PixelBoxMut::new(&mut staging, dst.width, dst.height, dst.depth, src.format)?;
    resample(src, &mut temp)?;
    bulk_convert(&temp.as_box(), dst)
}

fn dispatch_nearest(src: &PixelBox<'_>, dst: &mut PixelBoxMut<'_>) -> Result<(), ImageError> {
    match src.format.element_size() {
        1 => nearest::scale::<1>(src, dst),
        2 => nearest::scale::<2>(src, dst),
        3 => nearest::scale::<3>(src, dst),
        4 => nearest::scale::<4>(src, dst),
        6 => nearest::scale::<6>(src, dst),
        8 => nearest::scale::<8>(src, dst),
        12 => nearest::scale::<12>(src, dst),
        16 => nearest::scale::<16>(src, dst),
        n => {
            return Err(ImageError::Internal(format!(
                "no nearest resampler for {n}-byte elements"
            )));
        }
    }
    Ok(())
}

fn dispatch_linear_bytes(
    src: &PixelBox<'_>,
    dst: &mut PixelBoxMut<'_>,
) -> Result<(), ImageError> {
    match src.format.element_size() {
        1 => linear::scale_bytes::<1>(src, dst),
        2 => linear::scale_bytes::<2>(src, dst),
        3 => linear::scale_bytes::<3>(src, dst),
        4 => linear::scale_bytes::<4>(src, dst),
        n => {
            return Err(ImageError::Internal(format!(
                "no byte resampler for {n}-byte elements"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Colour;
    use alloc::vec::Vec;

    fn noise(len: usize) -> Vec<u8> {
        let mut state: u32 = 0xDEAD_BEEF;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect()
    }

    #[test]
    fn nearest_identity_is_byte_exact() {
        for format in [
            PixelFormat::L8,
            PixelFormat::ByteLa,
            PixelFormat::R8G8B8,
            PixelFormat::R8G8B8A8,
            PixelFormat::ShortRgb,
            PixelFormat::ShortRgba,
            PixelFormat::Float32Rgb,
            PixelFormat::Float32Rgba,
        ] {
            let data = noise(format.memory_size(5, 3, 2).unwrap());
            let src = PixelBox::new(&data, 5, 3, 2, format).unwrap();
            let mut out = vec![0u8; data.len()];
            let mut dst = PixelBoxMut::new(&mut out, 5, 3, 2, format).unwrap();
            scale(&src, &mut dst, Filter::Nearest).unwrap();
            assert_eq!(out, data, "{format:?}");
        }
    }

    #[test]
    fn linear_identity_is_byte_exact() {
        let data = noise(7 * 5 * 4);
        let src = PixelBox::new(&data, 7, 5, 1, PixelFormat::R8G8B8A8).unwrap();
        let mut out = vec![0u8; data.len()];
        let mut dst = PixelBoxMut::new(&mut out, 7, 5, 1, PixelFormat::R8G8B8A8).unwrap();
        scale(&src, &mut dst, Filter::Bilinear).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn nearest_picks_floor_of_scaled_index() {
        // 4 wide -> 2 wide picks columns 0 and 2; 2 -> 4 duplicates
        let data = [10u8, 20, 30, 40];
        let src = PixelBox::new(&data, 4, 1, 1, PixelFormat::L8).unwrap();
        let mut out = [0u8; 2];
        let mut dst = PixelBoxMut::new(&mut out, 2, 1, 1, PixelFormat::L8).unwrap();
        scale(&src, &mut dst, Filter::Nearest).unwrap();
        assert_eq!(out, [10, 30]);

        let src = PixelBox::new(&out, 2, 1, 1, PixelFormat::L8).unwrap();
        let mut wide = [0u8; 4];
        let mut dst = PixelBoxMut::new(&mut wide, 4, 1, 1, PixelFormat::L8).unwrap();
        scale(&src, &mut dst, Filter::Nearest).unwrap();
        assert_eq!(wide, [10, 10, 30, 30]);
    }

    #[test]
    fn nearest_converts_through_staging() {
        let data = [255u8, 0, 0, 0, 255, 0];
        let src = PixelBox::new(&data, 2, 1, 1, PixelFormat::R8G8B8).unwrap();
        let mut out = [0u8; 16];
        let mut dst = PixelBoxMut::new(&mut out, 4, 1, 1, PixelFormat::B8G8R8A8).unwrap();
        scale(&src, &mut dst, Filter::Nearest).unwrap();
        assert_eq!(
            out,
            [0, 0, 255, 255, 0, 0, 255, 255, 0, 255, 0, 255, 0, 255, 0, 255]
        );
    }

    #[test]
    fn byte_path_matches_generic_path() {
        let (sw, sh, dw, dh) = (9, 7, 16, 5);
        let data = noise(sw * sh * 4);
        let src = PixelBox::new(&data, sw as u32, sh as u32, 1, PixelFormat::R8G8B8A8).unwrap();

        let mut fast = vec![0u8; dw * dh * 4];
        let mut dst = PixelBoxMut::new(&mut fast, dw as u32, dh as u32, 1, PixelFormat::R8G8B8A8)
            .unwrap();
        linear::scale_bytes::<4>(&src, &mut dst);

        let mut slow = vec![0u8; dw * dh * 4];
        let mut dst = PixelBoxMut::new(&mut slow, dw as u32, dh as u32, 1, PixelFormat::R8G8B8A8)
            .unwrap();
        linear::scale_generic(&src, &mut dst);

        for (a, b) in fast.iter().zip(&slow) {
            assert!(a.abs_diff(*b) <= 1, "byte {a} vs generic {b}");
        }
    }

    #[test]
    fn bilinear_midpoint_averages_neighbours() {
        // 2x1 -> 4x1: texel centres at 0.25 spacing
        let data = [0u8, 200];
        let src = PixelBox::new(&data, 2, 1, 1, PixelFormat::L8).unwrap();
        let mut out = [0u8; 4];
        let mut dst = PixelBoxMut::new(&mut out, 4, 1, 1, PixelFormat::L8).unwrap();
        scale(&src, &mut dst, Filter::Linear).unwrap();
        assert_eq!(out, [0, 50, 150, 200]);
    }

    #[test]
    fn bilinear_converts_through_staging() {
        let data = [0u8, 0, 0, 200, 100, 40];
        let src = PixelBox::new(&data, 2, 1, 1, PixelFormat::R8G8B8).unwrap();
        let mut out = [0u8; 16];
        let mut dst = PixelBoxMut::new(&mut out, 4, 1, 1, PixelFormat::B8G8R8A8).unwrap();
        scale(&src, &mut dst, Filter::Bilinear).unwrap();
        assert_eq!(
            out,
            [0, 0, 0, 255, 10, 25, 50, 255, 30, 75, 150, 255, 40, 100, 200, 255]
        );
    }

    #[test]
    fn bilinear_into_strided_destination() {
        let data = [0u8, 200];
        let src = PixelBox::new(&data, 2, 1, 1, PixelFormat::L8).unwrap();
        let mut out = [0xAAu8; 12];
        let mut dst =
            PixelBoxMut::with_pitches(&mut out, 4, 2, 1, PixelFormat::L8, 6, 12).unwrap();
        scale(&src, &mut dst, Filter::Bilinear).unwrap();
        assert_eq!(
            out,
            [0, 50, 150, 200, 0xAA, 0xAA, 0, 50, 150, 200, 0xAA, 0xAA]
        );
    }

    #[test]
    fn trilinear_blends_slices() {
        // 1x1x2 -> 1x1x1 samples halfway between the two slices
        let data = [0u8, 100];
        let src = PixelBox::new(&data, 1, 1, 2, PixelFormat::L8).unwrap();
        let mut out = [0u8; 1];
        let mut dst = PixelBoxMut::new(&mut out, 1, 1, 1, PixelFormat::L8).unwrap();
        scale(&src, &mut dst, Filter::Bilinear).unwrap();
        assert_eq!(out, [50]);
    }

    #[test]
    fn float32_path_fills_missing_alpha() {
        let mut data = Vec::new();
        for v in [0.0f32, 1.0, 2.0, 4.0, 5.0, 6.0] {
            data.extend_from_slice(&v.to_ne_bytes());
        }
        let src = PixelBox::new(&data, 2, 1, 1, PixelFormat::Float32Rgb).unwrap();
        let mut out = [0u8; 16];
        let mut dst = PixelBoxMut::new(&mut out, 1, 1, 1, PixelFormat::Float32Rgba).unwrap();
        scale(&src, &mut dst, Filter::Bilinear).unwrap();
        let c = PixelFormat::Float32Rgba.unpack_colour(&out);
        assert_eq!(c, Colour::new(2.0, 3.0, 4.0, 1.0));
    }

    #[test]
    fn float32_path_drops_alpha() {
        let mut data = Vec::new();
        for v in [0.0f32, 2.0, 4.0, 0.5, 2.0, 4.0, 8.0, 1.0] {
            data.extend_from_slice(&v.to_ne_bytes());
        }
        let src = PixelBox::new(&data, 2, 1, 1, PixelFormat::Float32Rgba).unwrap();
        let mut out = [0u8; 12];
        let mut dst = PixelBoxMut::new(&mut out, 1, 1, 1, PixelFormat::Float32Rgb).unwrap();
        scale(&src, &mut dst, Filter::Bilinear).unwrap();
        let rgb: Vec<f32> = out
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(rgb, [1.0, 3.0, 6.0]);
    }

    #[test]
    fn generic_path_converts_short_to_bytes() {
        let mut data = [0u8; 12];
        PixelFormat::ShortRgb.pack_colour(Colour::new(0.0, 0.0, 0.0, 1.0), &mut data[..6]);
        PixelFormat::ShortRgb.pack_colour(Colour::new(1.0, 1.0, 1.0, 1.0), &mut data[6..]);
        let src = PixelBox::new(&data, 2, 1, 1, PixelFormat::ShortRgb).unwrap();
        let mut out = [0u8; 4];
        let mut dst = PixelBoxMut::new(&mut out, 1, 1, 1, PixelFormat::R8G8B8A8).unwrap();
        scale(&src, &mut dst, Filter::Bilinear).unwrap();
        assert_eq!(out, [128, 128, 128, 255]);
    }

    #[test]
    fn compressed_is_rejected_for_every_filter() {
        let data = [0u8; 8];
        let src = PixelBox::new(&data, 4, 4, 1, PixelFormat::Bc1).unwrap();
        let mut out = [0u8; 64];
        let mut dst = PixelBoxMut::new(&mut out, 4, 4, 1, PixelFormat::R8G8B8A8).unwrap();
        for filter in [Filter::Nearest, Filter::Linear, Filter::Bilinear] {
            assert!(matches!(
                scale(&src, &mut dst, filter),
                Err(ImageError::Unsupported(_))
            ));
        }
        assert!(out.iter().all(|&b| b == 0));
    }
}
