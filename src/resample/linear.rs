//! Linear (bilinear / trilinear) resampling.
//!
//! All three paths share [`taps`], which maps destination texel centres onto
//! the source grid in 16.16 fixed point, so they sample identical positions
//! and differ only in arithmetic.

use alloc::vec::Vec;

use crate::pixel::{Colour, PixelFormat};
use crate::pixel_box::{PixelBox, PixelBoxMut};

const ONE: u32 = 1 << 16;

/// Two neighbouring source indices along one axis and the 16-bit weight of `hi`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Tap {
    lo: u32,
    hi: u32,
    frac: u32,
}

impl Tap {
    fn weights(self) -> [u64; 2] {
        [u64::from(ONE - self.frac), u64::from(self.frac)]
    }

    fn weights_f32(self) -> [f32; 2] {
        let f = self.frac as f32 / ONE as f32;
        [1.0 - f, f]
    }

    fn indices(self) -> [u32; 2] {
        [self.lo, self.hi]
    }
}

/// Source taps for each of `dst` destination positions over `src` source texels.
///
/// Position `i` samples source coordinate `(i + 0.5) * src / dst - 0.5`,
/// clamped to the edge texels.
pub(super) fn taps(src: u32, dst: u32) -> Vec<Tap> {
    let last = src - 1;
    (0..dst)
        .map(|i| {
            let num = ((2 * u128::from(i) + 1) * u128::from(src)) << 16;
            let pos = (num / (2 * u128::from(dst))).saturating_sub(u128::from(ONE / 2));
            let lo = ((pos >> 16) as u64).min(u64::from(last)) as u32;
            Tap {
                lo,
                hi: (lo + 1).min(last),
                frac: (pos & 0xFFFF) as u32,
            }
        })
        .collect()
}

/// Integer interpolation on `N`-byte elements of 8-bit channels.
///
/// Source and destination must share a format.
pub(super) fn scale_bytes<const N: usize>(src: &PixelBox<'_>, dst: &mut PixelBoxMut<'_>) {
    debug_assert_eq!(src.format, dst.format);
    debug_assert_eq!(src.format.element_size(), N);

    let xs = taps(src.width, dst.width);
    let ys = taps(src.height, dst.height);
    let zs = taps(src.depth, dst.depth);

    for (z, tz) in zs.iter().enumerate() {
        for (y, ty) in ys.iter().enumerate() {
            let rows = tz.indices().map(|sz| ty.indices().map(|sy| src.row(sy, sz)));
            let wz = tz.weights();
            let wy = ty.weights();
            let (dst_px, _) = dst.row_mut(y as u32, z as u32).as_chunks_mut::<N>();
            for (px, tx) in dst_px.iter_mut().zip(&xs) {
                let wx = tx.weights();
                let (x0, x1) = (tx.lo as usize * N, tx.hi as usize * N);
                for (c, out) in px.iter_mut().enumerate() {
                    let mut acc = 0u64;
                    for (plane, w_z) in rows.iter().zip(wz) {
                        for (row, w_y) in plane.iter().zip(wy) {
                            let across = u64::from(row[x0 + c]) * wx[0]
                                + u64::from(row[x1 + c]) * wx[1];
                            acc += across * w_y * w_z;
                        }
                    }
                    // Weights sum to 2^48; round half up.
                    *out = ((acc + (1 << 47)) >> 48) as u8;
                }
            }
        }
    }
}

fn read_f32(bytes: &[u8], index: usize) -> f32 {
    let at = index * 4;
    f32::from_ne_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Direct interpolation between 32-bit float RGB/RGBA formats.
///
/// Missing source alpha reads as 1.0; surplus alpha is dropped.
pub(super) fn scale_float32(src: &PixelBox<'_>, dst: &mut PixelBoxMut<'_>) {
    let src_channels = src.format.channels().len();
    let dst_channels = dst.format.channels().len();

    let xs = taps(src.width, dst.width);
    let ys = taps(src.height, dst.height);
    let zs = taps(src.depth, dst.depth);

    for (z, tz) in zs.iter().enumerate() {
        for (y, ty) in ys.iter().enumerate() {
            let rows = tz.indices().map(|sz| ty.indices().map(|sy| src.row(sy, sz)));
            let wz = tz.weights_f32();
            let wy = ty.weights_f32();
            let dst_row = dst.row_mut(y as u32, z as u32);
            for (px, tx) in dst_row.chunks_exact_mut(dst_channels * 4).zip(&xs) {
                let wx = tx.weights_f32();
                let mut acc = [0.0f32; 4];
                for (plane, w_z) in rows.iter().zip(wz) {
                    for (row, w_y) in plane.iter().zip(wy) {
                        for (sx, w_x) in tx.indices().into_iter().zip(wx) {
                            let w = w_x * w_y * w_z;
                            let base = sx as usize * src_channels;
                            for (c, a) in acc.iter_mut().enumerate() {
                                let v = if c < src_channels {
                                    read_f32(row, base + c)
                                } else {
                                    1.0
                                };
                                *a += v * w;
                            }
                        }
                    }
                }
                for (c, out) in px.chunks_exact_mut(4).enumerate() {
                    out.copy_from_slice(&acc[c].to_ne_bytes());
                }
            }
        }
    }
}

fn accumulate(acc: &mut Colour, c: Colour, w: f32) {
    acc.r += c.r * w;
    acc.g += c.g * w;
    acc.b += c.b * w;
    acc.a += c.a * w;
}

/// Unpack, interpolate and repack. Works for any pair of accessible formats.
pub(super) fn scale_generic(src: &PixelBox<'_>, dst: &mut PixelBoxMut<'_>) {
    let src_format: PixelFormat = src.format;
    let dst_format: PixelFormat = dst.format;
    let src_size = src_format.element_size();
    let dst_size = dst_format.element_size();

    let xs = taps(src.width, dst.width);
    let ys = taps(src.height, dst.height);
    let zs = taps(src.depth, dst.depth);

    for (z, tz) in zs.iter().enumerate() {
        for (y, ty) in ys.iter().enumerate() {
            let rows = tz.indices().map(|sz| ty.indices().map(|sy| src.row(sy, sz)));
            let wz = tz.weights_f32();
            let wy = ty.weights_f32();
            let dst_row = dst.row_mut(y as u32, z as u32);
            for (px, tx) in dst_row.chunks_exact_mut(dst_size).zip(&xs) {
                let wx = tx.weights_f32();
                let mut acc = Colour::new(0.0, 0.0, 0.0, 0.0);
                for (plane, w_z) in rows.iter().zip(wz) {
                    for (row, w_y) in plane.iter().zip(wy) {
                        for (sx, w_x) in tx.indices().into_iter().zip(wx) {
                            let at = sx as usize * src_size;
                            let c = src_format.unpack_colour(&row[at..at + src_size]);
                            accumulate(&mut acc, c, w_x * w_y * w_z);
                        }
                    }
                }
                dst_format.pack_colour(acc, px);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_taps_have_no_fraction() {
        let t = taps(5, 5);
        for (i, tap) in t.iter().enumerate() {
            assert_eq!(tap.lo, i as u32);
            assert_eq!(tap.frac, 0);
        }
    }

    #[test]
    fn taps_clamp_at_edges() {
        let t = taps(2, 8);
        assert_eq!(t[0], Tap { lo: 0, hi: 1, frac: 0 });
        let last = t[7];
        assert_eq!((last.lo, last.hi), (1, 1));
    }

    #[test]
    fn downscale_taps_centre_between_pairs() {
        let t = taps(4, 2);
        assert_eq!(t[0], Tap { lo: 0, hi: 1, frac: 1 << 15 });
        assert_eq!(t[1], Tap { lo: 2, hi: 3, frac: 1 << 15 });
    }
}
