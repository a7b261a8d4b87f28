//! Nearest-neighbour resampling on fixed-width elements.

use alloc::vec::Vec;

use crate::pixel_box::{PixelBox, PixelBoxMut};

/// `floor(i * src / dst)`.
#[inline]
fn source_index(i: u32, src: u32, dst: u32) -> u32 {
    (u64::from(i) * u64::from(src) / u64::from(dst)) as u32
}

/// Copy `N`-byte elements from `src` into same-format `dst`.
pub(super) fn scale<const N: usize>(src: &PixelBox<'_>, dst: &mut PixelBoxMut<'_>) {
    debug_assert_eq!(src.format, dst.format);
    debug_assert_eq!(src.format.element_size(), N);

    let columns: Vec<usize> = (0..dst.width)
        .map(|x| source_index(x, src.width, dst.width) as usize)
        .collect();

    for z in 0..dst.depth {
        let sz = source_index(z, src.depth, dst.depth);
        for y in 0..dst.height {
            let sy = source_index(y, src.height, dst.height);
            let (src_px, _) = src.row(sy, sz).as_chunks::<N>();
            let (dst_px, _) = dst.row_mut(y, z).as_chunks_mut::<N>();
            for (px, &sx) in dst_px.iter_mut().zip(&columns) {
                *px = src_px[sx];
            }
        }
    }
}
