//! Non-owning pixel region views and bulk operations over them.

use alloc::format;

use crate::error::ImageError;
use crate::pixel::PixelFormat;

/// Read-only view of a rectangular or volumetric pixel region.
///
/// Rows are `row_pitch` bytes apart and depth slices `slice_pitch` bytes
/// apart, so a box can describe a window into a larger buffer.
#[derive(Clone, Copy, Debug)]
pub struct PixelBox<'a> {
    data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: PixelFormat,
    pub row_pitch: usize,
    pub slice_pitch: usize,
}

/// Mutable view of a pixel region. See [`PixelBox`].
#[derive(Debug)]
pub struct PixelBoxMut<'a> {
    data: &'a mut [u8],
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: PixelFormat,
    pub row_pitch: usize,
    pub slice_pitch: usize,
}

/// Row and slice pitch of a tightly packed region.
fn tight_pitches(
    width: u32,
    height: u32,
    depth: u32,
    format: PixelFormat,
) -> Result<(usize, usize, usize), ImageError> {
    let too_large = ImageError::DimensionsTooLarge {
        width,
        height,
        depth,
    };
    let total = format.memory_size(width, height, depth).ok_or(too_large)?;
    if format.is_compressed() {
        // Block formats have no per-row addressing; the whole region is one span.
        return Ok((0, 0, total));
    }
    let row = width as usize * format.element_size();
    Ok((row, row * height as usize, total))
}

/// Bytes spanned from the first pixel to the end of the last row.
fn strided_extent(
    width: u32,
    height: u32,
    depth: u32,
    format: PixelFormat,
    row_pitch: usize,
    slice_pitch: usize,
) -> Result<usize, ImageError> {
    let too_large = || ImageError::DimensionsTooLarge {
        width,
        height,
        depth,
    };
    if width == 0 || height == 0 || depth == 0 {
        return Ok(0);
    }
    let row_bytes = (width as usize)
        .checked_mul(format.element_size())
        .ok_or_else(too_large)?;
    if row_pitch < row_bytes || slice_pitch < row_pitch.saturating_mul(height as usize) {
        return Err(ImageError::InvalidParameters(format!(
            "pitches {row_pitch}/{slice_pitch} too small for {width}x{height} {format:?}"
        )));
    }
    (depth as usize - 1)
        .checked_mul(slice_pitch)
        .and_then(|s| s.checked_add((height as usize - 1).checked_mul(row_pitch)?))
        .and_then(|s| s.checked_add(row_bytes))
        .ok_or_else(too_large)
}

fn check_len(needed: usize, actual: usize) -> Result<(), ImageError> {
    if actual < needed {
        return Err(ImageError::BufferTooSmall { needed, actual });
    }
    Ok(())
}

impl<'a> PixelBox<'a> {
    /// Tightly packed region starting at `data[0]`.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        depth: u32,
        format: PixelFormat,
    ) -> Result<Self, ImageError> {
        let (row_pitch, slice_pitch, total) = tight_pitches(width, height, depth, format)?;
        check_len(total, data.len())?;
        Ok(Self {
            data: &data[..total],
            width,
            height,
            depth,
            format,
            row_pitch,
            slice_pitch,
        })
    }

    /// Strided region. Only accessible formats can be strided.
    pub fn with_pitches(
        data: &'a [u8],
        width: u32,
        height: u32,
        depth: u32,
        format: PixelFormat,
        row_pitch: usize,
        slice_pitch: usize,
    ) -> Result<Self, ImageError> {
        if !format.is_accessible() {
            return Err(ImageError::Unsupported(format!("strided view of {format:?}")));
        }
        let extent = strided_extent(width, height, depth, format, row_pitch, slice_pitch)?;
        check_len(extent, data.len())?;
        Ok(Self {
            data: &data[..extent],
            width,
            height,
            depth,
            format,
            row_pitch,
            slice_pitch,
        })
    }

    /// Sub-region starting at (`left`, `top`, `front`), sharing this box's pitches.
    pub fn crop(
        &self,
        left: u32,
        top: u32,
        front: u32,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<PixelBox<'a>, ImageError> {
        let fits = |start: u32, len: u32, limit: u32| {
            start.checked_add(len).is_some_and(|end| end <= limit)
        };
        if !fits(left, width, self.width)
            || !fits(top, height, self.height)
            || !fits(front, depth, self.depth)
        {
            return Err(ImageError::InvalidParameters(format!(
                "crop {width}x{height}x{depth}+{left}+{top}+{front} outside {}x{}x{}",
                self.width, self.height, self.depth
            )));
        }
        let start = front as usize * self.slice_pitch
            + top as usize * self.row_pitch
            + left as usize * self.format.element_size();
        // An empty window may start one past the last byte.
        let data: &'a [u8] = self.data;
        let data = data.get(start..).unwrap_or_default();
        PixelBox::with_pitches(
            data,
            width,
            height,
            depth,
            self.format,
            self.row_pitch,
            self.slice_pitch,
        )
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes of row `y` in slice `z`, excluding any pitch padding.
    pub fn row(&self, y: u32, z: u32) -> &'a [u8] {
        let data: &'a [u8] = self.data;
        let start = z as usize * self.slice_pitch + y as usize * self.row_pitch;
        &data[start..start + self.row_bytes()]
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.element_size()
    }

    /// Whether rows and slices follow each other with no padding.
    pub fn is_consecutive(&self) -> bool {
        self.format.is_compressed()
            || (self.row_pitch == self.row_bytes()
                && self.slice_pitch == self.row_pitch * self.height as usize)
    }

    /// Byte size of the region if it were tightly packed.
    pub fn consecutive_size(&self) -> usize {
        self.format
            .memory_size(self.width, self.height, self.depth)
            .unwrap_or(usize::MAX)
    }
}

impl<'a> PixelBoxMut<'a> {
    /// Tightly packed region starting at `data[0]`.
    pub fn new(
        data: &'a mut [u8],
        width: u32,
        height: u32,
        depth: u32,
        format: PixelFormat,
    ) -> Result<Self, ImageError> {
        let (row_pitch, slice_pitch, total) = tight_pitches(width, height, depth, format)?;
        check_len(total, data.len())?;
        Ok(Self {
            data: &mut data[..total],
            width,
            height,
            depth,
            format,
            row_pitch,
            slice_pitch,
        })
    }

    /// Strided region. Only accessible formats can be strided.
    pub fn with_pitches(
        data: &'a mut [u8],
        width: u32,
        height: u32,
        depth: u32,
        format: PixelFormat,
        row_pitch: usize,
        slice_pitch: usize,
    ) -> Result<Self, ImageError> {
        if !format.is_accessible() {
            return Err(ImageError::Unsupported(format!("strided view of {format:?}")));
        }
        let extent = strided_extent(width, height, depth, format, row_pitch, slice_pitch)?;
        check_len(extent, data.len())?;
        Ok(Self {
            data: &mut data[..extent],
            width,
            height,
            depth,
            format,
            row_pitch,
            slice_pitch,
        })
    }

    /// Read-only view of the same region.
    pub fn as_box(&self) -> PixelBox<'_> {
        PixelBox {
            data: &self.data[..],
            width: self.width,
            height: self.height,
            depth: self.depth,
            format: self.format,
            row_pitch: self.row_pitch,
            slice_pitch: self.slice_pitch,
        }
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.element_size()
    }

    /// Mutable bytes of row `y` in slice `z`, excluding any pitch padding.
    pub fn row_mut(&mut self, y: u32, z: u32) -> &mut [u8] {
        let start = z as usize * self.slice_pitch + y as usize * self.row_pitch;
        let len = self.row_bytes();
        &mut self.data[start..start + len]
    }

    pub fn is_consecutive(&self) -> bool {
        self.as_box().is_consecutive()
    }
}

/// Copy `src` into `dst`, converting pixel format as needed.
///
/// Both regions must have identical dimensions. Same-format copies are plain
/// row copies and work for compressed formats when both sides are
/// consecutive; conversions require accessible formats on both sides.
pub fn bulk_convert(src: &PixelBox<'_>, dst: &mut PixelBoxMut<'_>) -> Result<(), ImageError> {
    if (src.width, src.height, src.depth) != (dst.width, dst.height, dst.depth) {
        return Err(ImageError::InvalidParameters(format!(
            "conversion needs equal dimensions, got {}x{}x{} and {}x{}x{}",
            src.width, src.height, src.depth, dst.width, dst.height, dst.depth
        )));
    }

    if src.format == dst.format {
        if src.is_consecutive() && dst.is_consecutive() {
            let len = src.consecutive_size();
            dst.data[..len].copy_from_slice(&src.data[..len]);
            return Ok(());
        }
        for z in 0..src.depth {
            for y in 0..src.height {
                dst.row_mut(y, z).copy_from_slice(src.row(y, z));
            }
        }
        return Ok(());
    }

    if !src.format.is_accessible() || !dst.format.is_accessible() {
        return Err(ImageError::Unsupported(format!(
            "conversion from {:?} to {:?}",
            src.format, dst.format
        )));
    }

    let src_size = src.format.element_size();
    let dst_size = dst.format.element_size();
    for z in 0..src.depth {
        for y in 0..src.height {
            let src_row = src.row(y, z);
            let dst_format = dst.format;
            let dst_row = dst.row_mut(y, z);
            for (s, d) in src_row
                .chunks_exact(src_size)
                .zip(dst_row.chunks_exact_mut(dst_size))
            {
                dst_format.pack_colour(src.format.unpack_colour(s), d);
            }
        }
    }
    Ok(())
}

/// Reverse the row order of every depth slice in place.
pub fn bulk_vertical_flip(region: &mut PixelBoxMut<'_>) -> Result<(), ImageError> {
    if !region.format.is_accessible() {
        return Err(ImageError::Unsupported(format!(
            "vertical flip of {:?}",
            region.format
        )));
    }
    let row_bytes = region.row_bytes();
    let height = region.height as usize;
    for z in 0..region.depth as usize {
        let slice = z * region.slice_pitch;
        for y in 0..height / 2 {
            let top = slice + y * region.row_pitch;
            let bottom = slice + (height - 1 - y) * region.row_pitch;
            let (upper, lower) = region.data.split_at_mut(bottom);
            upper[top..top + row_bytes].swap_with_slice(&mut lower[..row_bytes]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn new_rejects_short_buffer() {
        let data = [0u8; 10];
        let err = PixelBox::new(&data, 2, 2, 1, PixelFormat::R8G8B8).unwrap_err();
        assert!(matches!(
            err,
            ImageError::BufferTooSmall {
                needed: 12,
                actual: 10
            }
        ));
    }

    #[test]
    fn crop_reads_window_rows() {
        // 4x3 L8 with values 0..12
        let data: Vec<u8> = (0..12).collect();
        let full = PixelBox::new(&data, 4, 3, 1, PixelFormat::L8).unwrap();
        let win = full.crop(1, 1, 0, 2, 2, 1).unwrap();
        assert!(!win.is_consecutive());
        assert_eq!(win.row(0, 0), &[5, 6]);
        assert_eq!(win.row(1, 0), &[9, 10]);
        assert!(full.crop(3, 0, 0, 2, 1, 1).is_err());
    }

    #[test]
    fn empty_crop_at_far_edge() {
        let data: Vec<u8> = (0..12).collect();
        let full = PixelBox::new(&data, 4, 3, 1, PixelFormat::L8).unwrap();
        let empty = full.crop(4, 3, 0, 0, 0, 1).unwrap();
        assert_eq!((empty.width, empty.height), (0, 0));
        assert!(empty.data().is_empty());

        let win = full.crop(1, 1, 0, 2, 2, 1).unwrap();
        let corner = win.crop(2, 2, 0, 0, 0, 1).unwrap();
        assert!(corner.data().is_empty());
        assert!(win.crop(2, 2, 0, 1, 0, 1).is_err());
    }

    #[test]
    fn convert_swizzles_channels() {
        let src_data = [10u8, 20, 30, 40, 50, 60];
        let src = PixelBox::new(&src_data, 2, 1, 1, PixelFormat::R8G8B8).unwrap();
        let mut out = [0u8; 8];
        let mut dst = PixelBoxMut::new(&mut out, 2, 1, 1, PixelFormat::B8G8R8A8).unwrap();
        bulk_convert(&src, &mut dst).unwrap();
        assert_eq!(out, [30, 20, 10, 255, 60, 50, 40, 255]);
    }

    #[test]
    fn convert_into_strided_destination() {
        let src_data = [1u8, 2, 3, 4];
        let src = PixelBox::new(&src_data, 2, 2, 1, PixelFormat::L8).unwrap();
        let mut out = [0u8; 6];
        let mut dst =
            PixelBoxMut::with_pitches(&mut out, 2, 2, 1, PixelFormat::L8, 3, 6).unwrap();
        bulk_convert(&src, &mut dst).unwrap();
        assert_eq!(out, [1, 2, 0, 3, 4, 0]);
    }

    #[test]
    fn convert_rejects_mismatched_dimensions() {
        let src_data = [0u8; 4];
        let src = PixelBox::new(&src_data, 2, 2, 1, PixelFormat::L8).unwrap();
        let mut out = [0u8; 2];
        let mut dst = PixelBoxMut::new(&mut out, 2, 1, 1, PixelFormat::L8).unwrap();
        assert!(matches!(
            bulk_convert(&src, &mut dst),
            Err(ImageError::InvalidParameters(_))
        ));
    }

    #[test]
    fn vertical_flip_per_slice() {
        // 1x3x2 L8: slice 0 = [0,1,2], slice 1 = [3,4,5]
        let mut data: Vec<u8> = (0..6).collect();
        let mut region = PixelBoxMut::new(&mut data, 1, 3, 2, PixelFormat::L8).unwrap();
        bulk_vertical_flip(&mut region).unwrap();
        assert_eq!(data, vec![2, 1, 0, 5, 4, 3]);
    }

    #[test]
    fn vertical_flip_rejects_compressed() {
        let mut data = [0u8; 8];
        let mut region = PixelBoxMut::new(&mut data, 4, 4, 1, PixelFormat::Bc1).unwrap();
        assert!(matches!(
            bulk_vertical_flip(&mut region),
            Err(ImageError::Unsupported(_))
        ));
    }
}
