//! Surface layout: where each (face, mip) lives inside an image buffer.
//!
//! Buffers are face-major, mip-minor:
//!
//! ```text
//! face 0: mip 0, mip 1, .. mip N
//! face 1: mip 0, mip 1, .. mip N
//! ..
//! ```
//!
//! Both [`calculate_size`] and [`locate`] walk the same [`MipChain`], so the
//! total size always equals the sum of every located surface.

use crate::error::ImageError;
use crate::pixel::PixelFormat;

/// Dimensions of successive mip levels, each axis halved and floored at 1.
#[derive(Clone, Debug)]
pub struct MipChain {
    width: u32,
    height: u32,
    depth: u32,
    remaining: u32,
}

impl MipChain {
    /// Levels `0..=num_mipmaps` starting from the given base dimensions.
    pub fn new(width: u32, height: u32, depth: u32, num_mipmaps: u32) -> Self {
        Self {
            width,
            height,
            depth,
            remaining: num_mipmaps.saturating_add(1),
        }
    }
}

impl Iterator for MipChain {
    type Item = (u32, u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let level = (self.width, self.height, self.depth);
        self.width = (self.width / 2).max(1);
        self.height = (self.height / 2).max(1);
        self.depth = (self.depth / 2).max(1);
        Some(level)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for MipChain {}

/// Position and extent of one (face, mip) surface inside a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceLocation {
    /// Byte offset from the start of the buffer.
    pub offset: usize,
    /// Byte length of the surface.
    pub size: usize,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

fn level_size(format: PixelFormat, w: u32, h: u32, d: u32) -> Result<usize, ImageError> {
    format
        .memory_size(w, h, d)
        .ok_or(ImageError::DimensionsTooLarge {
            width: w,
            height: h,
            depth: d,
        })
}

fn too_large(width: u32, height: u32, depth: u32) -> ImageError {
    ImageError::DimensionsTooLarge {
        width,
        height,
        depth,
    }
}

/// Bytes for one face across all of its mip levels.
fn face_size(
    num_mipmaps: u32,
    width: u32,
    height: u32,
    depth: u32,
    format: PixelFormat,
) -> Result<usize, ImageError> {
    MipChain::new(width, height, depth, num_mipmaps).try_fold(0usize, |acc, (w, h, d)| {
        acc.checked_add(level_size(format, w, h, d)?)
            .ok_or_else(|| too_large(width, height, depth))
    })
}

/// Total buffer bytes for `num_faces` faces of `num_mipmaps + 1` levels each.
pub fn calculate_size(
    num_mipmaps: u32,
    num_faces: usize,
    width: u32,
    height: u32,
    depth: u32,
    format: PixelFormat,
) -> Result<usize, ImageError> {
    MipChain::new(width, height, depth, num_mipmaps).try_fold(0usize, |acc, (w, h, d)| {
        level_size(format, w, h, d)?
            .checked_mul(num_faces)
            .and_then(|level| acc.checked_add(level))
            .ok_or_else(|| too_large(width, height, depth))
    })
}

/// Locate the surface for `face` at mip level `mipmap`.
///
/// Returns [`ImageError::OutOfRange`] if `mipmap > num_mipmaps` or
/// `face >= num_faces`.
#[allow(clippy::too_many_arguments)]
pub fn locate(
    face: usize,
    mipmap: u32,
    width: u32,
    height: u32,
    depth: u32,
    format: PixelFormat,
    num_mipmaps: u32,
    num_faces: usize,
) -> Result<SurfaceLocation, ImageError> {
    if mipmap > num_mipmaps {
        return Err(ImageError::OutOfRange {
            what: "mipmap",
            index: mipmap as usize,
            limit: num_mipmaps as usize,
        });
    }
    if face >= num_faces {
        return Err(ImageError::OutOfRange {
            what: "face",
            index: face,
            limit: num_faces,
        });
    }

    let full_face = face_size(num_mipmaps, width, height, depth, format)?;
    let mut mip_offset = 0usize;
    let mut found = None;
    for (level, (w, h, d)) in MipChain::new(width, height, depth, num_mipmaps).enumerate() {
        let size = level_size(format, w, h, d)?;
        if level == mipmap as usize {
            found = Some((size, w, h, d));
            break;
        }
        mip_offset += size;
    }
    let (size, w, h, d) = found.ok_or_else(|| {
        ImageError::Internal(alloc::format!("mip level {mipmap} missing from chain"))
    })?;

    let offset = face
        .checked_mul(full_face)
        .and_then(|base| base.checked_add(mip_offset))
        .ok_or_else(|| too_large(width, height, depth))?;

    Ok(SurfaceLocation {
        offset,
        size,
        width: w,
        height: h,
        depth: d,
    })
}
