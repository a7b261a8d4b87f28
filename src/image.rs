//! The [`Image`] container: one buffer of faces and mip levels plus metadata.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;
use enough::{Stop, Unstoppable};

use crate::codec::{Codec, CodecRegistry, DecodedImage, ImageData};
use crate::error::ImageError;
use crate::layout::{self, SurfaceLocation};
use crate::limits::Limits;
use crate::pixel::{Colour, PixelFormat};
use crate::pixel_box::{PixelBox, PixelBoxMut, bulk_convert, bulk_vertical_flip};
use crate::resample::{self, Filter};

bitflags::bitflags! {
    /// Properties of an image's layout.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ImageFlags: u32 {
        /// Pixels are stored in a block-compressed format.
        const COMPRESSED = 1 << 0;
        /// Depth is greater than one.
        const VOLUME = 1 << 1;
        /// Six faces are stored back to back.
        const CUBEMAP = 1 << 2;
    }
}

impl ImageFlags {
    fn for_layout(format: PixelFormat, depth: u32, num_faces: usize) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::COMPRESSED, format.is_compressed());
        flags.set(Self::VOLUME, depth > 1);
        flags.set(Self::CUBEMAP, num_faces == 6);
        flags
    }
}

/// Pixel storage of an [`Image`].
///
/// `Owned` buffers are freed with the image. `Borrowed` buffers belong to
/// the caller and outlive it.
pub enum ImageBuffer<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a mut [u8]),
}

impl ImageBuffer<'_> {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            ImageBuffer::Owned(v) => v.as_slice(),
            ImageBuffer::Borrowed(s) => &s[..],
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            ImageBuffer::Owned(v) => v.as_mut_slice(),
            ImageBuffer::Borrowed(s) => &mut s[..],
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, ImageBuffer::Owned(_))
    }

    fn truncate(&mut self, len: usize) {
        match self {
            ImageBuffer::Owned(v) => v.truncate(len),
            ImageBuffer::Borrowed(s) => {
                let taken = core::mem::take(s);
                let (head, _) = taken.split_at_mut(len.min(taken.len()));
                *s = head;
            }
        }
    }
}

impl core::fmt::Debug for ImageBuffer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ImageBuffer::Owned(v) => write!(f, "Owned({} bytes)", v.len()),
            ImageBuffer::Borrowed(s) => write!(f, "Borrowed({} bytes)", s.len()),
        }
    }
}

/// Transforms that reorder or replace base-level pixels. Every one of them
/// invalidates the mip chain, so they all run through
/// [`Image::transform_geometry`].
#[derive(Clone, Copy, Debug)]
enum GeometryOp {
    /// Reverse row order.
    FlipX,
    /// Reverse pixel order within each row.
    FlipY,
    Resize {
        width: u32,
        height: u32,
        filter: Filter,
    },
}

/// A bitmap of one or six faces, each with a chain of mip levels, stored in
/// a single buffer (face-major, mip-minor).
///
/// An image without a buffer is *empty*; operations that need pixel data
/// fail with [`ImageError::Internal`] on an empty image.
#[derive(Debug, Default)]
pub struct Image<'a> {
    width: u32,
    height: u32,
    depth: u32,
    size: usize,
    num_mipmaps: u32,
    flags: ImageFlags,
    format: PixelFormat,
    pixel_size: usize,
    buffer: Option<ImageBuffer<'a>>,
}

impl Image<'static> {
    /// Allocate a zeroed single-face, single-level image.
    ///
    /// An unknown format or a zero dimension produces an empty image.
    pub fn new(
        format: PixelFormat,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<Self, ImageError> {
        let size = layout::calculate_size(0, 1, width, height, depth, format)?;
        if format == PixelFormat::Unknown || size == 0 {
            return Ok(Self::default());
        }
        let mut image = Self::default();
        image.set_layout(width, height, depth, format, 1, 0, size);
        image.buffer = Some(ImageBuffer::Owned(vec![0u8; size]));
        Ok(image)
    }
}

impl<'a> Image<'a> {
    /// Wrap an existing single-face, single-level buffer.
    ///
    /// An unknown format or a zero dimension produces an empty image and
    /// drops `buffer`.
    pub fn from_buffer(
        buffer: ImageBuffer<'a>,
        format: PixelFormat,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<Self, ImageError> {
        let mut image = Self::default();
        image.load_dynamic_image(buffer, width, height, depth, format, 1, 0)?;
        Ok(image)
    }

    /// Replace this image with `buffer`, interpreted with the given layout.
    ///
    /// `num_faces` must be 1 or 6. The buffer must hold at least the
    /// computed layout size; the image uses exactly that many bytes.
    #[allow(clippy::too_many_arguments)]
    pub fn load_dynamic_image(
        &mut self,
        buffer: ImageBuffer<'a>,
        width: u32,
        height: u32,
        depth: u32,
        format: PixelFormat,
        num_faces: usize,
        num_mipmaps: u32,
    ) -> Result<(), ImageError> {
        check_faces(num_faces)?;
        let size = layout::calculate_size(num_mipmaps, num_faces, width, height, depth, format)?;
        if format == PixelFormat::Unknown || size == 0 {
            self.reset();
            return Ok(());
        }
        let actual = buffer.as_slice().len();
        if actual < size {
            return Err(ImageError::BufferTooSmall {
                needed: size,
                actual,
            });
        }
        let mut buffer = buffer;
        buffer.truncate(size);
        self.set_layout(width, height, depth, format, num_faces, num_mipmaps, size);
        self.buffer = Some(buffer);
        Ok(())
    }

    /// Copy a raw face-major, mip-minor dump into a new owned buffer.
    ///
    /// `data` must be exactly the computed layout size; nothing is
    /// allocated otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn load_raw_data(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
        depth: u32,
        format: PixelFormat,
        num_faces: usize,
        num_mipmaps: u32,
    ) -> Result<(), ImageError> {
        check_faces(num_faces)?;
        let size = layout::calculate_size(num_mipmaps, num_faces, width, height, depth, format)?;
        if data.len() != size {
            return Err(ImageError::InvalidParameters(format!(
                "raw data is {} bytes, layout needs {size}",
                data.len()
            )));
        }
        self.load_dynamic_image(
            ImageBuffer::Owned(data.to_vec()),
            width,
            height,
            depth,
            format,
            num_faces,
            num_mipmaps,
        )
    }

    /// Decode `data`, choosing the codec by `type_hint` (an extension or type
    /// name) or, when the hint is empty, by its leading signature bytes.
    pub fn load(
        &mut self,
        data: &[u8],
        type_hint: &str,
        codecs: &CodecRegistry,
    ) -> Result<(), ImageError> {
        self.load_with(data, type_hint, codecs, None, &Unstoppable)
    }

    /// [`Image::load`] with decode limits and cancellation.
    ///
    /// On failure the image is left unchanged.
    pub fn load_with(
        &mut self,
        data: &[u8],
        type_hint: &str,
        codecs: &CodecRegistry,
        limits: Option<&Limits>,
        stop: &dyn Stop,
    ) -> Result<(), ImageError> {
        let codec = find_codec(data, type_hint, codecs)?;
        let decoded = codec.decode(data, limits, stop)?;
        log::debug!(
            "decoded {}x{}x{} {:?} with {} codec",
            decoded.data.width,
            decoded.data.height,
            decoded.data.depth,
            decoded.data.format,
            codec.type_name()
        );
        self.install_decoded(decoded)
    }

    /// Take ownership of a decoder's output.
    fn install_decoded(&mut self, decoded: DecodedImage) -> Result<(), ImageError> {
        let DecodedImage { data: meta, pixels } = decoded;
        let num_faces = if meta.flags.contains(ImageFlags::CUBEMAP) {
            6
        } else {
            1
        };
        let size = layout::calculate_size(
            meta.num_mipmaps,
            num_faces,
            meta.width,
            meta.height,
            meta.depth,
            meta.format,
        )?;
        if meta.size != size || pixels.len() != size {
            return Err(ImageError::InvalidData(format!(
                "decoder produced {} bytes, layout needs {size}",
                pixels.len()
            )));
        }
        self.load_dynamic_image(
            ImageBuffer::Owned(pixels),
            meta.width,
            meta.height,
            meta.depth,
            meta.format,
            num_faces,
            meta.num_mipmaps,
        )
    }

    /// Decode two encoded images and combine them with
    /// [`Image::combine_two_images_as_rgba`].
    pub fn load_two_images_as_rgba(
        &mut self,
        rgb_data: &[u8],
        alpha_data: &[u8],
        format: PixelFormat,
        rgb_type: &str,
        alpha_type: &str,
        codecs: &CodecRegistry,
    ) -> Result<(), ImageError> {
        let mut rgb = Image::default();
        rgb.load(rgb_data, rgb_type, codecs)?;
        let mut alpha = Image::default();
        alpha.load(alpha_data, alpha_type, codecs)?;
        self.combine_two_images_as_rgba(&rgb, &alpha, format)
    }

    /// Type name of the codec whose signature matches `data`.
    pub fn file_ext_from_magic(data: &[u8], codecs: &CodecRegistry) -> Option<&'static str> {
        codecs.by_magic(data).map(|c| c.type_name())
    }

    /// Encode with the codec registered for `extension`.
    pub fn encode(&self, extension: &str, codecs: &CodecRegistry) -> Result<Vec<u8>, ImageError> {
        let pixels = self.require_data("encode")?;
        if extension.is_empty() {
            return Err(ImageError::InvalidParameters(
                "no extension to pick an encoder".into(),
            ));
        }
        let codec = codecs.by_extension(extension).ok_or_else(|| {
            ImageError::InvalidParameters(format!("no codec for extension {extension:?}"))
        })?;
        log::debug!(
            "encoding {}x{}x{} {:?} as {}",
            self.width,
            self.height,
            self.depth,
            self.format,
            codec.type_name()
        );
        codec.encode(&self.image_data(), pixels, &Unstoppable)
    }

    /// Metadata describing this image to a codec.
    pub fn image_data(&self) -> ImageData {
        ImageData {
            width: self.width,
            height: self.height,
            depth: self.depth,
            size: self.size,
            num_mipmaps: self.num_mipmaps,
            flags: self.flags,
            format: self.format,
        }
    }

    /// Read-only view of one (face, mip) surface.
    pub fn pixel_box(&self, face: usize, mipmap: u32) -> Result<PixelBox<'_>, ImageError> {
        let loc = self.locate(face, mipmap)?;
        let data = self.require_data("pixel_box")?;
        PixelBox::new(
            &data[loc.offset..loc.offset + loc.size],
            loc.width,
            loc.height,
            loc.depth,
            self.format,
        )
    }

    /// Mutable view of one (face, mip) surface.
    pub fn pixel_box_mut(
        &mut self,
        face: usize,
        mipmap: u32,
    ) -> Result<PixelBoxMut<'_>, ImageError> {
        let loc = self.locate(face, mipmap)?;
        let format = self.format;
        let data = self.require_data_mut("pixel_box_mut")?;
        PixelBoxMut::new(
            &mut data[loc.offset..loc.offset + loc.size],
            loc.width,
            loc.height,
            loc.depth,
            format,
        )
    }

    fn locate(&self, face: usize, mipmap: u32) -> Result<SurfaceLocation, ImageError> {
        layout::locate(
            face,
            mipmap,
            self.width,
            self.height,
            self.depth,
            self.format,
            self.num_mipmaps,
            self.num_faces(),
        )
    }

    /// Mirror vertically (reverse row order). Discards mip levels.
    pub fn flip_around_x(&mut self) -> Result<(), ImageError> {
        self.transform_geometry(GeometryOp::FlipX)
    }

    /// Mirror horizontally (reverse each row). Discards mip levels.
    pub fn flip_around_y(&mut self) -> Result<(), ImageError> {
        self.transform_geometry(GeometryOp::FlipY)
    }

    /// Resample every face to `width` x `height`. Discards mip levels.
    ///
    /// Only owned 2D images can be resized.
    pub fn resize(&mut self, width: u32, height: u32, filter: Filter) -> Result<(), ImageError> {
        self.transform_geometry(GeometryOp::Resize {
            width,
            height,
            filter,
        })
    }

    fn transform_geometry(&mut self, op: GeometryOp) -> Result<(), ImageError> {
        self.require_data("geometry transform")?;
        self.validate_geometry(op)?;
        self.discard_mipmaps()?;

        let num_faces = self.num_faces();
        let (width, height, depth, format) = (self.width, self.height, self.depth, self.format);
        let face_size = layout::calculate_size(0, 1, width, height, depth, format)?;
        match op {
            GeometryOp::FlipX => {
                let data = self.require_data_mut("flip")?;
                for face in data.chunks_exact_mut(face_size) {
                    let mut region = PixelBoxMut::new(face, width, height, depth, format)?;
                    bulk_vertical_flip(&mut region)?;
                }
            }
            GeometryOp::FlipY => {
                let row_bytes = self.row_span();
                let data = self.require_data_mut("flip")?;
                match format.element_size() {
                    1 => mirror_rows::<1>(data, row_bytes),
                    2 => mirror_rows::<2>(data, row_bytes),
                    3 => mirror_rows::<3>(data, row_bytes),
                    4 => mirror_rows::<4>(data, row_bytes),
                    n => {
                        return Err(ImageError::Internal(format!(
                            "no mirror for {n}-byte pixels"
                        )));
                    }
                }
            }
            GeometryOp::Resize {
                width: new_width,
                height: new_height,
                filter,
            } => {
                let new_face = layout::calculate_size(0, 1, new_width, new_height, 1, format)?;
                let new_size =
                    layout::calculate_size(0, num_faces, new_width, new_height, 1, format)?;
                let mut resized = vec![0u8; new_size];
                let data = self.require_data("resize")?;
                for (src, dst) in data
                    .chunks_exact(face_size)
                    .zip(resized.chunks_exact_mut(new_face))
                {
                    let src = PixelBox::new(src, width, height, 1, format)?;
                    let mut dst = PixelBoxMut::new(dst, new_width, new_height, 1, format)?;
                    resample::scale(&src, &mut dst, filter)?;
                }
                log::debug!(
                    "resized {num_faces} face(s) {width}x{height} -> {new_width}x{new_height}, {filter:?}"
                );
                self.set_layout(new_width, new_height, 1, format, num_faces, 0, new_size);
                self.buffer = Some(ImageBuffer::Owned(resized));
            }
        }
        Ok(())
    }

    /// Preconditions of a geometry transform, checked before anything changes.
    fn validate_geometry(&self, op: GeometryOp) -> Result<(), ImageError> {
        if !self.format.is_accessible() {
            return Err(ImageError::Unsupported(format!(
                "geometry transform of {:?} pixels",
                self.format
            )));
        }
        match op {
            GeometryOp::FlipX => Ok(()),
            GeometryOp::FlipY => match self.pixel_size {
                1..=4 => Ok(()),
                n => Err(ImageError::InvalidParameters(format!(
                    "cannot mirror {n}-byte pixels"
                ))),
            },
            GeometryOp::Resize { width, height, .. } => {
                if !self.buffer.as_ref().is_some_and(ImageBuffer::is_owned) {
                    return Err(ImageError::InvalidParameters(
                        "cannot resize a borrowed buffer".into(),
                    ));
                }
                if self.depth != 1 {
                    return Err(ImageError::InvalidParameters(format!(
                        "cannot resize a volume of depth {}",
                        self.depth
                    )));
                }
                if width == 0 || height == 0 {
                    return Err(ImageError::InvalidParameters(format!(
                        "cannot resize to {width}x{height}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Drop every level but the base, moving each face's base level down so
    /// the buffer stays tightly packed.
    fn discard_mipmaps(&mut self) -> Result<(), ImageError> {
        if self.num_mipmaps == 0 {
            return Ok(());
        }
        let num_faces = self.num_faces();
        let (width, height, depth, format) = (self.width, self.height, self.depth, self.format);
        let mut moves = Vec::with_capacity(num_faces);
        for face in 0..num_faces {
            moves.push(self.locate(face, 0)?);
        }
        let new_size = layout::calculate_size(0, num_faces, width, height, depth, format)?;

        let buffer = self
            .buffer
            .as_mut()
            .ok_or_else(|| ImageError::Internal("discarding mipmaps of an empty image".into()))?;
        let data = buffer.as_mut_slice();
        for (face, loc) in moves.iter().enumerate() {
            let dst = face * loc.size;
            data.copy_within(loc.offset..loc.offset + loc.size, dst);
        }
        buffer.truncate(new_size);

        log::debug!("discarded {} mip level(s)", self.num_mipmaps);
        self.num_mipmaps = 0;
        self.size = new_size;
        Ok(())
    }

    /// Fill every pixel of every face and level with `colour`.
    pub fn set_to(&mut self, colour: Colour) -> Result<(), ImageError> {
        let format = self.format;
        let pixel_size = self.pixel_size;
        let data = self.require_data_mut("set_to")?;
        if colour == Colour::new(0.0, 0.0, 0.0, 0.0) {
            data.fill(0);
            return Ok(());
        }
        if !format.is_accessible() {
            return Err(ImageError::Unsupported(format!("cannot fill {format:?} pixels")));
        }
        let mut packed = [0u8; 16];
        let packed = &mut packed[..pixel_size];
        format.pack_colour(colour, packed);
        for px in data.chunks_exact_mut(pixel_size) {
            px.copy_from_slice(packed);
        }
        Ok(())
    }

    /// Colour of the base-level pixel at (`x`, `y`, `z`) of the first face.
    pub fn colour_at(&self, x: u32, y: u32, z: u32) -> Result<Colour, ImageError> {
        let offset = self.pixel_offset("colour_at", x, y, z)?;
        let data = self.require_data("colour_at")?;
        Ok(self
            .format
            .unpack_colour(&data[offset..offset + self.pixel_size]))
    }

    /// Set the base-level pixel at (`x`, `y`, `z`) of the first face.
    pub fn set_colour_at(
        &mut self,
        colour: Colour,
        x: u32,
        y: u32,
        z: u32,
    ) -> Result<(), ImageError> {
        let offset = self.pixel_offset("set_colour_at", x, y, z)?;
        let (format, pixel_size) = (self.format, self.pixel_size);
        let data = self.require_data_mut("set_colour_at")?;
        format.pack_colour(colour, &mut data[offset..offset + pixel_size]);
        Ok(())
    }

    fn pixel_offset(&self, op: &str, x: u32, y: u32, z: u32) -> Result<usize, ImageError> {
        self.require_data(op)?;
        if !self.format.is_accessible() {
            return Err(ImageError::Unsupported(format!(
                "per-pixel access to {:?}",
                self.format
            )));
        }
        let axes = [("x", x, self.width), ("y", y, self.height), ("z", z, self.depth)];
        for (what, index, limit) in axes {
            if index >= limit {
                return Err(ImageError::OutOfRange {
                    what,
                    index: index as usize,
                    limit: limit as usize,
                });
            }
        }
        let (w, h) = (self.width as usize, self.height as usize);
        Ok(((z as usize * h + y as usize) * w + x as usize) * self.pixel_size)
    }

    /// Replace this image with `rgb` converted to `format`, taking alpha from
    /// the mean of `alpha`'s red, green and blue channels.
    ///
    /// Both sources must agree on dimensions, face count and mip count, and
    /// `format` must have four components. Nothing changes on failure.
    pub fn combine_two_images_as_rgba(
        &mut self,
        rgb: &Image<'_>,
        alpha: &Image<'_>,
        format: PixelFormat,
    ) -> Result<(), ImageError> {
        if (rgb.width, rgb.height, rgb.depth) != (alpha.width, alpha.height, alpha.depth) {
            return Err(ImageError::InvalidParameters(format!(
                "source dimensions differ: {}x{}x{} and {}x{}x{}",
                rgb.width, rgb.height, rgb.depth, alpha.width, alpha.height, alpha.depth
            )));
        }
        if rgb.num_mipmaps != alpha.num_mipmaps || rgb.num_faces() != alpha.num_faces() {
            return Err(ImageError::InvalidParameters(format!(
                "source layouts differ: {} mip(s) x {} face(s) and {} mip(s) x {} face(s)",
                rgb.num_mipmaps,
                rgb.num_faces(),
                alpha.num_mipmaps,
                alpha.num_faces()
            )));
        }
        if format.component_count() != 4 {
            return Err(ImageError::InvalidParameters(format!(
                "target format {format:?} does not have 4 components"
            )));
        }
        for f in [rgb.format, alpha.format, format] {
            if !f.is_accessible() {
                return Err(ImageError::InvalidParameters(format!(
                    "cannot combine {f:?} pixels"
                )));
            }
        }
        if rgb.is_empty() || alpha.is_empty() {
            return Err(ImageError::InvalidParameters("combining an empty image".into()));
        }

        let (width, height, depth) = (rgb.width, rgb.height, rgb.depth);
        let (num_faces, num_mipmaps) = (rgb.num_faces(), rgb.num_mipmaps);
        let size = layout::calculate_size(num_mipmaps, num_faces, width, height, depth, format)?;
        let mut combined = vec![0u8; size];
        let pixel_size = format.element_size();

        for face in 0..num_faces {
            for mip in 0..=num_mipmaps {
                let loc = layout::locate(
                    face,
                    mip,
                    width,
                    height,
                    depth,
                    format,
                    num_mipmaps,
                    num_faces,
                )?;
                let surface = &mut combined[loc.offset..loc.offset + loc.size];
                let mut dst = PixelBoxMut::new(surface, loc.width, loc.height, loc.depth, format)?;
                bulk_convert(&rgb.pixel_box(face, mip)?, &mut dst)?;

                let mask = alpha.pixel_box(face, mip)?;
                let mask_size = mask.format.element_size();
                for (px, m) in surface
                    .chunks_exact_mut(pixel_size)
                    .zip(mask.data().chunks_exact(mask_size))
                {
                    let m = mask.format.unpack_colour(m);
                    let mut c = format.unpack_colour(px);
                    c.a = (m.r + m.g + m.b) / 3.0;
                    format.pack_colour(c, px);
                }
            }
        }

        log::debug!(
            "combined {num_faces} face(s) x {} level(s) into {width}x{height}x{depth} {format:?}",
            num_mipmaps + 1
        );
        self.set_layout(width, height, depth, format, num_faces, num_mipmaps, size);
        self.buffer = Some(ImageBuffer::Owned(combined));
        Ok(())
    }

    /// Resample `src` into `dst`. See [`resample::scale`].
    pub fn scale(
        src: &PixelBox<'_>,
        dst: &mut PixelBoxMut<'_>,
        filter: Filter,
    ) -> Result<(), ImageError> {
        resample::scale(src, dst, filter)
    }

    /// Deep copy into an image that owns its buffer.
    pub fn to_owned_image(&self) -> Image<'static> {
        Image {
            width: self.width,
            height: self.height,
            depth: self.depth,
            size: self.size,
            num_mipmaps: self.num_mipmaps,
            flags: self.flags,
            format: self.format,
            pixel_size: self.pixel_size,
            buffer: self
                .buffer
                .as_ref()
                .map(|b| ImageBuffer::Owned(b.as_slice().to_vec())),
        }
    }

    /// An image borrowing this one's buffer. Writes through it are visible here.
    pub fn reborrow(&mut self) -> Image<'_> {
        Image {
            width: self.width,
            height: self.height,
            depth: self.depth,
            size: self.size,
            num_mipmaps: self.num_mipmaps,
            flags: self.flags,
            format: self.format,
            pixel_size: self.pixel_size,
            buffer: self
                .buffer
                .as_mut()
                .map(|b| ImageBuffer::Borrowed(b.as_mut_slice())),
        }
    }

    /// Release the buffer and clear all metadata.
    pub fn reset(&mut self) {
        *self = Image::default();
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Buffer size in bytes, across all faces and levels.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of mip levels beyond the base level.
    pub fn num_mipmaps(&self) -> u32 {
        self.num_mipmaps
    }

    pub fn flags(&self) -> ImageFlags {
        self.flags
    }

    pub fn has_flag(&self, flag: ImageFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn num_faces(&self) -> usize {
        if self.flags.contains(ImageFlags::CUBEMAP) {
            6
        } else {
            1
        }
    }

    /// Bytes per base-level row.
    pub fn row_span(&self) -> usize {
        self.width as usize * self.pixel_size
    }

    /// Bits per pixel.
    pub fn bpp(&self) -> usize {
        self.pixel_size * 8
    }

    pub fn pixel_size(&self) -> usize {
        self.pixel_size
    }

    pub fn has_alpha(&self) -> bool {
        self.format.has_alpha()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_none()
    }

    /// Whole buffer, or an empty slice for an empty image.
    pub fn data(&self) -> &[u8] {
        match &self.buffer {
            Some(b) => b.as_slice(),
            None => &[],
        }
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        match &mut self.buffer {
            Some(b) => b.as_mut_slice(),
            None => Default::default(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn set_layout(
        &mut self,
        width: u32,
        height: u32,
        depth: u32,
        format: PixelFormat,
        num_faces: usize,
        num_mipmaps: u32,
        size: usize,
    ) {
        self.width = width;
        self.height = height;
        self.depth = depth;
        self.format = format;
        self.num_mipmaps = num_mipmaps;
        self.size = size;
        self.pixel_size = format.element_size();
        self.flags = ImageFlags::for_layout(format, depth, num_faces);
    }

    fn require_data(&self, op: &str) -> Result<&[u8], ImageError> {
        self.buffer
            .as_ref()
            .map(ImageBuffer::as_slice)
            .ok_or_else(|| ImageError::Internal(format!("{op} on an empty image")))
    }

    fn require_data_mut(&mut self, op: &str) -> Result<&mut [u8], ImageError> {
        self.buffer
            .as_mut()
            .map(ImageBuffer::as_mut_slice)
            .ok_or_else(|| ImageError::Internal(format!("{op} on an empty image")))
    }
}

#[cfg(feature = "std")]
impl Image<'_> {
    /// Decode from a seekable stream.
    ///
    /// With an empty `type_hint`, the first [`MAGIC_LEN`](crate::MAGIC_LEN)
    /// bytes are peeked to pick a codec and the stream is rewound.
    pub fn load_reader<R: std::io::Read + std::io::Seek>(
        &mut self,
        reader: &mut R,
        type_hint: &str,
        codecs: &CodecRegistry,
    ) -> Result<(), ImageError> {
        use std::io::{Read, SeekFrom};

        let codec = if type_hint.is_empty() {
            let start = reader.stream_position()?;
            let mut magic = Vec::with_capacity(crate::codec::MAGIC_LEN);
            reader
                .by_ref()
                .take(crate::codec::MAGIC_LEN as u64)
                .read_to_end(&mut magic)?;
            reader.seek(SeekFrom::Start(start))?;
            codecs.by_magic(&magic)
        } else {
            codecs.by_extension(type_hint)
        };
        let codec = codec.ok_or(ImageError::UnrecognizedFormat)?;

        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let decoded = codec.decode(&data, None, &Unstoppable)?;
        self.install_decoded(decoded)
    }

    /// Decode a file, picking the codec from its extension, or from its
    /// signature when it has none.
    pub fn load_file(
        &mut self,
        path: impl AsRef<std::path::Path>,
        codecs: &CodecRegistry,
    ) -> Result<(), ImageError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let hint = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        log::debug!("loading {}", path.display());
        self.load(&data, hint, codecs)
    }

    /// Encode to a file, picking the codec from its extension.
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
        codecs: &CodecRegistry,
    ) -> Result<(), ImageError> {
        let path = path.as_ref();
        self.require_data("save")?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                ImageError::InvalidParameters(format!(
                    "{} has no extension to pick an encoder",
                    path.display()
                ))
            })?;
        let bytes = self.encode(ext, codecs)?;
        std::fs::write(path, bytes)?;
        log::debug!("saved {}", path.display());
        Ok(())
    }

    /// [`Image::load_raw_data`] from a stream whose remaining length must
    /// match the layout exactly.
    #[allow(clippy::too_many_arguments)]
    pub fn load_raw_reader<R: std::io::Read + std::io::Seek>(
        &mut self,
        reader: &mut R,
        width: u32,
        height: u32,
        depth: u32,
        format: PixelFormat,
        num_faces: usize,
        num_mipmaps: u32,
    ) -> Result<(), ImageError> {
        use std::io::SeekFrom;

        check_faces(num_faces)?;
        let size = layout::calculate_size(num_mipmaps, num_faces, width, height, depth, format)?;
        let start = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(start))?;
        let available = end.saturating_sub(start);
        if available != size as u64 {
            return Err(ImageError::InvalidParameters(format!(
                "stream holds {available} bytes, layout needs {size}"
            )));
        }
        let mut data = vec![0u8; size];
        reader.read_exact(&mut data)?;
        self.load_dynamic_image(
            ImageBuffer::Owned(data),
            width,
            height,
            depth,
            format,
            num_faces,
            num_mipmaps,
        )
    }
}

/// Pixel types a base level can be viewed as.
#[cfg(feature = "imgref")]
pub trait ImgPixel: Copy + 'static {
    const FORMAT: PixelFormat;
}

#[cfg(feature = "imgref")]
mod typed {
    use super::*;
    use rgb::AsPixels as _;

    impl ImgPixel for rgb::Gray<u8> {
        const FORMAT: PixelFormat = PixelFormat::L8;
    }
    impl ImgPixel for rgb::Rgb<u8> {
        const FORMAT: PixelFormat = PixelFormat::R8G8B8;
    }
    impl ImgPixel for rgb::Rgba<u8> {
        const FORMAT: PixelFormat = PixelFormat::R8G8B8A8;
    }
    impl ImgPixel for rgb::alt::BGRA<u8> {
        const FORMAT: PixelFormat = PixelFormat::B8G8R8A8;
    }

    impl Image<'_> {
        /// Typed view of the first face's base level, for 2D images.
        pub fn as_imgref<P: ImgPixel>(&self) -> Result<imgref::ImgRef<'_, P>, ImageError>
        where
            [u8]: rgb::AsPixels<P>,
        {
            if self.format != P::FORMAT {
                return Err(ImageError::LayoutMismatch {
                    expected: P::FORMAT,
                    actual: self.format,
                });
            }
            if self.depth != 1 {
                return Err(ImageError::Unsupported(format!(
                    "2D view of a volume of depth {}",
                    self.depth
                )));
            }
            let base = self.pixel_box(0, 0)?;
            let pixels: &[P] = base.data().as_pixels();
            Ok(imgref::ImgRef::new(
                pixels,
                self.width as usize,
                self.height as usize,
            ))
        }

        /// Owned copy of [`Image::as_imgref`].
        pub fn to_imgvec<P: ImgPixel>(&self) -> Result<imgref::ImgVec<P>, ImageError>
        where
            [u8]: rgb::AsPixels<P>,
        {
            let view = self.as_imgref::<P>()?;
            Ok(imgref::ImgVec::new(
                view.buf().to_vec(),
                view.width(),
                view.height(),
            ))
        }
    }
}

fn check_faces(num_faces: usize) -> Result<(), ImageError> {
    match num_faces {
        1 | 6 => Ok(()),
        n => Err(ImageError::InvalidParameters(format!(
            "face count must be 1 or 6, got {n}"
        ))),
    }
}

fn find_codec<'r>(
    data: &[u8],
    type_hint: &str,
    codecs: &'r CodecRegistry,
) -> Result<&'r dyn Codec, ImageError> {
    let codec = if type_hint.is_empty() {
        codecs.by_magic(data)
    } else {
        codecs.by_extension(type_hint)
    };
    codec.ok_or(ImageError::UnrecognizedFormat)
}

/// Reverse the `N`-byte elements of every `row_bytes`-long row.
fn mirror_rows<const N: usize>(data: &mut [u8], row_bytes: usize) {
    for row in data.chunks_exact_mut(row_bytes) {
        let (pixels, _) = row.as_chunks_mut::<N>();
        pixels.reverse();
    }
}
