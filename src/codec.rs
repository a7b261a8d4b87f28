//! Codec capability objects and the registry that looks them up.
//!
//! Lookups fail closed: an unknown extension or signature yields `None`,
//! never a best-effort guess.

use alloc::boxed::Box;
use alloc::vec::Vec;
use enough::Stop;

use crate::error::ImageError;
use crate::image::ImageFlags;
use crate::limits::Limits;
use crate::pixel::PixelFormat;

/// Bytes sniffed from the start of a stream to identify its codec.
pub const MAGIC_LEN: usize = 32;

/// Image metadata exchanged with codecs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Total pixel bytes across all faces and mip levels.
    pub size: usize,
    pub num_mipmaps: u32,
    pub flags: ImageFlags,
    pub format: PixelFormat,
}

/// Decoder output. Ownership of `pixels` moves into the image that loads it.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub data: ImageData,
    pub pixels: Vec<u8>,
}

/// An image file format that can decode and encode pixel buffers.
pub trait Codec: Send + Sync {
    /// Canonical type name, also the preferred file extension.
    fn type_name(&self) -> &'static str;

    /// File extensions handled by this codec, lowercase, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Whether `magic` (up to [`MAGIC_LEN`] leading bytes) is this codec's signature.
    fn magic_matches(&self, magic: &[u8]) -> bool;

    /// Decode a complete encoded image.
    fn decode(
        &self,
        data: &[u8],
        limits: Option<&Limits>,
        stop: &dyn Stop,
    ) -> Result<DecodedImage, ImageError>;

    /// Encode `pixels`, laid out as described by `meta`.
    fn encode(
        &self,
        meta: &ImageData,
        pixels: &[u8],
        stop: &dyn Stop,
    ) -> Result<Vec<u8>, ImageError>;
}

/// Codecs addressable by extension or magic signature.
pub struct CodecRegistry {
    codecs: Vec<Box<dyn Codec>>,
}

impl Default for CodecRegistry {
    /// Registry holding the bundled farbfeld and PNM codecs.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::farbfeld::FarbfeldCodec));
        registry.register(Box::new(crate::pnm::PnmCodec));
        registry
    }
}

impl core::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.codecs.iter().map(|c| c.type_name()))
            .finish()
    }
}

impl CodecRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self { codecs: Vec::new() }
    }

    /// Add a codec. Later registrations win on conflicting extensions or signatures.
    pub fn register(&mut self, codec: Box<dyn Codec>) {
        self.codecs.push(codec);
    }

    /// Codec for a file extension or type name, ASCII case-insensitive.
    pub fn by_extension(&self, ext: &str) -> Option<&dyn Codec> {
        self.codecs
            .iter()
            .rev()
            .find(|c| {
                c.type_name().eq_ignore_ascii_case(ext)
                    || c.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext))
            })
            .map(|c| &**c)
    }

    /// Codec whose signature matches the leading bytes of `magic`.
    pub fn by_magic(&self, magic: &[u8]) -> Option<&dyn Codec> {
        let magic = &magic[..magic.len().min(MAGIC_LEN)];
        self.codecs
            .iter()
            .rev()
            .find(|c| c.magic_matches(magic))
            .map(|c| &**c)
    }
}

/// Reject metadata the single-surface bundled codecs cannot write.
pub(crate) fn require_flat_2d(meta: &ImageData, codec: &str) -> Result<(), ImageError> {
    if meta.depth != 1 || meta.flags.contains(ImageFlags::CUBEMAP) {
        return Err(ImageError::Unsupported(alloc::format!(
            "{codec} stores a single 2D surface, got depth {} cubemap {}",
            meta.depth,
            meta.flags.contains(ImageFlags::CUBEMAP)
        )));
    }
    Ok(())
}

/// Metadata for a freshly decoded single-surface image.
pub(crate) fn flat_2d(width: u32, height: u32, format: PixelFormat, size: usize) -> ImageData {
    ImageData {
        width,
        height,
        depth: 1,
        size,
        num_mipmaps: 0,
        flags: ImageFlags::empty(),
        format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_resolves_extensions() {
        let registry = CodecRegistry::default();
        assert_eq!(registry.by_extension("FF").unwrap().type_name(), "ff");
        assert_eq!(registry.by_extension("ppm").unwrap().type_name(), "pnm");
        assert!(registry.by_extension("png").is_none());
        assert!(registry.by_extension("").is_none());
    }

    #[test]
    fn magic_lookup_fails_closed() {
        let registry = CodecRegistry::default();
        assert!(registry.by_magic(b"farbfeld\0\0\0\x01").is_some());
        assert!(registry.by_magic(b"P6\n1 1\n255\n").is_some());
        assert!(registry.by_magic(b"\x89PNG\r\n\x1a\n").is_none());
        assert!(registry.by_magic(b"").is_none());
        assert!(CodecRegistry::new().by_magic(b"farbfeld").is_none());
    }
}
