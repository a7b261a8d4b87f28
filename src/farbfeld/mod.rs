//! Farbfeld codec.
//!
//! Farbfeld is a simple lossless format: 8-byte magic ("farbfeld"),
//! width/height as u32 big-endian, then RGBA u16 big-endian pixels.
//! Decodes to [`PixelFormat::ShortRgba`].
//!
//! Implementation draws from [zune-farbfeld](https://github.com/etemesi254/zune-image)
//! by Caleb Etemesi (MIT/Apache-2.0/Zlib licensed).

mod decode;
mod encode;

use alloc::vec::Vec;
use enough::Stop;

use crate::codec::{Codec, DecodedImage, ImageData, flat_2d, require_flat_2d};
use crate::error::ImageError;
use crate::limits::Limits;
use crate::pixel::PixelFormat;

/// The bundled farbfeld codec (`.ff`, `.farbfeld`).
#[derive(Clone, Copy, Debug, Default)]
pub struct FarbfeldCodec;

impl Codec for FarbfeldCodec {
    fn type_name(&self) -> &'static str {
        "ff"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ff", "farbfeld"]
    }

    fn magic_matches(&self, magic: &[u8]) -> bool {
        magic.starts_with(decode::MAGIC)
    }

    fn decode(
        &self,
        data: &[u8],
        limits: Option<&Limits>,
        stop: &dyn Stop,
    ) -> Result<DecodedImage, ImageError> {
        let (width, height) = decode::parse_header(data)?;
        if let Some(limits) = limits {
            limits.check(width, height, 1)?;
        }
        let out_bytes = PixelFormat::ShortRgba
            .memory_size(width, height, 1)
            .ok_or(ImageError::DimensionsTooLarge {
                width,
                height,
                depth: 1,
            })?;
        if let Some(limits) = limits {
            limits.check_memory(out_bytes)?;
        }
        stop.check()?;
        let pixels = decode::decode_pixels(data, width, height, stop)?;
        Ok(DecodedImage {
            data: flat_2d(width, height, PixelFormat::ShortRgba, pixels.len()),
            pixels,
        })
    }

    fn encode(
        &self,
        meta: &ImageData,
        pixels: &[u8],
        stop: &dyn Stop,
    ) -> Result<Vec<u8>, ImageError> {
        require_flat_2d(meta, "farbfeld")?;
        encode::encode_farbfeld(pixels, meta.width, meta.height, meta.format, stop)
    }
}
