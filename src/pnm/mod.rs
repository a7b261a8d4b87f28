//! PNM family: P5 (PGM), P6 (PPM), P7 (PAM), PFM.
//!
//! Credits: Implementation draws from [zune-ppm](https://github.com/etemesi254/zune-image)
//! by Caleb Etemesi (MIT/Apache-2.0/Zlib licensed).

mod decode;
mod encode;

use alloc::vec::Vec;
use enough::Stop;

use crate::codec::{Codec, DecodedImage, ImageData, flat_2d, require_flat_2d};
use crate::error::ImageError;
use crate::limits::Limits;
use crate::pixel::PixelFormat;

/// Which PNM sub-format a file uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PnmFormat {
    /// P5: binary grayscale (PGM).
    Pgm,
    /// P6: binary RGB (PPM).
    Ppm,
    /// P7: PAM (arbitrary channels, with TUPLTYPE header).
    Pam,
    /// PFM: floating-point (grayscale or RGB, 32-bit float).
    Pfm,
}

/// Parsed PNM header.
#[derive(Clone, Debug)]
pub(crate) struct PnmHeader {
    pub format: PnmFormat,
    pub width: u32,
    pub height: u32,
    pub maxval: u32,
    /// Samples per pixel.
    pub channels: usize,
    /// PFM only: negative means little-endian samples.
    pub pfm_scale: f32,
    pub data_offset: usize,
}

impl PnmHeader {
    /// Pixel format the decoded samples are stored in.
    fn pixel_format(&self) -> Result<PixelFormat, ImageError> {
        let wide = self.maxval > 255;
        let format = match (self.format, self.channels, wide) {
            (PnmFormat::Pfm, 1, _) => PixelFormat::Float32R,
            (PnmFormat::Pfm, 3, _) => PixelFormat::Float32Rgb,
            (_, 1, false) => PixelFormat::L8,
            (_, 1, true) => PixelFormat::L16,
            (_, 2, false) => PixelFormat::ByteLa,
            (_, 3, false) => PixelFormat::R8G8B8,
            (_, 3, true) => PixelFormat::ShortRgb,
            (_, 4, false) => PixelFormat::R8G8B8A8,
            (_, 4, true) => PixelFormat::ShortRgba,
            (format, channels, _) => {
                return Err(ImageError::Unsupported(alloc::format!(
                    "{format:?} with {channels} channels and maxval {}",
                    self.maxval
                )));
            }
        };
        Ok(format)
    }
}

/// The bundled PNM codec (`.pnm`, `.ppm`, `.pgm`, `.pam`, `.pfm`).
#[derive(Clone, Copy, Debug, Default)]
pub struct PnmCodec;

impl Codec for PnmCodec {
    fn type_name(&self) -> &'static str {
        "pnm"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["pnm", "ppm", "pgm", "pam", "pfm"]
    }

    fn magic_matches(&self, magic: &[u8]) -> bool {
        matches!(
            magic,
            [b'P', b'5' | b'6' | b'7' | b'F' | b'f', sep, ..] if sep.is_ascii_whitespace()
        )
    }

    fn decode(
        &self,
        data: &[u8],
        limits: Option<&Limits>,
        stop: &dyn Stop,
    ) -> Result<DecodedImage, ImageError> {
        let header = decode::parse_header(data)?;
        if let Some(limits) = limits {
            limits.check(header.width, header.height, 1)?;
        }
        let format = header.pixel_format()?;
        let out_bytes = format
            .memory_size(header.width, header.height, 1)
            .ok_or(ImageError::DimensionsTooLarge {
                width: header.width,
                height: header.height,
                depth: 1,
            })?;
        if let Some(limits) = limits {
            limits.check_memory(out_bytes)?;
        }
        stop.check()?;

        let pixel_data = data
            .get(header.data_offset..)
            .ok_or(ImageError::UnexpectedEof)?;
        let pixels = match header.format {
            PnmFormat::Pfm => decode::decode_pfm(pixel_data, &header, out_bytes, stop)?,
            _ => decode::decode_integer(pixel_data, &header, out_bytes, stop)?,
        };
        Ok(DecodedImage {
            data: flat_2d(header.width, header.height, format, pixels.len()),
            pixels,
        })
    }

    fn encode(
        &self,
        meta: &ImageData,
        pixels: &[u8],
        stop: &dyn Stop,
    ) -> Result<Vec<u8>, ImageError> {
        require_flat_2d(meta, "PNM")?;
        encode::encode_pnm(pixels, meta.width, meta.height, meta.format, stop)
    }
}
