//! PNM header parsing and sample decoding.

use alloc::vec::Vec;
use enough::Stop;

use super::{PnmFormat, PnmHeader};
use crate::error::ImageError;

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Skip whitespace and `#` comments running to end of line.
    fn skip_separators(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.data.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a [u8], ImageError> {
        self.skip_separators();
        let start = self.pos;
        while self
            .data
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(ImageError::UnexpectedEof);
        }
        Ok(&self.data[start..self.pos])
    }

    fn number(&mut self, what: &str) -> Result<u32, ImageError> {
        let token = self.token()?;
        core::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| ImageError::InvalidHeader(alloc::format!("bad {what}")))
    }

    /// Consume the single whitespace byte that ends a P5/P6/PFM header.
    fn end_of_header(&mut self) -> Result<usize, ImageError> {
        match self.data.get(self.pos) {
            Some(b) if b.is_ascii_whitespace() => Ok(self.pos + 1),
            Some(_) => Err(ImageError::InvalidHeader(
                "missing whitespace after header".into(),
            )),
            None => Err(ImageError::UnexpectedEof),
        }
    }

    /// Move past the next newline.
    fn next_line(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            self.pos += 1;
            if b == b'\n' {
                break;
            }
        }
    }
}

fn nonzero(width: u32, height: u32) -> Result<(), ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidHeader(alloc::format!(
            "zero dimension {width}x{height}"
        )));
    }
    Ok(())
}

fn check_maxval(maxval: u32) -> Result<(), ImageError> {
    if maxval == 0 || maxval > 65535 {
        return Err(ImageError::InvalidHeader(alloc::format!(
            "maxval {maxval} outside 1..=65535"
        )));
    }
    Ok(())
}

/// Parse any supported PNM header.
pub(crate) fn parse_header(data: &[u8]) -> Result<PnmHeader, ImageError> {
    if data.len() < 2 {
        return Err(ImageError::UnexpectedEof);
    }
    if data[0] != b'P' {
        return Err(ImageError::UnrecognizedFormat);
    }
    let mut cursor = Cursor::new(data);
    cursor.pos = 2;
    match data[1] {
        b'5' | b'6' => {
            let width = cursor.number("width")?;
            let height = cursor.number("height")?;
            let maxval = cursor.number("maxval")?;
            nonzero(width, height)?;
            check_maxval(maxval)?;
            let data_offset = cursor.end_of_header()?;
            let (format, channels) = if data[1] == b'5' {
                (PnmFormat::Pgm, 1)
            } else {
                (PnmFormat::Ppm, 3)
            };
            Ok(PnmHeader {
                format,
                width,
                height,
                maxval,
                channels,
                pfm_scale: 0.0,
                data_offset,
            })
        }
        b'F' | b'f' => {
            let width = cursor.number("width")?;
            let height = cursor.number("height")?;
            let scale = cursor.token()?;
            let pfm_scale = core::str::from_utf8(scale)
                .ok()
                .and_then(|s| s.parse::<f32>().ok())
                .filter(|s| *s != 0.0 && s.is_finite())
                .ok_or_else(|| ImageError::InvalidHeader("bad PFM scale".into()))?;
            nonzero(width, height)?;
            let data_offset = cursor.end_of_header()?;
            Ok(PnmHeader {
                format: PnmFormat::Pfm,
                width,
                height,
                maxval: 0,
                channels: if data[1] == b'F' { 3 } else { 1 },
                pfm_scale,
                data_offset,
            })
        }
        b'7' => parse_pam(cursor),
        _ => Err(ImageError::UnrecognizedFormat),
    }
}

fn parse_pam(mut cursor: Cursor<'_>) -> Result<PnmHeader, ImageError> {
    let (mut width, mut height, mut depth, mut maxval) = (None, None, None, None);
    loop {
        let key = cursor.token()?;
        match key {
            b"ENDHDR" => {
                cursor.next_line();
                break;
            }
            b"WIDTH" => width = Some(cursor.number("WIDTH")?),
            b"HEIGHT" => height = Some(cursor.number("HEIGHT")?),
            b"DEPTH" => depth = Some(cursor.number("DEPTH")?),
            b"MAXVAL" => maxval = Some(cursor.number("MAXVAL")?),
            // TUPLTYPE and unknown keys: channel meaning follows DEPTH.
            _ => cursor.next_line(),
        }
    }
    let missing = |key: &str| ImageError::InvalidHeader(alloc::format!("PAM missing {key}"));
    let width = width.ok_or_else(|| missing("WIDTH"))?;
    let height = height.ok_or_else(|| missing("HEIGHT"))?;
    let depth = depth.ok_or_else(|| missing("DEPTH"))?;
    let maxval = maxval.ok_or_else(|| missing("MAXVAL"))?;
    nonzero(width, height)?;
    check_maxval(maxval)?;
    Ok(PnmHeader {
        format: PnmFormat::Pam,
        width,
        height,
        maxval,
        channels: depth as usize,
        pfm_scale: 0.0,
        data_offset: cursor.pos,
    })
}

/// Decode integer samples to 8-bit (maxval <= 255) or native-endian 16-bit.
pub(crate) fn decode_integer(
    pixel_data: &[u8],
    header: &PnmHeader,
    out_bytes: usize,
    stop: &dyn Stop,
) -> Result<Vec<u8>, ImageError> {
    let wide = header.maxval > 255;
    // Same byte count in and out: 16-bit samples stay 16-bit.
    let src = pixel_data.get(..out_bytes).ok_or(ImageError::UnexpectedEof)?;
    let maxval = header.maxval;
    let row_bytes = out_bytes / header.height as usize;

    if !wide && maxval == 255 {
        return Ok(src.to_vec());
    }

    let mut out = Vec::with_capacity(out_bytes);
    for (row_idx, row) in src.chunks_exact(row_bytes).enumerate() {
        if row_idx % 16 == 0 {
            stop.check()?;
        }
        if wide {
            for pair in row.chunks_exact(2) {
                let v = u32::from(u16::from_be_bytes([pair[0], pair[1]])).min(maxval);
                let scaled = if maxval == 65535 {
                    v
                } else {
                    (v * 65535 + maxval / 2) / maxval
                };
                out.extend_from_slice(&(scaled as u16).to_ne_bytes());
            }
        } else {
            for &b in row {
                let v = u32::from(b).min(maxval);
                out.push(((v * 255 + maxval / 2) / maxval) as u8);
            }
        }
    }
    Ok(out)
}

/// Decode PFM samples to native-endian f32, flipping bottom-up rows.
pub(crate) fn decode_pfm(
    pixel_data: &[u8],
    header: &PnmHeader,
    out_bytes: usize,
    stop: &dyn Stop,
) -> Result<Vec<u8>, ImageError> {
    let src = pixel_data.get(..out_bytes).ok_or(ImageError::UnexpectedEof)?;
    let little_endian = header.pfm_scale < 0.0;
    let row_bytes = out_bytes / header.height as usize;

    let mut out = Vec::with_capacity(out_bytes);
    for (i, row) in src.chunks_exact(row_bytes).rev().enumerate() {
        if i % 16 == 0 {
            stop.check()?;
        }
        for sample in row.chunks_exact(4) {
            let bytes = [sample[0], sample[1], sample[2], sample[3]];
            let v = if little_endian {
                f32::from_le_bytes(bytes)
            } else {
                f32::from_be_bytes(bytes)
            };
            out.extend_from_slice(&v.to_ne_bytes());
        }
    }
    Ok(out)
}
