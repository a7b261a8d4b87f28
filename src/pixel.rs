//! Pixel format catalog: element sizes, component counts, compression
//! predicates, and packing of a [`Colour`] to and from raw element bytes.

/// A normalised RGBA colour. Integer channels map to `0.0..=1.0`.
pub type Colour = rgb::Rgba<f32>;

/// Storage type of one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChannelType {
    /// 8-bit unsigned normalised.
    U8 = 1,
    /// 16-bit unsigned normalised (native endian).
    U16 = 2,
    /// 32-bit float (native endian).
    F32 = 4,
}

impl ChannelType {
    /// Byte size of a single channel value.
    #[inline]
    pub const fn byte_size(self) -> usize {
        self as usize
    }
}

/// Meaning of one channel slot inside an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
    /// Luminance: unpacks to R, G and B, packs from R.
    L,
    /// Padding. Ignored on unpack, written as the channel maximum on pack.
    X,
}

/// Pixel formats. Channel order is memory byte order.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// No format; images in this format hold no data.
    #[default]
    Unknown,
    /// 8-bit luminance.
    L8,
    /// 16-bit luminance.
    L16,
    /// 8-bit alpha only.
    A8,
    /// 8-bit red only.
    R8,
    /// 8-bit luminance followed by 8-bit alpha.
    ByteLa,
    R8G8B8,
    B8G8R8,
    R8G8B8A8,
    B8G8R8A8,
    A8R8G8B8,
    A8B8G8R8,
    /// Opaque, first byte is padding.
    X8R8G8B8,
    /// Opaque, first byte is padding.
    X8B8G8R8,
    /// 3 × 16-bit RGB.
    ShortRgb,
    /// 4 × 16-bit RGBA.
    ShortRgba,
    Float32R,
    Float32Rg,
    Float32Rgb,
    Float32Rgba,
    /// BC1 / DXT1: 8 bytes per 4×4 block.
    Bc1,
    /// BC2 / DXT3: 16 bytes per 4×4 block.
    Bc2,
    /// BC3 / DXT5: 16 bytes per 4×4 block.
    Bc3,
}

use Channel::{A, B, G, L, R, X};

impl PixelFormat {
    /// Channel slots in memory order. Empty for compressed and unknown formats.
    pub const fn channels(self) -> &'static [Channel] {
        match self {
            Self::L8 | Self::L16 => &[L],
            Self::A8 => &[A],
            Self::R8 | Self::Float32R => &[R],
            Self::ByteLa => &[L, A],
            Self::Float32Rg => &[R, G],
            Self::R8G8B8 | Self::ShortRgb | Self::Float32Rgb => &[R, G, B],
            Self::B8G8R8 => &[B, G, R],
            Self::R8G8B8A8 | Self::ShortRgba | Self::Float32Rgba => &[R, G, B, A],
            Self::B8G8R8A8 => &[B, G, R, A],
            Self::A8R8G8B8 => &[A, R, G, B],
            Self::A8B8G8R8 => &[A, B, G, R],
            Self::X8R8G8B8 => &[X, R, G, B],
            Self::X8B8G8R8 => &[X, B, G, R],
            Self::Unknown | Self::Bc1 | Self::Bc2 | Self::Bc3 => &[],
        }
    }

    /// Channel storage type, `None` for compressed and unknown formats.
    pub const fn channel_type(self) -> Option<ChannelType> {
        match self {
            Self::Unknown | Self::Bc1 | Self::Bc2 | Self::Bc3 => None,
            Self::L16 | Self::ShortRgb | Self::ShortRgba => Some(ChannelType::U16),
            Self::Float32R | Self::Float32Rg | Self::Float32Rgb | Self::Float32Rgba => {
                Some(ChannelType::F32)
            }
            _ => Some(ChannelType::U8),
        }
    }

    /// Bytes per element. Zero for compressed and unknown formats, whose
    /// pixels are not individually addressable.
    pub const fn element_size(self) -> usize {
        match self.channel_type() {
            Some(ty) => self.channels().len() * ty.byte_size(),
            None => 0,
        }
    }

    /// Number of meaningful colour components (padding excluded).
    pub fn component_count(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::Bc1 => 3,
            Self::Bc2 | Self::Bc3 => 4,
            _ => self.channels().iter().filter(|c| **c != X).count(),
        }
    }

    /// Whether pixels are stored in fixed-size compressed blocks.
    pub const fn is_compressed(self) -> bool {
        matches!(self, Self::Bc1 | Self::Bc2 | Self::Bc3)
    }

    /// Whether individual pixels can be packed and unpacked.
    pub const fn is_accessible(self) -> bool {
        !matches!(self, Self::Unknown) && !self.is_compressed()
    }

    pub fn has_alpha(self) -> bool {
        match self {
            Self::Bc2 | Self::Bc3 => true,
            _ => self.channels().contains(&A),
        }
    }

    /// Compressed block edge length and byte size.
    const fn block(self) -> Option<(usize, usize)> {
        match self {
            Self::Bc1 => Some((4, 8)),
            Self::Bc2 | Self::Bc3 => Some((4, 16)),
            _ => None,
        }
    }

    /// Bytes needed to store a `width × height × depth` region.
    ///
    /// Block-aligned for compressed formats. `None` on overflow.
    pub fn memory_size(self, width: u32, height: u32, depth: u32) -> Option<usize> {
        let (w, h, d) = (width as usize, height as usize, depth as usize);
        if let Some((edge, bytes)) = self.block() {
            let blocks_x = w.div_ceil(edge);
            let blocks_y = h.div_ceil(edge);
            return blocks_x
                .checked_mul(blocks_y)?
                .checked_mul(bytes)?
                .checked_mul(d);
        }
        w.checked_mul(h)?.checked_mul(d)?.checked_mul(self.element_size())
    }

    /// Decode one element into a normalised colour.
    ///
    /// `src` must hold at least [`element_size`](Self::element_size) bytes.
    /// Channels the format lacks keep their defaults (0 for RGB, 1 for alpha).
    pub fn unpack_colour(self, src: &[u8]) -> Colour {
        let mut colour = Colour::new(0.0, 0.0, 0.0, 1.0);
        let Some(ty) = self.channel_type() else {
            return colour;
        };
        let size = ty.byte_size();
        for (i, channel) in self.channels().iter().enumerate() {
            let v = read_channel(ty, &src[i * size..(i + 1) * size]);
            match channel {
                R => colour.r = v,
                G => colour.g = v,
                B => colour.b = v,
                A => colour.a = v,
                L => {
                    colour.r = v;
                    colour.g = v;
                    colour.b = v;
                }
                X => {}
            }
        }
        colour
    }

    /// Encode a colour into one element.
    ///
    /// `dst` must hold at least [`element_size`](Self::element_size) bytes.
    /// Integer channels are clamped to `0.0..=1.0` and rounded.
    pub fn pack_colour(self, colour: Colour, dst: &mut [u8]) {
        let Some(ty) = self.channel_type() else {
            return;
        };
        let size = ty.byte_size();
        for (i, channel) in self.channels().iter().enumerate() {
            let v = match channel {
                R | L => colour.r,
                G => colour.g,
                B => colour.b,
                A => colour.a,
                X => 1.0,
            };
            write_channel(ty, v, &mut dst[i * size..(i + 1) * size]);
        }
    }
}

fn read_channel(ty: ChannelType, bytes: &[u8]) -> f32 {
    match ty {
        ChannelType::U8 => f32::from(bytes[0]) / 255.0,
        ChannelType::U16 => f32::from(u16::from_ne_bytes([bytes[0], bytes[1]])) / 65535.0,
        ChannelType::F32 => f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

fn write_channel(ty: ChannelType, v: f32, bytes: &mut [u8]) {
    match ty {
        ChannelType::U8 => bytes[0] = (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        ChannelType::U16 => {
            let q = (v.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16;
            bytes.copy_from_slice(&q.to_ne_bytes());
        }
        ChannelType::F32 => bytes.copy_from_slice(&v.to_ne_bytes()),
    }
}
