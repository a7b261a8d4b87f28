//! # zensurface
//!
//! In-memory bitmap container with cubemap faces, mip chains and volume
//! slices in one contiguous buffer, plus the pixel operations that work on it.
//!
//! ## Buffer Layout
//!
//! An [`Image`] stores one face (or six, for cubemaps), each followed by its
//! mip levels. Level *m* has each axis halved *m* times, floored at 1.
//! [`calculate_size`] and [`locate`] describe this layout; raw dumps loaded
//! with [`Image::load_raw_data`] must follow it byte for byte.
//!
//! ## Operations
//!
//! - Region views ([`PixelBox`], [`PixelBoxMut`]) over any (face, mip) surface
//! - Resampling ([`scale`]) with nearest or bilinear/trilinear filtering and
//!   on-the-fly format conversion
//! - Flips and resize, which discard the mip chain
//! - Per-pixel colour access and fills through [`Colour`]
//! - Combining a colour image and a grayscale mask into an RGBA image
//!
//! ## Codecs
//!
//! Encoded files go through a [`CodecRegistry`]. The default registry holds
//! two small lossless codecs: farbfeld ([`FarbfeldCodec`]) and PNM/PAM/PFM
//! ([`PnmCodec`]). Other formats plug in through the [`Codec`] trait.
//!
//! ## Credits
//!
//! The PNM implementation draws heavily from [zune-ppm](https://github.com/etemesi254/zune-image)
//! by Caleb Etemesi (MIT/Apache-2.0/Zlib licensed).
//!
//! ## Usage
//!
//! ```
//! use zensurface::{CodecRegistry, Colour, Filter, Image, PixelFormat};
//!
//! let mut image = Image::new(PixelFormat::R8G8B8A8, 4, 4, 1)?;
//! image.set_to(Colour::new(1.0, 0.0, 0.0, 1.0))?;
//! image.resize(8, 8, Filter::Bilinear)?;
//!
//! let codecs = CodecRegistry::default();
//! let encoded = image.encode("pam", &codecs)?;
//!
//! let mut decoded = Image::default();
//! decoded.load(&encoded, "", &codecs)?;
//! assert_eq!((decoded.width(), decoded.height()), (8, 8));
//! # Ok::<(), zensurface::ImageError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod codec;
mod error;
mod image;
mod layout;
mod limits;
mod pixel;
mod pixel_box;
mod resample;

pub mod farbfeld;
pub mod pnm;

pub use codec::{Codec, CodecRegistry, DecodedImage, ImageData, MAGIC_LEN};
pub use enough::{Stop, Unstoppable};
pub use error::ImageError;
pub use farbfeld::FarbfeldCodec;
#[cfg(feature = "imgref")]
pub use image::ImgPixel;
pub use image::{Image, ImageBuffer, ImageFlags};
pub use layout::{MipChain, SurfaceLocation, calculate_size, locate};
pub use limits::Limits;
pub use pixel::{Channel, ChannelType, Colour, PixelFormat};
pub use pixel_box::{PixelBox, PixelBoxMut, bulk_convert, bulk_vertical_flip};
pub use pnm::PnmCodec;
pub use resample::{Filter, scale};
