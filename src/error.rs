use alloc::string::String;
use enough::StopReason;

use crate::pixel::PixelFormat;

/// Errors from image layout, resampling, and codec operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ImageError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("{what} index {index} out of range (limit {limit})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        limit: usize,
    },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("unrecognized image format")]
    UnrecognizedFormat,

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid pixel data: {0}")]
    InvalidData(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("dimensions too large: {width}x{height}x{depth}")]
    DimensionsTooLarge { width: u32, height: u32, depth: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("pixel format mismatch: expected {expected:?}, got {actual:?}")]
    LayoutMismatch {
        expected: PixelFormat,
        actual: PixelFormat,
    },

    #[error("operation cancelled")]
    Cancelled(StopReason),

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<StopReason> for ImageError {
    fn from(r: StopReason) -> Self {
        ImageError::Cancelled(r)
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for ImageError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ImageError::UnexpectedEof,
            _ => ImageError::Io(alloc::format!("{e}")),
        }
    }
}
