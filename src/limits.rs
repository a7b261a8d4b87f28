use alloc::format;

use crate::error::ImageError;

/// Caps on image dimensions and buffer size, applied while decoding.
///
/// Every cap is optional; [`Limits::default`] enforces nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    pub max_depth: Option<u64>,
    /// Base-level pixel count, `width * height * depth`.
    pub max_pixels: Option<u64>,
    /// Whole buffer, every face and mip level included.
    pub max_memory_bytes: Option<u64>,
}

fn enforce(what: &str, value: u64, cap: Option<u64>) -> Result<(), ImageError> {
    match cap {
        Some(cap) if value > cap => Err(ImageError::LimitExceeded(format!(
            "{what} {value} exceeds limit {cap}"
        ))),
        _ => Ok(()),
    }
}

impl Limits {
    /// Reject base dimensions over any dimension or pixel-count cap.
    pub(crate) fn check(&self, width: u32, height: u32, depth: u32) -> Result<(), ImageError> {
        let (w, h, d) = (u64::from(width), u64::from(height), u64::from(depth));
        enforce("width", w, self.max_width)?;
        enforce("height", h, self.max_height)?;
        enforce("depth", d, self.max_depth)?;
        let pixels = w.saturating_mul(h).saturating_mul(d);
        enforce("pixel count", pixels, self.max_pixels)
    }

    /// Reject a buffer allocation over the memory cap.
    pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), ImageError> {
        enforce("allocation", bytes as u64, self.max_memory_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unlimited() {
        let limits = Limits::default();
        assert!(limits.check(u32::MAX, u32::MAX, u32::MAX).is_ok());
        assert!(limits.check_memory(usize::MAX).is_ok());
    }

    #[test]
    fn pixel_cap_counts_depth() {
        let limits = Limits {
            max_pixels: Some(64),
            ..Default::default()
        };
        assert!(limits.check(4, 4, 4).is_ok());
        assert!(limits.check(u32::MAX, u32::MAX, 2).is_err());
        assert!(matches!(
            limits.check(4, 4, 5),
            Err(ImageError::LimitExceeded(_))
        ));
    }
}
