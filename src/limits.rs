use crate::error::MatError;

/// Resource limits for decode operations.
///
/// All fields default to `None` (no limit).
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum element count (width * height, or the product of all dims
    /// for volumetric data).
    pub max_pixels: Option<u64>,
    /// Maximum memory bytes for output buffer allocation.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Check image dimensions against limits.
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), MatError> {
        if let Some(max_w) = self.max_width {
            if u64::from(width) > max_w {
                return Err(MatError::LimitExceeded(alloc::format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if u64::from(height) > max_h {
                return Err(MatError::LimitExceeded(alloc::format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }
        self.check_pixels(u64::from(width) * u64::from(height))
    }

    /// Check a raw element count against `max_pixels`.
    pub(crate) fn check_pixels(&self, pixels: u64) -> Result<(), MatError> {
        if let Some(max_px) = self.max_pixels {
            if pixels > max_px {
                return Err(MatError::LimitExceeded(alloc::format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Check that an allocation size is within memory limits.
    pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), MatError> {
        if let Some(max_mem) = self.max_memory_bytes {
            if bytes as u64 > max_mem {
                return Err(MatError::LimitExceeded(alloc::format!(
                    "allocation {bytes} bytes exceeds memory limit {max_mem}"
                )));
            }
        }
        Ok(())
    }
}

/// Run `check` and `check_memory` when limits are present.
pub(crate) fn check_limits(
    limits: Option<&Limits>,
    width: u32,
    height: u32,
    out_bytes: usize,
) -> Result<(), MatError> {
    if let Some(limits) = limits {
        limits.check(width, height)?;
        limits.check_memory(out_bytes)?;
    }
    Ok(())
}
