//! Fallback decoder for paths without a dedicated route.
//!
//! Sniffs magic bytes and always returns an 8-bit, 3-channel BGR matrix:
//! gray is replicated, alpha is dropped, deeper samples are scaled to 0..=255.
//!
//! Supported: BMP (uncompressed and bitfields), PNM family (P5, P6, P7, PFM),
//! farbfeld, and QOI with the `qoi` feature.

mod bmp;
mod farbfeld;
mod pnm;
#[cfg(feature = "qoi")]
mod qoi;

use alloc::vec::Vec;

use enough::Stop;
use log::debug;

use crate::error::MatError;
use crate::limits::Limits;
use crate::mat::{Mat, MatType};

/// Format detected from magic bytes.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenericFormat {
    Bmp,
    /// PGM (P5), PPM (P6), PAM (P7), PFM (Pf/PF).
    Pnm,
    Farbfeld,
    Qoi,
}

/// Identify the container from its first bytes.
pub fn detect_format(data: &[u8]) -> Option<GenericFormat> {
    match data {
        [b'B', b'M', ..] => Some(GenericFormat::Bmp),
        [b'P', b'5' | b'6' | b'7' | b'f' | b'F', ..] => Some(GenericFormat::Pnm),
        [b'q', b'o', b'i', b'f', ..] => Some(GenericFormat::Qoi),
        _ if data.starts_with(b"farbfeld") => Some(GenericFormat::Farbfeld),
        _ => None,
    }
}

/// Decode any supported container to an 8-bit BGR matrix.
pub fn decode_generic(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Mat<'static>, MatError> {
    let format = detect_format(data).ok_or(MatError::UnrecognizedFormat)?;
    let image = match format {
        GenericFormat::Bmp => bmp::decode(data, limits, stop)?,
        GenericFormat::Pnm => pnm::decode(data, limits, stop)?,
        GenericFormat::Farbfeld => farbfeld::decode(data, limits, stop)?,
        #[cfg(feature = "qoi")]
        GenericFormat::Qoi => qoi::decode(data, limits, stop)?,
        #[cfg(not(feature = "qoi"))]
        GenericFormat::Qoi => {
            return Err(MatError::UnsupportedVariant(
                "QOI decoding requires the `qoi` feature".into(),
            ));
        }
    };
    debug!(
        "generic decode: {format:?} {}x{}",
        image.width, image.height
    );
    Mat::from_vec(&[image.height, image.width], MatType::U8C3, image.bgr)
}

/// Top-down BGR8 pixels.
pub(crate) struct Bgr8 {
    pub width: usize,
    pub height: usize,
    pub bgr: Vec<u8>,
}

/// Output buffer size for a BGR8 image, checked against limits.
pub(crate) fn bgr8_len(
    width: u32,
    height: u32,
    limits: Option<&Limits>,
) -> Result<usize, MatError> {
    let bytes = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or(MatError::DimensionsTooLarge {
            width: u64::from(width),
            height: u64::from(height),
        })?;
    crate::limits::check_limits(limits, width, height, bytes)?;
    Ok(bytes)
}

/// Scale a sample in `0..=max` to `0..=255`, rounding to nearest.
#[inline]
pub(crate) fn scale_to_u8(v: u32, max: u32) -> u8 {
    if max == 255 {
        return v.min(255) as u8;
    }
    let v = u64::from(v.min(max));
    let max = u64::from(max);
    ((v * 255 + max / 2) / max) as u8
}

/// Clamp a linear float to `[0, 1]` and scale to `0..=255`.
#[inline]
pub(crate) fn float_to_u8(v: f32) -> u8 {
    // NaN maps to 0 through the saturating cast
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Push one BGR pixel from `channels` interleaved samples in RGB(A) or
/// gray(+alpha) order.
#[inline]
pub(crate) fn push_bgr(out: &mut Vec<u8>, samples: &[u8]) {
    match samples.len() {
        1 | 2 => out.extend_from_slice(&[samples[0]; 3]),
        _ => out.extend_from_slice(&[samples[2], samples[1], samples[0]]),
    }
}
