//! Raw BRDF binary volumes.
//!
//! Layout: three little-endian `i32` dimensions `d0, d1, d2`, then
//! `d0 * d1 * d2 * 3` little-endian `f64` values stored as three planar
//! blocks of `d0 * d1 * d2` values each, every block row-major over
//! `(d0, d1, d2)`. No magic, no version.
//!
//! Decoded volumes are `F32C3` matrices of shape `[d0, d1, d2]`.

use alloc::vec::Vec;

use log::debug;

use crate::error::MatError;
use crate::limits::Limits;
use crate::mat::{Mat, MatType};

const HEADER_LEN: usize = 12;

/// Parse the three dimensions, rejecting negative values.
pub(crate) fn parse_header(data: &[u8]) -> Result<[usize; 3], MatError> {
    let header = data.get(..HEADER_LEN).ok_or(MatError::UnexpectedEof)?;
    let mut dims = [0usize; 3];
    for (d, raw) in dims.iter_mut().zip(header.chunks_exact(4)) {
        let v = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        *d = usize::try_from(v)
            .map_err(|_| MatError::InvalidHeader(alloc::format!("negative dimension {v}")))?;
    }
    Ok(dims)
}

/// Decode a BRDF volume from bytes.
///
/// The payload must be exactly `d0 * d1 * d2 * 3` doubles: short input is
/// [`MatError::UnexpectedEof`], trailing bytes are [`MatError::InvalidData`].
pub fn decode_binary(data: &[u8], limits: Option<&Limits>) -> Result<Mat<'static>, MatError> {
    let dims = parse_header(data)?;
    let too_large = || MatError::DimensionsTooLarge {
        width: dims[1] as u64 * dims[2] as u64,
        height: dims[0] as u64,
    };
    let size = dims[0]
        .checked_mul(dims[1])
        .and_then(|n| n.checked_mul(dims[2]))
        .ok_or_else(too_large)?;
    let payload_len = size.checked_mul(3 * 8).ok_or_else(too_large)?;
    let out_bytes = size.checked_mul(MatType::F32C3.elem_size()).ok_or_else(too_large)?;
    if let Some(limits) = limits {
        limits.check_pixels(size as u64)?;
        limits.check_memory(out_bytes)?;
    }

    let payload = &data[HEADER_LEN..];
    if payload.len() < payload_len {
        return Err(MatError::UnexpectedEof);
    }
    if payload.len() > payload_len {
        return Err(MatError::InvalidData(alloc::format!(
            "{} trailing bytes after BRDF payload",
            payload.len() - payload_len
        )));
    }

    let value = |i: usize| {
        let o = i * 8;
        let mut b = [0u8; 8];
        b.copy_from_slice(&payload[o..o + 8]);
        f64::from_le_bytes(b) as f32
    };

    let mut out = Vec::with_capacity(out_bytes);
    for index in 0..size {
        // Stored block order is reversed against channel order: channel 0
        // comes from the last block, channel 2 from the first.
        let color = [value(index + size * 2), value(index + size), value(index)];
        for c in color {
            out.extend_from_slice(&c.to_ne_bytes());
        }
    }

    debug!("decoded BRDF volume {}x{}x{}", dims[0], dims[1], dims[2]);
    Mat::from_vec(&dims, MatType::F32C3, out)
}

/// Encode an `F32C3` volume of shape `[d0, d1, d2]` in the BRDF layout.
pub fn encode_binary(mat: &Mat<'_>) -> Result<Vec<u8>, MatError> {
    if mat.mat_type() != MatType::F32C3 {
        return Err(MatError::LayoutMismatch {
            expected: MatType::F32C3,
            actual: mat.mat_type(),
        });
    }
    let dims: [usize; 3] = mat.dims().try_into().map_err(|_| {
        MatError::UnsupportedVariant(alloc::format!(
            "BRDF volumes are 3-D, got {} dimensions",
            mat.dims().len()
        ))
    })?;
    let mut header = [0i32; 3];
    for (h, &d) in header.iter_mut().zip(&dims) {
        *h = i32::try_from(d).map_err(|_| MatError::DimensionsTooLarge {
            width: dims[1] as u64 * dims[2] as u64,
            height: dims[0] as u64,
        })?;
    }

    let colors = mat.to_vec::<[f32; 3]>()?;
    let mut out = Vec::with_capacity(HEADER_LEN + colors.len() * 24);
    for h in header {
        out.extend_from_slice(&h.to_le_bytes());
    }
    for block in (0..3).rev() {
        for color in &colors {
            out.extend_from_slice(&f64::from(color[block]).to_le_bytes());
        }
    }
    Ok(out)
}

/// Read a BRDF volume from a file.
#[cfg(feature = "std")]
pub fn read_binary(
    path: impl AsRef<std::path::Path>,
    limits: Option<&Limits>,
) -> Result<Mat<'static>, MatError> {
    let data = std::fs::read(path)?;
    decode_binary(&data, limits)
}

/// Write a BRDF volume to a file.
#[cfg(feature = "std")]
pub fn write_binary(path: impl AsRef<std::path::Path>, mat: &Mat<'_>) -> Result<(), MatError> {
    let bytes = encode_binary(mat)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
