//! Farbfeld reader.
//!
//! 8-byte magic (`farbfeld`), width and height as u32 big-endian, then
//! RGBA u16 big-endian pixels, top-down.

use alloc::vec::Vec;
use enough::Stop;

use super::{Bgr8, bgr8_len, scale_to_u8};
use crate::error::MatError;
use crate::limits::Limits;

/// Parse farbfeld header, returning (width, height).
pub(crate) fn parse_header(data: &[u8]) -> Result<(u32, u32), MatError> {
    if data.len() < 16 {
        return Err(MatError::UnexpectedEof);
    }
    if &data[0..8] != b"farbfeld" {
        return Err(MatError::UnrecognizedFormat);
    }
    let width = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
    let height = u32::from_be_bytes([data[12], data[13], data[14], data[15]]);

    if width == 0 {
        return Err(MatError::InvalidHeader("farbfeld width is zero".into()));
    }
    if height == 0 {
        return Err(MatError::InvalidHeader("farbfeld height is zero".into()));
    }
    Ok((width, height))
}

pub(crate) fn decode(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Bgr8, MatError> {
    let (width, height) = parse_header(data)?;
    let out_bytes = bgr8_len(width, height, limits)?;
    stop.check()?;

    let w = width as usize;
    let input_bytes = out_bytes
        .checked_div(3)
        .and_then(|px| px.checked_mul(8))
        .ok_or(MatError::DimensionsTooLarge {
            width: u64::from(width),
            height: u64::from(height),
        })?;
    let pixel_data = data[16..]
        .get(..input_bytes)
        .ok_or(MatError::UnexpectedEof)?;

    let mut out = Vec::with_capacity(out_bytes);
    for (row_idx, row) in pixel_data.chunks_exact(w * 8).enumerate() {
        if row_idx % 16 == 0 {
            stop.check()?;
        }
        for px in row.chunks_exact(8) {
            let sample = |c: usize| {
                scale_to_u8(u32::from(u16::from_be_bytes([px[c * 2], px[c * 2 + 1]])), 65535)
            };
            out.extend_from_slice(&[sample(2), sample(1), sample(0)]);
        }
    }

    Ok(Bgr8 {
        width: w,
        height: height as usize,
        bgr: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use enough::Unstoppable;

    fn farbfeld(width: u32, height: u32, rgba16: &[u16]) -> Vec<u8> {
        let mut out = b"farbfeld".to_vec();
        out.extend_from_slice(&width.to_be_bytes());
        out.extend_from_slice(&height.to_be_bytes());
        for v in rgba16 {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out
    }

    #[test]
    fn drops_alpha_and_reorders() {
        let data = farbfeld(1, 1, &[65535, 0, 32768, 1000]);
        let img = decode(&data, None, &Unstoppable).unwrap();
        assert_eq!(img.bgr, vec![128, 0, 255]);
    }

    #[test]
    fn zero_width_rejected() {
        let data = farbfeld(0, 1, &[]);
        assert!(matches!(
            decode(&data, None, &Unstoppable),
            Err(MatError::InvalidHeader(_))
        ));
    }

    #[test]
    fn truncated_pixels() {
        let data = farbfeld(2, 1, &[0; 7]);
        assert!(matches!(
            decode(&data, None, &Unstoppable),
            Err(MatError::UnexpectedEof)
        ));
    }
}
