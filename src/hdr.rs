//! Radiance HDR (RGBE) decoder.
//!
//! Produces an [`ImageType::RgbF`] bitmap with bottom-up scanlines, ready
//! for [`crate::bitmap_to_mat`]. Handles new-style run-length scanlines,
//! old-style repeat runs and flat scanlines. XYZE data is rejected.

use alloc::vec;

use enough::Stop;
use log::debug;

use crate::bitmap::{Bitmap, ImageType};
use crate::cursor::Cursor;
use crate::error::MatError;
use crate::limits::{Limits, check_limits};

/// Widths outside this range cannot use new-style run-length encoding.
const MIN_RLE_WIDTH: usize = 8;
const MAX_RLE_WIDTH: usize = 0x7fff;

/// Parsed header: dimensions and scanline order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HdrHeader {
    pub width: u32,
    pub height: u32,
    /// First scanline in the file is the top row (`-Y`).
    pub top_down: bool,
    pub data_offset: usize,
}

pub(crate) fn parse_header(data: &[u8]) -> Result<HdrHeader, MatError> {
    let mut cur = Cursor::new(data);
    let magic = cur.read_line()?;
    if !(magic.starts_with(b"#?RADIANCE") || magic.starts_with(b"#?RGBE")) {
        return Err(MatError::UnrecognizedFormat);
    }

    loop {
        let line = cur.read_line()?;
        if line.is_empty() {
            break;
        }
        if let Some(format) = line.strip_prefix(b"FORMAT=") {
            match format {
                b"32-bit_rle_rgbe" => {}
                b"32-bit_rle_xyze" => {
                    return Err(MatError::UnsupportedVariant("XYZE radiance data".into()));
                }
                other => {
                    return Err(MatError::InvalidHeader(alloc::format!(
                        "unknown radiance FORMAT {}",
                        alloc::string::String::from_utf8_lossy(other)
                    )));
                }
            }
        }
    }

    let res = cur.read_line()?;
    let text = core::str::from_utf8(res)
        .map_err(|_| MatError::InvalidHeader("resolution line is not ASCII".into()))?;
    let mut tokens = text.split_ascii_whitespace();
    let (y_axis, h, x_axis, w) = match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        _ => {
            return Err(MatError::InvalidHeader(alloc::format!(
                "bad resolution line {text:?}"
            )));
        }
    };
    let top_down = match (y_axis, x_axis) {
        ("-Y", "+X") => true,
        ("+Y", "+X") => false,
        _ => {
            return Err(MatError::UnsupportedVariant(alloc::format!(
                "scanline orientation {y_axis} {x_axis}"
            )));
        }
    };
    let parse = |s: &str| {
        s.parse::<u32>()
            .map_err(|_| MatError::InvalidHeader(alloc::format!("bad dimension {s:?}")))
    };
    let height = parse(h)?;
    let width = parse(w)?;
    if width == 0 || height == 0 {
        return Err(MatError::InvalidHeader("radiance image has zero size".into()));
    }

    Ok(HdrHeader {
        width,
        height,
        top_down,
        data_offset: cur.position(),
    })
}

/// Decode Radiance HDR bytes to an RGB float bitmap.
pub fn decode_hdr(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Bitmap, MatError> {
    let header = parse_header(data)?;
    let w = header.width as usize;
    let h = header.height as usize;
    let out_bytes = w
        .checked_mul(h)
        .and_then(|n| n.checked_mul(12))
        .ok_or(MatError::DimensionsTooLarge {
            width: u64::from(header.width),
            height: u64::from(header.height),
        })?;
    check_limits(limits, header.width, header.height, out_bytes)?;
    stop.check()?;

    let mut cur = Cursor::new(data);
    cur.set_position(header.data_offset)?;
    // every scanline takes at least one RGBE quad
    match h.checked_mul(4) {
        Some(n) if cur.peek_bytes(n).is_some() => {}
        _ => return Err(MatError::UnexpectedEof),
    }
    let mut bitmap = Bitmap::new(ImageType::RgbF, 96, header.width, header.height)?;
    let mut rgbe = vec![0u8; w * 4];

    for s in 0..h {
        if s % 16 == 0 {
            stop.check()?;
        }
        read_scanline(&mut cur, w, &mut rgbe)?;
        let y = if header.top_down { h - 1 - s } else { s };
        let line = bitmap.scanline_mut(y);
        for (px, out) in rgbe.chunks_exact(4).zip(line.chunks_exact_mut(12)) {
            let e = px[3];
            for c in 0..3 {
                out[c * 4..c * 4 + 4].copy_from_slice(&rgbe_to_f32(px[c], e).to_ne_bytes());
            }
        }
    }

    debug!("decoded radiance {}x{}", header.width, header.height);
    Ok(bitmap)
}

/// Shared-exponent mantissa to float: `m * 2^(e - 136)`, zero when `e == 0`.
pub(crate) fn rgbe_to_f32(m: u8, e: u8) -> f32 {
    if e == 0 {
        return 0.0;
    }
    // e - 136 lies in [-135, 119]: always a normal f64
    let exp = i64::from(e) - 136;
    let scale = f64::from_bits(((exp + 1023) as u64) << 52);
    (f64::from(m) * scale) as f32
}

fn read_scanline(cur: &mut Cursor<'_>, width: usize, out: &mut [u8]) -> Result<(), MatError> {
    if !(MIN_RLE_WIDTH..=MAX_RLE_WIDTH).contains(&width) {
        return read_old_style(cur, out);
    }
    match cur.peek_bytes(4) {
        Some(&[2, 2, hi, lo]) if hi & 0x80 == 0 => {
            let encoded_width = (usize::from(hi) << 8) | usize::from(lo);
            if encoded_width != width {
                return Err(MatError::InvalidData(alloc::format!(
                    "scanline width {encoded_width} does not match image width {width}"
                )));
            }
            cur.skip(4)?;
            read_new_style(cur, width, out)
        }
        _ => read_old_style(cur, out),
    }
}

/// Four planar run-length channels.
fn read_new_style(cur: &mut Cursor<'_>, width: usize, out: &mut [u8]) -> Result<(), MatError> {
    for ch in 0..4 {
        let mut x = 0;
        while x < width {
            let count = usize::from(cur.read_u8()?);
            if count > 128 {
                let run = count - 128;
                if x + run > width {
                    return Err(MatError::InvalidData("radiance run overflows scanline".into()));
                }
                let value = cur.read_u8()?;
                for i in x..x + run {
                    out[i * 4 + ch] = value;
                }
                x += run;
            } else {
                if count == 0 || x + count > width {
                    return Err(MatError::InvalidData("bad radiance literal run".into()));
                }
                let bytes = cur.read_bytes(count)?;
                for (i, &b) in bytes.iter().enumerate() {
                    out[(x + i) * 4 + ch] = b;
                }
                x += count;
            }
        }
    }
    Ok(())
}

/// Flat RGBE pixels with `1,1,1,n` repeat markers.
fn read_old_style(cur: &mut Cursor<'_>, out: &mut [u8]) -> Result<(), MatError> {
    let pixels = out.len() / 4;
    let mut x = 0;
    let mut shift = 0u32;
    while x < pixels {
        let px: [u8; 4] = cur.read_fixed()?;
        if px[0] == 1 && px[1] == 1 && px[2] == 1 {
            if x == 0 {
                return Err(MatError::InvalidData(
                    "radiance repeat marker before first pixel".into(),
                ));
            }
            let repeat = usize::from(px[3])
                .checked_shl(shift)
                .ok_or_else(|| MatError::InvalidData("radiance repeat count overflow".into()))?;
            if x.saturating_add(repeat) > pixels {
                return Err(MatError::InvalidData("radiance repeat overflows scanline".into()));
            }
            let mut prev = [0u8; 4];
            prev.copy_from_slice(&out[(x - 1) * 4..x * 4]);
            for i in x..x + repeat {
                out[i * 4..i * 4 + 4].copy_from_slice(&prev);
            }
            x += repeat;
            shift += 8;
        } else {
            out[x * 4..x * 4 + 4].copy_from_slice(&px);
            x += 1;
            shift = 0;
        }
    }
    Ok(())
}

/// Minimal flat-scanline encoder, used to build fixtures.
#[cfg(test)]
pub(crate) fn encode_flat(width: u32, height: u32, rgbe_top_down: &[[u8; 4]]) -> alloc::vec::Vec<u8> {
    let mut out = alloc::vec::Vec::new();
    out.extend_from_slice(b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n");
    out.extend_from_slice(alloc::format!("-Y {height} +X {width}\n").as_bytes());
    for px in rgbe_top_down {
        out.extend_from_slice(px);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::SourceBitmap;
    use enough::Unstoppable;

    fn pixel(bitmap: &Bitmap, x: usize, y_storage: usize) -> [f32; 3] {
        let line = bitmap.scanline(y_storage);
        let mut out = [0.0; 3];
        for (c, v) in out.iter_mut().enumerate() {
            let o = x * 12 + c * 4;
            *v = f32::from_ne_bytes([line[o], line[o + 1], line[o + 2], line[o + 3]]);
        }
        out
    }

    #[test]
    fn rgbe_conversion() {
        assert_eq!(rgbe_to_f32(128, 129), 1.0);
        assert_eq!(rgbe_to_f32(64, 130), 1.0);
        assert_eq!(rgbe_to_f32(200, 0), 0.0);
    }

    #[test]
    fn flat_top_down_is_stored_bottom_up() {
        let data = encode_flat(
            2,
            2,
            &[[128, 0, 0, 129], [0, 128, 0, 129], [0, 0, 128, 129], [64, 64, 64, 129]],
        );
        let bmp = decode_hdr(&data, None, &Unstoppable).unwrap();
        assert_eq!(bmp.image_type(), ImageType::RgbF);
        assert_eq!(bmp.bpp(), 96);
        // file row 0 (top) lands on storage row 1
        assert_eq!(pixel(&bmp, 0, 1), [1.0, 0.0, 0.0]);
        assert_eq!(pixel(&bmp, 1, 1), [0.0, 1.0, 0.0]);
        assert_eq!(pixel(&bmp, 0, 0), [0.0, 0.0, 1.0]);
        assert_eq!(pixel(&bmp, 1, 0), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn new_style_rle_scanline() {
        let mut data = b"#?RGBE\n\n-Y 1 +X 8\n".to_vec();
        data.extend_from_slice(&[2, 2, 0, 8]);
        // R: run of 8 x 128
        data.extend_from_slice(&[136, 128]);
        // G: literal 8 values
        data.push(8);
        data.extend_from_slice(&[0, 16, 32, 48, 64, 80, 96, 112]);
        // B: run of 8 zeros
        data.extend_from_slice(&[136, 0]);
        // E: run of 8 x 129
        data.extend_from_slice(&[136, 129]);
        let bmp = decode_hdr(&data, None, &Unstoppable).unwrap();
        assert_eq!(pixel(&bmp, 0, 0), [1.0, 0.0, 0.0]);
        assert_eq!(pixel(&bmp, 7, 0), [1.0, 112.0 / 128.0, 0.0]);
    }

    #[test]
    fn old_style_repeat() {
        let mut data = b"#?RADIANCE\n\n+Y 1 +X 4\n".to_vec();
        data.extend_from_slice(&[128, 128, 128, 129, 1, 1, 1, 3]);
        let bmp = decode_hdr(&data, None, &Unstoppable).unwrap();
        for x in 0..4 {
            assert_eq!(pixel(&bmp, x, 0), [1.0, 1.0, 1.0]);
        }
    }

    #[test]
    fn xyze_rejected() {
        let data = b"#?RADIANCE\nFORMAT=32-bit_rle_xyze\n\n-Y 1 +X 1\n\0\0\0\0";
        assert!(matches!(
            decode_hdr(data, None, &Unstoppable),
            Err(MatError::UnsupportedVariant(_))
        ));
    }

    #[test]
    fn truncated_scanline() {
        let mut data = encode_flat(2, 2, &[[1, 2, 3, 4]; 4]);
        data.truncate(data.len() - 3);
        assert!(matches!(
            decode_hdr(&data, None, &Unstoppable),
            Err(MatError::UnexpectedEof)
        ));
    }

    #[test]
    fn limits_checked_before_decode() {
        let data = encode_flat(2, 2, &[[1, 2, 3, 4]; 4]);
        let limits = Limits {
            max_width: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            decode_hdr(&data, Some(&limits), &Unstoppable),
            Err(MatError::LimitExceeded(_))
        ));
    }

    #[test]
    fn tall_header_without_pixels_fails_before_allocating() {
        let data = encode_flat(60_000, 60_000, &[[1, 2, 3, 4]]);
        assert!(matches!(
            decode_hdr(&data, None, &Unstoppable),
            Err(MatError::UnexpectedEof)
        ));
    }
}
