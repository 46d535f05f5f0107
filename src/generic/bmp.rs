//! Uncompressed BMP reader.
//!
//! Handles OS/2 (12-byte) and Windows (40-byte and later) info headers,
//! indexed 1/2/4/8-bit, 16-bit and 32-bit bitfields, and 24-bit BGR.
//! RLE-compressed files are rejected.

use alloc::vec;
use alloc::vec::Vec;
use enough::Stop;

use super::{Bgr8, bgr8_len, scale_to_u8};
use crate::bitmap::unpack_indices;
use crate::cursor::Cursor;
use crate::error::MatError;
use crate::limits::Limits;

const FILE_HEADER_LEN: usize = 14;

/// 5-5-5 masks used by 16-bit files without explicit bitfields.
const DEFAULT_MASKS_16: [u32; 3] = [0x7c00, 0x03e0, 0x001f];

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BmpHeader {
    pub width: u32,
    pub height: u32,
    pub top_down: bool,
    pub bpp: u16,
    /// Red, green, blue masks for 16/32-bit data.
    pub masks: Option<[u32; 3]>,
    /// BGR palette entries.
    pub palette: Vec<[u8; 3]>,
    pub data_offset: usize,
}

pub(crate) fn parse_header(data: &[u8]) -> Result<BmpHeader, MatError> {
    let mut cur = Cursor::new(data);
    if cur.read_fixed::<2>()? != *b"BM" {
        return Err(MatError::UnrecognizedFormat);
    }
    let _file_size = cur.read_u32_le()?;
    cur.skip(4)?;
    let data_offset = cur.read_u32_le()? as usize;
    let ihsize = cur.read_u32_le()?;

    let (width, height, planes, bpp, compression, colors_used);
    match ihsize {
        12 => {
            width = i32::from(cur.read_u16_le()?);
            height = i32::from(cur.read_u16_le()?);
            planes = cur.read_u16_le()?;
            bpp = cur.read_u16_le()?;
            compression = 0;
            colors_used = 0;
        }
        40 | 52 | 56 | 64 | 108 | 124 => {
            width = cur.read_i32_le()?;
            height = cur.read_i32_le()?;
            planes = cur.read_u16_le()?;
            bpp = cur.read_u16_le()?;
            compression = cur.read_u32_le()?;
            // image size, x and y resolution
            cur.skip(12)?;
            colors_used = cur.read_u32_le()?;
            let _important = cur.read_u32_le()?;
        }
        _ => {
            return Err(MatError::InvalidHeader(alloc::format!(
                "unknown BMP info header size: {ihsize}"
            )));
        }
    }

    if planes != 1 {
        return Err(MatError::InvalidHeader(alloc::format!(
            "BMP planes field is {planes}, expected 1"
        )));
    }
    if width <= 0 {
        return Err(MatError::InvalidHeader(alloc::format!("BMP width {width}")));
    }
    if height == 0 {
        return Err(MatError::InvalidHeader("BMP height is zero".into()));
    }

    let bitfields = match compression {
        0 => false,
        3 | 6 => true,
        1 | 2 => {
            return Err(MatError::UnsupportedVariant(
                "RLE-compressed BMP".into(),
            ));
        }
        other => {
            return Err(MatError::UnsupportedVariant(alloc::format!(
                "BMP compression {other}"
            )));
        }
    };
    if !matches!(bpp, 1 | 2 | 4 | 8 | 16 | 24 | 32) {
        return Err(MatError::UnsupportedVariant(alloc::format!("{bpp}-bit BMP")));
    }

    // Masks live inside V2+ headers, or directly after a 40-byte header.
    let mut palette_start = FILE_HEADER_LEN + ihsize as usize;
    let masks = if bitfields && (bpp == 16 || bpp == 32) {
        cur.set_position(if ihsize >= 52 { FILE_HEADER_LEN + 40 } else { palette_start })?;
        let m = [cur.read_u32_le()?, cur.read_u32_le()?, cur.read_u32_le()?];
        if ihsize < 52 {
            palette_start += 12;
        }
        Some(m)
    } else if bpp == 16 {
        Some(DEFAULT_MASKS_16)
    } else {
        None
    };

    let mut palette = Vec::new();
    if bpp <= 8 {
        let entry_len = if ihsize == 12 { 3 } else { 4 };
        let declared = match colors_used {
            0 => 1usize << bpp,
            n => (n as usize).min(256),
        };
        let room = data_offset.saturating_sub(palette_start) / entry_len;
        cur.set_position(palette_start)?;
        for _ in 0..declared.min(room) {
            let e = cur.read_bytes(entry_len)?;
            palette.push([e[0], e[1], e[2]]);
        }
    }

    Ok(BmpHeader {
        width: width as u32,
        height: height.unsigned_abs(),
        top_down: height < 0,
        bpp,
        masks,
        palette,
        data_offset,
    })
}

/// Extract one masked channel and scale it to 8 bits.
#[inline]
fn masked(v: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let bits = mask.count_ones();
    let max = u32::MAX >> (32 - bits);
    scale_to_u8((v & mask) >> mask.trailing_zeros(), max)
}

pub(crate) fn decode(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Bgr8, MatError> {
    let header = parse_header(data)?;
    let out_bytes = bgr8_len(header.width, header.height, limits)?;
    stop.check()?;

    let w = header.width as usize;
    let h = header.height as usize;
    let bpp = usize::from(header.bpp);
    let too_large = || MatError::DimensionsTooLarge {
        width: u64::from(header.width),
        height: u64::from(header.height),
    };
    let stride = w
        .checked_mul(bpp)
        .and_then(|b| b.checked_add(31))
        .map(|b| b / 32 * 4)
        .ok_or_else(too_large)?;
    let pixel_len = stride.checked_mul(h).ok_or_else(too_large)?;
    let pixels = data
        .get(header.data_offset..)
        .and_then(|d| d.get(..pixel_len))
        .ok_or(MatError::UnexpectedEof)?;

    let mut out = Vec::with_capacity(out_bytes);
    let mut indices = if bpp <= 8 { vec![0u8; w] } else { Vec::new() };
    for r in 0..h {
        if r % 16 == 0 {
            stop.check()?;
        }
        let src_row = if header.top_down { r } else { h - 1 - r };
        let row = &pixels[src_row * stride..(src_row + 1) * stride];
        match (bpp, header.masks) {
            (1 | 2 | 4 | 8, _) => {
                unpack_indices(u32::from(header.bpp), row, &mut indices);
                for &i in &indices {
                    let entry = header.palette.get(usize::from(i)).ok_or_else(|| {
                        MatError::InvalidData(alloc::format!(
                            "palette index {i} out of range ({} entries)",
                            header.palette.len()
                        ))
                    })?;
                    out.extend_from_slice(entry);
                }
            }
            (16, Some([mr, mg, mb])) => {
                for px in row[..w * 2].chunks_exact(2) {
                    let v = u32::from(u16::from_le_bytes([px[0], px[1]]));
                    out.extend_from_slice(&[masked(v, mb), masked(v, mg), masked(v, mr)]);
                }
            }
            (24, _) | (32, None) => {
                let n = bpp / 8;
                for px in row[..w * n].chunks_exact(n) {
                    out.extend_from_slice(&px[..3]);
                }
            }
            (32, Some([mr, mg, mb])) => {
                for px in row[..w * 4].chunks_exact(4) {
                    let v = u32::from_le_bytes([px[0], px[1], px[2], px[3]]);
                    out.extend_from_slice(&[masked(v, mb), masked(v, mg), masked(v, mr)]);
                }
            }
            _ => {
                return Err(MatError::UnsupportedVariant(alloc::format!(
                    "{bpp}-bit BMP"
                )));
            }
        }
    }

    Ok(Bgr8 {
        width: w,
        height: h,
        bgr: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use enough::Unstoppable;

    /// Minimal BITMAPINFOHEADER file. `rows` are already padded and in
    /// storage order.
    fn bmp(
        width: i32,
        height: i32,
        bpp: u16,
        compression: u32,
        extra: &[u8],
        rows: &[u8],
    ) -> Vec<u8> {
        let offset = (14 + 40 + extra.len()) as u32;
        let mut out = b"BM".to_vec();
        out.extend_from_slice(&(offset + rows.len() as u32).to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&bpp.to_le_bytes());
        out.extend_from_slice(&compression.to_le_bytes());
        out.extend_from_slice(&[0; 20]);
        out.extend_from_slice(extra);
        out.extend_from_slice(rows);
        out
    }

    #[test]
    fn bottom_up_24bit_with_padding() {
        // 1x2, stride 4: bottom row first
        let data = bmp(1, 2, 24, 0, &[], &[1, 2, 3, 0, 4, 5, 6, 0]);
        let img = decode(&data, None, &Unstoppable).unwrap();
        assert_eq!((img.width, img.height), (1, 2));
        assert_eq!(img.bgr, vec![4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn top_down_negative_height() {
        let data = bmp(1, -2, 24, 0, &[], &[1, 2, 3, 0, 4, 5, 6, 0]);
        let img = decode(&data, None, &Unstoppable).unwrap();
        assert_eq!(img.bgr, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn four_bit_palette() {
        let mut palette = Vec::new();
        for i in 0..16u8 {
            palette.extend_from_slice(&[i, i * 2, i * 3, 0]);
        }
        // 3 pixels: indices 1, 15, 2
        let data = bmp(3, 1, 4, 0, &palette, &[0x1f, 0x20, 0, 0]);
        let img = decode(&data, None, &Unstoppable).unwrap();
        assert_eq!(img.bgr, vec![1, 2, 3, 15, 30, 45, 2, 4, 6]);
    }

    #[test]
    fn palette_index_out_of_range() {
        // colors_used is zero, but only two entries fit before the pixels
        let palette = [0u8, 0, 0, 0, 255, 255, 255, 0];
        let data = bmp(1, 1, 8, 0, &palette, &[7, 0, 0, 0]);
        assert!(matches!(
            decode(&data, None, &Unstoppable),
            Err(MatError::InvalidData(_))
        ));
    }

    #[test]
    fn sixteen_bit_defaults_to_555() {
        let px: u16 = (31 << 10) | (16 << 5);
        let mut row = px.to_le_bytes().to_vec();
        row.extend_from_slice(&[0, 0]);
        let data = bmp(1, 1, 16, 0, &[], &row);
        let img = decode(&data, None, &Unstoppable).unwrap();
        assert_eq!(img.bgr, vec![0, 132, 255]);
    }

    #[test]
    fn thirty_two_bit_bitfields() {
        let mut masks = Vec::new();
        for m in [0x0000_00ffu32, 0x0000_ff00, 0x00ff_0000] {
            masks.extend_from_slice(&m.to_le_bytes());
        }
        let data = bmp(1, 1, 32, 3, &masks, &[10, 20, 30, 40]);
        let img = decode(&data, None, &Unstoppable).unwrap();
        // red is the low byte here
        assert_eq!(img.bgr, vec![30, 20, 10]);
    }

    #[test]
    fn rle_is_unsupported() {
        let data = bmp(1, 1, 8, 1, &[0; 8], &[0, 1, 0, 0]);
        assert!(matches!(
            decode(&data, None, &Unstoppable),
            Err(MatError::UnsupportedVariant(_))
        ));
    }

    #[test]
    fn truncated_pixels() {
        let data = bmp(2, 2, 24, 0, &[], &[0; 10]);
        assert!(matches!(
            decode(&data, None, &Unstoppable),
            Err(MatError::UnexpectedEof)
        ));
    }
}
