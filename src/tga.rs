//! Truevision TGA decoder.
//!
//! Produces a standard [`ImageType::Bitmap`] with bottom-up scanlines in
//! BGR(A) byte order. Color-mapped images are expanded through their palette
//! to 24 or 32 bits per pixel; 15/16-bit true-color stays packed at 16 bits.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;
use log::debug;

use crate::bitmap::{Bitmap, ImageType};
use crate::cursor::Cursor;
use crate::error::MatError;
use crate::limits::{Limits, check_limits};

const HEADER_LEN: usize = 18;

/// Descriptor bit: first pixel is at the top of the picture.
const ORIGIN_TOP: u8 = 0x20;
/// Descriptor bit: pixels run right to left.
const ORIGIN_RIGHT: u8 = 0x10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TgaKind {
    ColorMapped,
    TrueColor,
    Gray,
}

#[derive(Clone, Debug)]
pub(crate) struct TgaHeader {
    kind: TgaKind,
    rle: bool,
    id_len: usize,
    has_color_map: bool,
    cmap_first: u16,
    cmap_len: u16,
    cmap_bits: u8,
    pub width: u32,
    pub height: u32,
    pixel_bits: u8,
    descriptor: u8,
}

impl TgaHeader {
    /// Bits per pixel of the decoded bitmap.
    fn output_bpp(&self) -> u32 {
        match self.kind {
            TgaKind::ColorMapped if self.cmap_bits == 32 => 32,
            TgaKind::ColorMapped => 24,
            TgaKind::TrueColor if self.pixel_bits <= 16 => 16,
            TgaKind::TrueColor => u32::from(self.pixel_bits),
            TgaKind::Gray => 8,
        }
    }

    fn input_bytes_per_pixel(&self) -> usize {
        usize::from(self.pixel_bits).div_ceil(8)
    }

    fn cmap_entry_bytes(&self) -> usize {
        usize::from(self.cmap_bits).div_ceil(8)
    }
}

pub(crate) fn parse_header(data: &[u8]) -> Result<TgaHeader, MatError> {
    if data.len() < HEADER_LEN {
        return Err(MatError::UnexpectedEof);
    }
    let mut cur = Cursor::new(data);
    let id_len = usize::from(cur.read_u8()?);
    let cmap_type = cur.read_u8()?;
    let image_type = cur.read_u8()?;
    let cmap_first = cur.read_u16_le()?;
    let cmap_len = cur.read_u16_le()?;
    let cmap_bits = cur.read_u8()?;
    let _x_origin = cur.read_u16_le()?;
    let _y_origin = cur.read_u16_le()?;
    let width = u32::from(cur.read_u16_le()?);
    let height = u32::from(cur.read_u16_le()?);
    let pixel_bits = cur.read_u8()?;
    let descriptor = cur.read_u8()?;

    let (kind, rle) = match image_type {
        1 => (TgaKind::ColorMapped, false),
        2 => (TgaKind::TrueColor, false),
        3 => (TgaKind::Gray, false),
        9 => (TgaKind::ColorMapped, true),
        10 => (TgaKind::TrueColor, true),
        11 => (TgaKind::Gray, true),
        0 => return Err(MatError::InvalidHeader("TGA contains no image data".into())),
        other => {
            return Err(MatError::UnsupportedVariant(alloc::format!(
                "TGA image type {other}"
            )));
        }
    };
    if cmap_type > 1 {
        return Err(MatError::InvalidHeader(alloc::format!(
            "TGA color map type {cmap_type}"
        )));
    }
    if width == 0 || height == 0 {
        return Err(MatError::InvalidHeader("TGA image has zero size".into()));
    }
    if cmap_type == 1 && !matches!(cmap_bits, 15 | 16 | 24 | 32) {
        return Err(MatError::UnsupportedVariant(alloc::format!(
            "TGA {cmap_bits}-bit color map entries"
        )));
    }

    let depth_ok = match kind {
        TgaKind::ColorMapped => cmap_type == 1 && pixel_bits == 8,
        TgaKind::TrueColor => matches!(pixel_bits, 15 | 16 | 24 | 32),
        TgaKind::Gray => pixel_bits == 8,
    };
    if !depth_ok {
        return Err(MatError::UnsupportedVariant(alloc::format!(
            "TGA {kind:?} with {pixel_bits}-bit pixels and {cmap_bits}-bit palette"
        )));
    }

    Ok(TgaHeader {
        kind,
        rle,
        id_len,
        has_color_map: cmap_type == 1,
        cmap_first,
        cmap_len,
        cmap_bits,
        width,
        height,
        pixel_bits,
        descriptor,
    })
}

/// Decode TGA bytes to a standard bitmap.
pub fn decode_tga(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Bitmap, MatError> {
    let header = parse_header(data)?;
    let w = header.width as usize;
    let h = header.height as usize;
    let out_px = header.output_bpp() as usize / 8;
    let out_bytes = w
        .checked_mul(h)
        .and_then(|n| n.checked_mul(out_px))
        .ok_or(MatError::DimensionsTooLarge {
            width: u64::from(header.width),
            height: u64::from(header.height),
        })?;
    check_limits(limits, header.width, header.height, out_bytes)?;
    stop.check()?;

    let mut cur = Cursor::new(data);
    cur.set_position(HEADER_LEN)?;
    cur.skip(header.id_len)?;
    let palette = match (header.has_color_map, header.kind) {
        (true, TgaKind::ColorMapped) => read_palette(&mut cur, &header)?,
        // a map on a true-color or gray image is ignored
        (true, _) => {
            cur.skip(usize::from(header.cmap_len) * header.cmap_entry_bytes())?;
            Vec::new()
        }
        (false, _) => Vec::new(),
    };
    // smallest input that could hold the claimed size; RLE packets cover at most 128 pixels
    let in_px = header.input_bytes_per_pixel();
    let min_pixel_bytes = if header.rle {
        (w * h).div_ceil(128).checked_mul(1 + in_px)
    } else {
        (w * h).checked_mul(in_px)
    };
    match min_pixel_bytes {
        Some(n) if cur.peek_bytes(n).is_some() => {}
        _ => return Err(MatError::UnexpectedEof),
    }

    let pixels = read_pixels(&mut cur, &header, &palette, w * h, out_px, stop)?;

    let mut bitmap = Bitmap::new(
        ImageType::Bitmap,
        header.output_bpp(),
        header.width,
        header.height,
    )?;
    let row_bytes = w * out_px;
    let top_origin = header.descriptor & ORIGIN_TOP != 0;
    let right_origin = header.descriptor & ORIGIN_RIGHT != 0;
    for (file_row, src) in pixels.chunks_exact(row_bytes).enumerate() {
        if file_row % 16 == 0 {
            stop.check()?;
        }
        let y = if top_origin { h - 1 - file_row } else { file_row };
        let dst = &mut bitmap.scanline_mut(y)[..row_bytes];
        if right_origin {
            for (d, s) in dst.chunks_exact_mut(out_px).zip(src.chunks_exact(out_px).rev()) {
                d.copy_from_slice(s);
            }
        } else {
            dst.copy_from_slice(src);
        }
    }

    debug!(
        "decoded TGA {}x{} {:?} rle={} as {}bpp",
        header.width,
        header.height,
        header.kind,
        header.rle,
        header.output_bpp()
    );
    Ok(bitmap)
}

/// Palette entries as BGRA.
fn read_palette(cur: &mut Cursor<'_>, header: &TgaHeader) -> Result<Vec<[u8; 4]>, MatError> {
    let entry_bytes = header.cmap_entry_bytes();
    let mut palette = Vec::with_capacity(usize::from(header.cmap_len));
    for _ in 0..header.cmap_len {
        let raw = cur.read_bytes(entry_bytes)?;
        palette.push(color_entry(raw, header.cmap_bits)?);
    }
    Ok(palette)
}

/// One stored color as BGRA. 15/16-bit entries are A1R5G5B5 little-endian.
fn color_entry(raw: &[u8], bits: u8) -> Result<[u8; 4], MatError> {
    match (bits, raw) {
        (15 | 16, &[lo, hi]) => {
            let v = u16::from_le_bytes([lo, hi]);
            let expand = |x: u16| ((x << 3) | (x >> 2)) as u8;
            Ok([
                expand(v & 0x1f),
                expand((v >> 5) & 0x1f),
                expand((v >> 10) & 0x1f),
                0xff,
            ])
        }
        (24, &[b, g, r]) => Ok([b, g, r, 0xff]),
        (32, &[b, g, r, a]) => Ok([b, g, r, a]),
        _ => Err(MatError::UnsupportedVariant(alloc::format!(
            "TGA {bits}-bit color map entries"
        ))),
    }
}

/// Decode all pixels in file order into `count * out_px` bytes.
fn read_pixels(
    cur: &mut Cursor<'_>,
    header: &TgaHeader,
    palette: &[[u8; 4]],
    count: usize,
    out_px: usize,
    stop: &dyn Stop,
) -> Result<Vec<u8>, MatError> {
    let in_px = header.input_bytes_per_pixel();
    let mut out = vec![0u8; count * out_px];
    let mut px = [0u8; 4];
    let mut i = 0;
    let check_every = (header.width as usize).saturating_mul(16).max(1);
    let mut next_check = check_every;

    while i < count {
        if i >= next_check {
            stop.check()?;
            next_check = i + check_every;
        }
        let (run, repeat) = if header.rle {
            let packet = cur.read_u8()?;
            (usize::from(packet & 0x7f) + 1, packet & 0x80 != 0)
        } else {
            (count - i, false)
        };
        if i + run > count {
            return Err(MatError::InvalidData("TGA run overflows image".into()));
        }
        if repeat {
            convert_pixel(cur.read_bytes(in_px)?, header, palette, &mut px[..out_px])?;
            for dst in out[i * out_px..(i + run) * out_px].chunks_exact_mut(out_px) {
                dst.copy_from_slice(&px[..out_px]);
            }
        } else {
            let raw = cur.read_bytes(run * in_px)?;
            let dst = &mut out[i * out_px..(i + run) * out_px];
            for (s, d) in raw.chunks_exact(in_px).zip(dst.chunks_exact_mut(out_px)) {
                convert_pixel(s, header, palette, d)?;
            }
        }
        i += run;
    }
    Ok(out)
}

fn convert_pixel(
    raw: &[u8],
    header: &TgaHeader,
    palette: &[[u8; 4]],
    out: &mut [u8],
) -> Result<(), MatError> {
    match header.kind {
        TgaKind::ColorMapped => {
            let entry = usize::from(raw[0])
                .checked_sub(usize::from(header.cmap_first))
                .and_then(|i| palette.get(i))
                .ok_or_else(|| {
                    MatError::InvalidData(alloc::format!("TGA palette index {} out of range", raw[0]))
                })?;
            out.copy_from_slice(&entry[..out.len()]);
        }
        TgaKind::TrueColor | TgaKind::Gray => out.copy_from_slice(&raw[..out.len()]),
    }
    Ok(())
}

/// Minimal uncompressed true-color encoder, used to build fixtures.
#[cfg(test)]
pub(crate) fn encode_truecolor(
    width: u16,
    height: u16,
    bits: u8,
    descriptor: u8,
    pixels: &[u8],
) -> Vec<u8> {
    let mut out = vec![0u8, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.push(bits);
    out.push(descriptor);
    out.extend_from_slice(pixels);
    out
}
