//! FreeImage-style decoded bitmaps.
//!
//! A bitmap stores scanlines bottom-up (scanline 0 is the bottom row of the
//! picture) with a DWORD-aligned pitch. [`SourceBitmap`] is the query surface
//! the format bridge consumes; [`Bitmap`] is the owned implementation the
//! HDR and TGA decoders produce.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::MatError;

/// Pixel type tag of a bitmap.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageType {
    /// Unknown or unsupported type.
    Unknown,
    /// Standard image: 1, 4, 8, 16, 24 or 32 bits per pixel.
    Bitmap,
    /// Unsigned 16-bit samples.
    Uint16,
    /// Signed 16-bit samples.
    Int16,
    /// Unsigned 32-bit samples.
    Uint32,
    /// Signed 32-bit samples.
    Int32,
    /// 32-bit IEEE float samples.
    Float,
    /// 64-bit IEEE float samples.
    Double,
    /// Complex samples: 2 x 64-bit IEEE float.
    Complex,
    /// 48-bit RGB: 3 x 16-bit.
    Rgb16,
    /// 64-bit RGBA: 4 x 16-bit.
    Rgba16,
    /// 96-bit RGB float: 3 x 32-bit IEEE float.
    RgbF,
    /// 128-bit RGBA float: 4 x 32-bit IEEE float.
    RgbaF,
}

impl ImageType {
    /// Bits per pixel implied by the type, `None` for `Bitmap` (variable)
    /// and `Unknown`.
    pub fn fixed_bpp(self) -> Option<u32> {
        match self {
            Self::Uint16 | Self::Int16 => Some(16),
            Self::Uint32 | Self::Int32 | Self::Float => Some(32),
            Self::Double => Some(64),
            Self::Complex => Some(128),
            Self::Rgb16 => Some(48),
            Self::Rgba16 => Some(64),
            Self::RgbF => Some(96),
            Self::RgbaF => Some(128),
            Self::Bitmap | Self::Unknown => None,
        }
    }
}

/// Read-only query surface of a decoded bitmap.
pub trait SourceBitmap {
    fn bpp(&self) -> u32;
    fn image_type(&self) -> ImageType;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Bytes between the starts of consecutive scanlines.
    fn pitch(&self) -> usize;
    /// Raw scanline bytes, bottom-up, `height * pitch` long.
    fn bits(&self) -> &[u8];

    /// An 8-bit-per-pixel copy of a standard bitmap. Sub-byte depths are
    /// unpacked to one palette index per byte. `None` when the bitmap has
    /// no 8-bit form.
    fn to_8bits(&self) -> Option<Bitmap> {
        if self.image_type() != ImageType::Bitmap {
            return None;
        }
        let depth = self.bpp();
        if !matches!(depth, 1 | 2 | 4 | 8) {
            return None;
        }
        let mut out = Bitmap::new(ImageType::Bitmap, 8, self.width(), self.height()).ok()?;
        let width = self.width() as usize;
        let src_row_bytes = (width * depth as usize).div_ceil(8);
        for y in 0..self.height() as usize {
            let start = y * self.pitch();
            let src = self.bits().get(start..start + src_row_bytes)?;
            let dst = &mut out.scanline_mut(y)[..width];
            unpack_indices(depth, src, dst);
        }
        Some(out)
    }
}

/// Owned bitmap with bottom-up scanlines.
#[derive(Clone, Debug)]
pub struct Bitmap {
    image_type: ImageType,
    bpp: u32,
    width: u32,
    height: u32,
    pitch: usize,
    bits: Vec<u8>,
}

/// DWORD-aligned scanline size for `width` pixels of `bpp` bits.
pub fn default_pitch(width: u32, bpp: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(bpp as usize)?
        .checked_add(31)
        .map(|bits| bits / 32 * 4)
}

impl Bitmap {
    /// Zero-filled bitmap with the default DWORD-aligned pitch.
    pub fn new(image_type: ImageType, bpp: u32, width: u32, height: u32) -> Result<Self, MatError> {
        check_type_bpp(image_type, bpp)?;
        let too_large = MatError::DimensionsTooLarge {
            width: u64::from(width),
            height: u64::from(height),
        };
        let pitch = default_pitch(width, bpp).ok_or(too_large)?;
        let len = pitch
            .checked_mul(height as usize)
            .ok_or(MatError::DimensionsTooLarge {
                width: u64::from(width),
                height: u64::from(height),
            })?;
        Ok(Self {
            image_type,
            bpp,
            width,
            height,
            pitch,
            bits: vec![0u8; len],
        })
    }

    /// Wrap existing bottom-up scanline data.
    ///
    /// `pitch` must cover one row of `width` pixels and `bits` must hold
    /// `height * pitch` bytes.
    pub fn from_raw(
        image_type: ImageType,
        bpp: u32,
        width: u32,
        height: u32,
        pitch: usize,
        bits: Vec<u8>,
    ) -> Result<Self, MatError> {
        check_type_bpp(image_type, bpp)?;
        let row_bytes = (width as usize * bpp as usize).div_ceil(8);
        if pitch < row_bytes {
            return Err(MatError::InvalidData(alloc::format!(
                "pitch {pitch} is smaller than row size {row_bytes}"
            )));
        }
        let needed = pitch
            .checked_mul(height as usize)
            .ok_or(MatError::DimensionsTooLarge {
                width: u64::from(width),
                height: u64::from(height),
            })?;
        if bits.len() < needed {
            return Err(MatError::BufferTooSmall {
                needed,
                actual: bits.len(),
            });
        }
        Ok(Self {
            image_type,
            bpp,
            width,
            height,
            pitch,
            bits,
        })
    }

    /// Scanline `y`, counted from the bottom of the picture.
    pub fn scanline(&self, y: usize) -> &[u8] {
        &self.bits[y * self.pitch..(y + 1) * self.pitch]
    }

    pub fn scanline_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.bits[y * self.pitch..(y + 1) * self.pitch]
    }

    pub fn bits_mut(&mut self) -> &mut [u8] {
        &mut self.bits
    }

    pub fn into_bits(self) -> Vec<u8> {
        self.bits
    }
}

impl SourceBitmap for Bitmap {
    fn bpp(&self) -> u32 {
        self.bpp
    }

    fn image_type(&self) -> ImageType {
        self.image_type
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pitch(&self) -> usize {
        self.pitch
    }

    fn bits(&self) -> &[u8] {
        &self.bits
    }
}

fn check_type_bpp(image_type: ImageType, bpp: u32) -> Result<(), MatError> {
    let ok = match image_type {
        ImageType::Bitmap => matches!(bpp, 1 | 2 | 4 | 8 | 16 | 24 | 32),
        ImageType::Unknown => bpp > 0,
        other => other.fixed_bpp() == Some(bpp),
    };
    if ok {
        Ok(())
    } else {
        Err(MatError::UnsupportedVariant(alloc::format!(
            "{bpp} bits per pixel for {image_type:?}"
        )))
    }
}

/// Unpack MSB-first 1/2/4-bit indices into one byte each; 8-bit is copied.
///
/// `out.len()` is the pixel count; trailing bits of the last input byte are
/// ignored.
pub(crate) fn unpack_indices(depth: u32, input: &[u8], out: &mut [u8]) {
    match depth {
        1 | 2 | 4 => {
            let per_byte = 8 / depth as usize;
            let mask = (1u8 << depth) - 1;
            for (chunk, &byte) in out.chunks_mut(per_byte).zip(input) {
                for (pos, px) in chunk.iter_mut().enumerate() {
                    let shift = 8 - depth as usize * (pos + 1);
                    *px = (byte >> shift) & mask;
                }
            }
        }
        8 => {
            let n = out.len().min(input.len());
            out[..n].copy_from_slice(&input[..n]);
        }
        _ => {}
    }
}
