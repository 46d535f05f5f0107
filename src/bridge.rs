//! Bitmap → matrix format bridge.
//!
//! Maps a bitmap's pixel type onto a matrix element type, borrows the
//! scanlines as a strided view, reorders RGB-family channels to BGR, and
//! returns an owned top-down copy. Sub-8-bit standard bitmaps have no direct
//! matrix type and go through palette expansion instead.

use alloc::vec;
use alloc::vec::Vec;

use log::{debug, warn};

use crate::bitmap::{ImageType, SourceBitmap};
use crate::error::MatError;
use crate::mat::{Mat, MatType};

/// Result of looking up a bitmap's pixel type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mapping {
    /// Direct matrix type, `None` when the bitmap needs palette expansion.
    pub mat_type: Option<MatType>,
    /// Channels arrive as RGB(A) and must be reordered to BGR(A).
    pub swap_red_blue: bool,
}

impl Mapping {
    const fn direct(mat_type: MatType) -> Self {
        Self {
            mat_type: Some(mat_type),
            swap_red_blue: false,
        }
    }

    const fn swapped(mat_type: MatType) -> Self {
        Self {
            mat_type: Some(mat_type),
            swap_red_blue: true,
        }
    }
}

/// Matrix layout for a bitmap pixel type. `None` for unrecognized types.
pub fn mat_type_for(image_type: ImageType, bpp: u32) -> Option<Mapping> {
    let mapping = match image_type {
        ImageType::Uint16 => Mapping::direct(MatType::U16C1),
        ImageType::Int16 => Mapping::direct(MatType::I16C1),
        ImageType::Uint32 => Mapping::direct(MatType::U32C1),
        ImageType::Int32 => Mapping::direct(MatType::I32C1),
        ImageType::Float => Mapping::direct(MatType::F32C1),
        ImageType::Double => Mapping::direct(MatType::F64C1),
        ImageType::Complex => Mapping::direct(MatType::F64C2),
        ImageType::Rgb16 => Mapping::swapped(MatType::U16C3),
        ImageType::Rgba16 => Mapping::swapped(MatType::U16C4),
        ImageType::RgbF => Mapping::swapped(MatType::F32C3),
        ImageType::RgbaF => Mapping::swapped(MatType::F32C4),
        ImageType::Bitmap => match bpp {
            8 => Mapping::direct(MatType::U8C1),
            16 => Mapping::direct(MatType::U8C2),
            24 => Mapping::direct(MatType::U8C3),
            32 => Mapping::direct(MatType::U8C4),
            // 1, 2, 4: palette expansion
            _ => Mapping {
                mat_type: None,
                swap_red_blue: false,
            },
        },
        ImageType::Unknown => return None,
    };
    Some(mapping)
}

/// Linear intensity table for `bpp`-bit indices: `2^bpp` entries spread
/// evenly over 0..=255.
pub fn palette_lut(bpp: u32) -> Vec<u8> {
    let n = 1usize << bpp.min(8);
    if n == 1 {
        return vec![0];
    }
    let max = (n - 1) as u32;
    (0..n as u32)
        .map(|i| ((2 * 255 * i + max) / (2 * max)) as u8)
        .collect()
}

/// Map 8-bit palette indices (`stride` bytes per row) to intensities through
/// [`palette_lut`]. Indices past the end of the table saturate to 255.
///
/// Output is `width * height` bytes, rows in input order.
pub fn expand_palette(
    indices: &[u8],
    stride: usize,
    width: usize,
    height: usize,
    bpp: u32,
) -> Result<Vec<u8>, MatError> {
    if height > 0 {
        let needed = (height - 1)
            .checked_mul(stride)
            .and_then(|n| n.checked_add(width))
            .ok_or(MatError::DimensionsTooLarge {
                width: width as u64,
                height: height as u64,
            })?;
        if stride < width || indices.len() < needed {
            return Err(MatError::BufferTooSmall {
                needed: needed.max(width),
                actual: indices.len(),
            });
        }
    }
    let lut = palette_lut(bpp);
    let mut out = Vec::with_capacity(width * height);
    for r in 0..height {
        let row = &indices[r * stride..r * stride + width];
        out.extend(row.iter().map(|&i| lut.get(i as usize).copied().unwrap_or(u8::MAX)));
    }
    Ok(out)
}

/// Convert a bitmap into an owned, top-down matrix.
///
/// Unrecognized pixel types yield [`Mat::empty`]. The result never borrows
/// from `src`.
pub fn bitmap_to_mat<B: SourceBitmap + ?Sized>(src: &B) -> Mat<'static> {
    let bpp = src.bpp();
    let image_type = src.image_type();
    let Some(mapping) = mat_type_for(image_type, bpp) else {
        warn!("bitmap type {image_type:?} has no matrix equivalent");
        return Mat::empty();
    };

    let width = src.width() as usize;
    let height = src.height() as usize;
    let step = src.pitch();

    let result = match mapping.mat_type {
        Some(mat_type) => Mat::borrowed(height, width, mat_type, src.bits(), step).map(|view| {
            if mapping.swap_red_blue {
                let mut view = view;
                view.swap_red_blue();
                view.flip_vertical()
            } else {
                view.flip_vertical()
            }
        }),
        None => expand_sub_byte(src, bpp),
    };

    match result {
        Ok(mat) => {
            debug!(
                "bridged {image_type:?} {bpp}bpp {width}x{height} to {:?}",
                mat.mat_type()
            );
            mat
        }
        Err(e) => {
            warn!("bitmap {image_type:?} {bpp}bpp could not be bridged: {e}");
            Mat::empty()
        }
    }
}

fn expand_sub_byte<B: SourceBitmap + ?Sized>(src: &B, bpp: u32) -> Result<Mat<'static>, MatError> {
    let eight = src.to_8bits().ok_or_else(|| {
        MatError::UnsupportedVariant(alloc::format!("no 8-bit form for {bpp}bpp bitmap"))
    })?;
    let width = eight.width() as usize;
    let height = eight.height() as usize;
    let pixels = expand_palette(eight.bits(), eight.pitch(), width, height, bpp)?;
    let bottom_up = Mat::from_vec(&[height, width], MatType::U8C1, pixels)?;
    Ok(bottom_up.flip_vertical())
}
