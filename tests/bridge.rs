//! Bitmap → matrix bridge behavior over every supported pixel type.

use zenmat::{
    Bitmap, ImageType, MatType, SourceBitmap, bitmap_to_mat, expand_palette, mat_type_for,
    palette_lut, uniform_horizontal_edges,
};

/// Every (type, bpp) pair with a direct matrix layout.
const DIRECT: &[(ImageType, u32, MatType, bool)] = &[
    (ImageType::Bitmap, 8, MatType::U8C1, false),
    (ImageType::Bitmap, 16, MatType::U8C2, false),
    (ImageType::Bitmap, 24, MatType::U8C3, false),
    (ImageType::Bitmap, 32, MatType::U8C4, false),
    (ImageType::Uint16, 16, MatType::U16C1, false),
    (ImageType::Int16, 16, MatType::I16C1, false),
    (ImageType::Uint32, 32, MatType::U32C1, false),
    (ImageType::Int32, 32, MatType::I32C1, false),
    (ImageType::Float, 32, MatType::F32C1, false),
    (ImageType::Double, 64, MatType::F64C1, false),
    (ImageType::Complex, 128, MatType::F64C2, false),
    (ImageType::Rgb16, 48, MatType::U16C3, true),
    (ImageType::Rgba16, 64, MatType::U16C4, true),
    (ImageType::RgbF, 96, MatType::F32C3, true),
    (ImageType::RgbaF, 128, MatType::F32C4, true),
];

/// Bitmap whose bytes are a position-dependent pattern, padding included.
fn patterned(image_type: ImageType, bpp: u32, width: u32, height: u32) -> Bitmap {
    let mut bmp = Bitmap::new(image_type, bpp, width, height).unwrap();
    for (i, b) in bmp.bits_mut().iter_mut().enumerate() {
        *b = (i * 31 + 7) as u8;
    }
    bmp
}

#[test]
fn mapping_table() {
    for &(image_type, bpp, mat_type, swap) in DIRECT {
        let m = mat_type_for(image_type, bpp).unwrap();
        assert_eq!(m.mat_type, Some(mat_type), "{image_type:?} {bpp}");
        assert_eq!(m.swap_red_blue, swap, "{image_type:?} {bpp}");
    }
    for bpp in [1, 2, 4] {
        let m = mat_type_for(ImageType::Bitmap, bpp).unwrap();
        assert_eq!(m.mat_type, None);
    }
    assert_eq!(mat_type_for(ImageType::Unknown, 24), None);
}

#[test]
fn every_direct_type_flips_and_reorders() {
    // 3 columns leaves row padding for most depths
    let (w, h) = (3u32, 4u32);
    for &(image_type, bpp, mat_type, swap) in DIRECT {
        let bmp = patterned(image_type, bpp, w, h);
        let mat = bitmap_to_mat(&bmp);

        assert_eq!(mat.mat_type(), mat_type, "{image_type:?}");
        assert_eq!(mat.dims(), &[h as usize, w as usize]);
        assert!(!mat.is_borrowed());
        assert!(mat.is_continuous());

        let px = mat_type.elem_size();
        let cb = mat_type.depth.size();
        let channels = usize::from(mat_type.channels);
        for r in 0..h as usize {
            let src = bmp.scanline(h as usize - 1 - r);
            let dst = mat.row(r);
            for x in 0..w as usize {
                for c in 0..channels {
                    let sc = match c {
                        0 if swap => 2,
                        2 if swap => 0,
                        _ => c,
                    };
                    let d = x * px + c * cb;
                    let s = x * px + sc * cb;
                    assert_eq!(
                        dst[d..d + cb],
                        src[s..s + cb],
                        "{image_type:?} row {r} col {x} ch {c}"
                    );
                }
            }
        }
    }
}

#[test]
fn rgbf_pixel_values_come_out_bgr() {
    let mut bmp = Bitmap::new(ImageType::RgbF, 96, 1, 2).unwrap();
    // bottom scanline is the lower picture row
    for (y, rgb) in [[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]].iter().enumerate() {
        let line = bmp.scanline_mut(y);
        for (c, v) in rgb.iter().enumerate() {
            line[c * 4..c * 4 + 4].copy_from_slice(&v.to_ne_bytes());
        }
    }
    let mat = bitmap_to_mat(&bmp);
    assert_eq!(mat.at::<[f32; 3]>(&[0, 0]).unwrap(), [6.0, 5.0, 4.0]);
    assert_eq!(mat.at::<[f32; 3]>(&[1, 0]).unwrap(), [3.0, 2.0, 1.0]);
}

#[test]
fn one_bit_palette_reference() {
    assert_eq!(palette_lut(1), vec![0, 255]);
    // 1-bit, 10 pixels wide: two bytes per row, pitch 4
    let mut bmp = Bitmap::new(ImageType::Bitmap, 1, 10, 2).unwrap();
    bmp.scanline_mut(0)[..2].copy_from_slice(&[0b1010_0000, 0b0100_0000]);
    bmp.scanline_mut(1)[..2].copy_from_slice(&[0b1111_1111, 0b1100_0000]);

    let mat = bitmap_to_mat(&bmp);
    assert_eq!(mat.mat_type(), MatType::U8C1);
    assert_eq!(mat.dims(), &[2, 10]);
    assert_eq!(mat.row(0), &[255; 10]);
    assert_eq!(mat.row(1), &[255, 0, 255, 0, 0, 0, 0, 0, 0, 255]);
}

#[test]
fn four_bit_palette_reference() {
    let lut = palette_lut(4);
    assert_eq!(lut.len(), 16);
    assert_eq!(lut[0], 0);
    assert_eq!(lut[1], 17);
    assert_eq!(lut[8], 136);
    assert_eq!(lut[15], 255);

    let mut bmp = Bitmap::new(ImageType::Bitmap, 4, 3, 1).unwrap();
    bmp.scanline_mut(0)[..2].copy_from_slice(&[0x0f, 0x80]);
    let mat = bitmap_to_mat(&bmp);
    assert_eq!(mat.row(0), &[0, 255, 136]);
}

#[test]
fn expand_palette_saturates_out_of_table() {
    // two 3-wide rows with one byte of stride padding
    let indices = [0, 1, 9, 0xee, 3, 2, 1];
    let out = expand_palette(&indices, 4, 3, 2, 2).unwrap();
    assert_eq!(out, vec![0, 85, 255, 255, 170, 85]);
}

#[test]
fn expand_palette_rejects_short_input() {
    assert!(expand_palette(&[0; 5], 4, 3, 2, 1).is_err());
}

#[test]
fn unknown_type_gives_empty() {
    let bmp = Bitmap::new(ImageType::Unknown, 24, 2, 2).unwrap();
    let mat = bitmap_to_mat(&bmp);
    assert!(mat.is_empty());
    assert!(mat.dims().is_empty());
}

/// A foreign bitmap implementation with a wide pitch.
struct Strided {
    bits: Vec<u8>,
}

impl SourceBitmap for Strided {
    fn bpp(&self) -> u32 {
        8
    }
    fn image_type(&self) -> ImageType {
        ImageType::Bitmap
    }
    fn width(&self) -> u32 {
        2
    }
    fn height(&self) -> u32 {
        3
    }
    fn pitch(&self) -> usize {
        16
    }
    fn bits(&self) -> &[u8] {
        &self.bits
    }
}

#[test]
fn foreign_source_with_wide_pitch() {
    let mut bits = vec![0xaa; 48];
    for y in 0..3 {
        bits[y * 16] = y as u8;
        bits[y * 16 + 1] = 10 + y as u8;
    }
    let mat = bitmap_to_mat(&Strided { bits });
    assert_eq!(mat.data(), &[2, 12, 1, 11, 0, 10]);
}

#[test]
fn smoothing_removes_edge_seam() {
    let (rows, cols) = (5usize, 4usize);
    let mut data = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            let v = match (r, c) {
                (0, 1) => 10.0f32,
                (0, _) => 2.0,
                (4, 3) => -6.0,
                (4, _) => 6.0,
                _ => 1.0,
            };
            data.extend_from_slice(&v.to_ne_bytes());
        }
    }
    let mut mat = zenmat::Mat::from_vec(&[rows, cols], MatType::F32C1, data).unwrap();
    uniform_horizontal_edges::<f32>(&mut mat).unwrap();

    // top mean 4, bottom mean 3
    for c in 0..cols {
        let top: f32 = mat.at(&[0, c]).unwrap();
        let bottom: f32 = mat.at(&[rows - 1, c]).unwrap();
        assert!((top - 4.0).abs() < 1e-5, "top col {c}: {top}");
        assert!((bottom - 3.0).abs() < 1e-5, "bottom col {c}: {bottom}");
    }
    // column 1: top diff -6, bottom diff -3; row 2 gets half of each
    let mid: f32 = mat.at(&[2, 1]).unwrap();
    assert!((mid - (1.0 - 3.0 - 1.5)).abs() < 1e-5, "{mid}");
    // column 3: top diff 2, bottom diff 9; row 1 gets 3/4 and 1/4
    let r1: f32 = mat.at(&[1, 3]).unwrap();
    assert!((r1 - (1.0 + 1.5 + 2.25)).abs() < 1e-5, "{r1}");
}
