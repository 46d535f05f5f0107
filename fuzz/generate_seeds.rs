#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // Radiance 2x1, flat scanline
    let mut hdr = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 2\n".to_vec();
    hdr.extend_from_slice(&[128, 64, 32, 129, 255, 255, 255, 128]);
    fs::write(format!("{dir}/hdr_2x1.hdr"), hdr).unwrap();

    // Radiance 8x1, new-style RLE: one run per channel
    let mut hdr_rle = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n+Y 1 +X 8\n".to_vec();
    hdr_rle.extend_from_slice(&[2, 2, 0, 8]);
    for v in [100u8, 50, 25, 130] {
        hdr_rle.extend_from_slice(&[128 + 8, v]);
    }
    fs::write(format!("{dir}/hdr_rle_8x1.hdr"), hdr_rle).unwrap();

    // TGA 2x1 24-bit true-color, top-left origin
    let mut tga = vec![0u8, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 1, 0, 24, 0x20];
    tga.extend_from_slice(&[0xff, 0x00, 0x00, 0x00, 0xff, 0x00]);
    fs::write(format!("{dir}/tga_2x1.tga"), tga).unwrap();

    // TGA 2x1 RLE gray
    let tga_rle = [0u8, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 1, 0, 8, 0, 0x81, 0x7f];
    fs::write(format!("{dir}/tga_rle_gray.tga"), tga_rle).unwrap();

    // BRDF 1x1x1
    let mut brdf = Vec::new();
    for d in [1i32, 1, 1] {
        brdf.extend_from_slice(&d.to_le_bytes());
    }
    for v in [0.25f64, 0.5, 0.75] {
        brdf.extend_from_slice(&v.to_le_bytes());
    }
    fs::write(format!("{dir}/brdf_1x1x1.binary"), brdf).unwrap();

    // PPM 2x2
    let ppm = b"P6\n2 2\n255\n\xff\x00\x00\x00\xff\x00\x00\x00\xff\x80\x80\x80";
    fs::write(format!("{dir}/ppm_2x2.ppm"), ppm).unwrap();

    // PFM gray 1x1
    let mut pfm = b"Pf\n1 1\n-1.0\n".to_vec();
    pfm.extend_from_slice(&1.0f32.to_le_bytes());
    fs::write(format!("{dir}/pfm_gray_1x1.pfm"), pfm).unwrap();

    // Minimal BMP 1x1 24-bit
    let mut bmp = vec![0u8; 58]; // 54 header + 4 pixel (3 + 1 padding)
    bmp[0] = b'B'; bmp[1] = b'M';
    bmp[2..6].copy_from_slice(&58u32.to_le_bytes()); // file size
    bmp[10..14].copy_from_slice(&54u32.to_le_bytes()); // data offset
    bmp[14..18].copy_from_slice(&40u32.to_le_bytes()); // DIB header size
    bmp[18..22].copy_from_slice(&1i32.to_le_bytes()); // width
    bmp[22..26].copy_from_slice(&1i32.to_le_bytes()); // height
    bmp[26..28].copy_from_slice(&1u16.to_le_bytes()); // planes
    bmp[28..30].copy_from_slice(&24u16.to_le_bytes()); // bpp
    bmp[54] = 0xff; bmp[55] = 0x00; bmp[56] = 0x00; // BGR
    fs::write(format!("{dir}/bmp_1x1.bmp"), bmp).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/radiance_no_res.bin"), b"#?RADIANCE\n\n").unwrap();
    fs::write(format!("{dir}/brdf_negative.bin"), [0xffu8; 12]).unwrap();
    fs::write(format!("{dir}/bm_short.bin"), b"BM\x00\x00").unwrap();

    println!("Generated seed corpus in {dir}/");
}
