//! End-to-end loading from disk through each route.

use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};
use zenmat::{
    Limits, LoadRequest, LoadRoute, Mat, MatError, MatType, Unstoppable, load_image, read_binary,
    route_for, write_binary,
};

fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Flat (non run-length) Radiance file, scanlines listed top to bottom.
fn radiance(width: u32, height: u32, rgbe: &[[u8; 4]]) -> Vec<u8> {
    let mut out = format!(
        "#?RADIANCE\n# test fixture\nFORMAT=32-bit_rle_rgbe\n\n-Y {height} +X {width}\n"
    )
    .into_bytes();
    for px in rgbe {
        out.extend_from_slice(px);
    }
    out
}

/// Uncompressed 24-bit true-color Targa.
fn targa24(width: u16, height: u16, descriptor: u8, bgr: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&[24, descriptor]);
    out.extend_from_slice(bgr);
    out
}

fn brdf(dims: [i32; 3], values: &[f64]) -> Vec<u8> {
    let mut out = Vec::new();
    for d in dims {
        out.extend_from_slice(&d.to_le_bytes());
    }
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

#[test]
fn hdr_file_loads_as_bgr_float() {
    let dir = tempdir().unwrap();
    // e = 129 scales mantissas by 1/128
    let path = write(
        &dir,
        "sky.hdr",
        &radiance(3, 2, &[
            [128, 64, 0, 129],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [32, 0, 128, 129],
        ]),
    );
    let mat = load_image(&path).unwrap();
    assert_eq!(mat.mat_type(), MatType::F32C3);
    assert_eq!(mat.dims(), &[2, 3]);
    assert_eq!(mat.at::<[f32; 3]>(&[0, 0]).unwrap(), [0.0, 0.5, 1.0]);
    assert_eq!(mat.at::<[f32; 3]>(&[1, 2]).unwrap(), [1.0, 0.0, 0.25]);
    assert_eq!(mat.at::<[f32; 3]>(&[0, 1]).unwrap(), [0.0; 3]);
}

#[test]
fn tga_file_loads_top_down() {
    let dir = tempdir().unwrap();
    let rows = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

    // bottom-left origin: the first stored row is the bottom of the picture
    let bottom = write(&dir, "bottom.tga", &targa24(2, 2, 0x00, &rows));
    let mat = load_image(&bottom).unwrap();
    assert_eq!(mat.mat_type(), MatType::U8C3);
    assert_eq!(mat.data(), &[7, 8, 9, 10, 11, 12, 1, 2, 3, 4, 5, 6]);

    let top = write(&dir, "top.tga", &targa24(2, 2, 0x20, &rows));
    let mat = load_image(&top).unwrap();
    assert_eq!(mat.data(), &rows);
}

#[test]
fn binary_file_reverses_planar_blocks() {
    let dir = tempdir().unwrap();
    let values: Vec<f64> = (0..24).map(f64::from).collect();
    let path = write(&dir, "gold.binary", &brdf([2, 2, 2], &values));

    let mat = load_image(&path).unwrap();
    assert_eq!(mat.dims(), &[2, 2, 2]);
    assert_eq!(mat.mat_type(), MatType::F32C3);
    let colors = mat.to_vec::<[f32; 3]>().unwrap();
    for (idx, c) in colors.iter().enumerate() {
        assert_eq!(*c, [(16 + idx) as f32, (8 + idx) as f32, idx as f32]);
    }
}

#[test]
fn binary_write_then_read() {
    let dir = tempdir().unwrap();
    let mut data = Vec::new();
    for i in 0..12 {
        for c in 0..3 {
            data.extend_from_slice(&(i as f32 * 0.5 + c as f32).to_ne_bytes());
        }
    }
    let mat = Mat::from_vec(&[1, 3, 4], MatType::F32C3, data).unwrap();
    let path = dir.path().join("saved.binary");
    write_binary(&path, &mat).unwrap();

    let back = read_binary(&path, None).unwrap();
    assert_eq!(back.dims(), mat.dims());
    assert_eq!(back.data(), mat.data());
}

#[test]
fn binary_truncated_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "short.binary", &brdf([1, 1, 2], &[0.0; 5]));
    assert!(matches!(load_image(&path), Err(MatError::UnexpectedEof)));
}

#[test]
fn generic_route_sniffs_content() {
    let dir = tempdir().unwrap();
    // PPM bytes behind a misleading suffix
    let path = write(&dir, "x.png", b"P6\n2 1\n255\n\x01\x02\x03\x04\x05\x06");
    assert_eq!(route_for(&path).unwrap(), LoadRoute::Generic);

    let mat = load_image(&path).unwrap();
    assert_eq!(mat.mat_type(), MatType::U8C3);
    assert_eq!(mat.dims(), &[1, 2]);
    assert_eq!(mat.data(), &[3, 2, 1, 6, 5, 4]);
}

#[test]
fn generic_gray_is_replicated() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "gray.pgm", b"P5\n1 2\n255\n\x40\x80");
    let mat = load_image(&path).unwrap();
    assert_eq!(mat.data(), &[0x40, 0x40, 0x40, 0x80, 0x80, 0x80]);
}

#[test]
fn unknown_content_is_unrecognized() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "notes.txt", b"hello");
    assert!(matches!(load_image(&path), Err(MatError::UnrecognizedFormat)));
}

#[test]
fn limits_are_enforced_per_route() {
    let dir = tempdir().unwrap();
    let limits = Limits {
        max_width: Some(1),
        ..Default::default()
    };
    let tga = write(&dir, "wide.tga", &targa24(2, 1, 0, &[0; 6]));
    let ppm = write(&dir, "wide.ppm", b"P6\n2 1\n255\n\0\0\0\0\0\0");
    for path in [&tga, &ppm] {
        let err = LoadRequest::new(path).with_limits(&limits).load(Unstoppable).unwrap_err();
        assert!(matches!(err, MatError::LimitExceeded(_)), "{path:?}: {err}");
    }
}

#[test]
fn invalid_paths() {
    for p in ["", "/", ".."] {
        assert!(matches!(load_image(p), Err(MatError::InvalidPath(_))), "{p:?}");
    }
    assert!(matches!(
        load_image(Path::new("/no/such/dir/image.hdr")),
        Err(MatError::Io(_))
    ));
}
