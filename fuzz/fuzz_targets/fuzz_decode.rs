#![no_main]
use libfuzzer_sys::fuzz_target;
use zenmat::{Limits, bitmap_to_mat};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 22),
        max_memory_bytes: Some(1 << 28),
        ..Default::default()
    };
    let limits = Some(&limits);

    // Every route must reject bad input without panicking
    if let Ok(bitmap) = zenmat::decode_hdr(data, limits, &enough::Unstoppable) {
        let _ = bitmap_to_mat(&bitmap);
    }
    if let Ok(bitmap) = zenmat::decode_tga(data, limits, &enough::Unstoppable) {
        let _ = bitmap_to_mat(&bitmap);
    }
    let _ = zenmat::decode_binary(data, limits);
    let _ = zenmat::decode_generic(data, limits, &enough::Unstoppable);
});
