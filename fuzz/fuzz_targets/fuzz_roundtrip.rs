#![no_main]
use libfuzzer_sys::fuzz_target;
use zenmat::*;

fuzz_target!(|data: &[u8]| {
    // A volume that decodes must encode back to the same bytes
    let limits = Limits {
        max_pixels: Some(1 << 20),
        ..Default::default()
    };
    let Ok(volume) = decode_binary(data, Some(&limits)) else {
        return;
    };
    let encoded = encode_binary(&volume).expect("decoded volume must re-encode");
    let again = decode_binary(&encoded, None).expect("re-encoded volume must decode");

    assert_eq!(volume.dims(), again.dims());
    // f64 -> f32 narrowing makes byte equality with `data` too strict; the
    // second pass is exact.
    assert_eq!(volume.data(), again.data(), "roundtrip mismatch");
});
