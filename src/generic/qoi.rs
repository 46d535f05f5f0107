//! QOI reader backed by `rapid-qoi`.

use alloc::vec::Vec;
use enough::Stop;
use rapid_qoi::Qoi;

use super::{Bgr8, bgr8_len, push_bgr};
use crate::error::MatError;
use crate::limits::Limits;

pub(crate) fn decode(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Bgr8, MatError> {
    let header = Qoi::decode_header(data)
        .map_err(|e| MatError::InvalidHeader(alloc::format!("QOI: {e:?}")))?;
    if header.width == 0 || header.height == 0 {
        return Err(MatError::InvalidHeader("QOI image has zero size".into()));
    }
    let out_bytes = bgr8_len(header.width, header.height, limits)?;
    stop.check()?;

    let (qoi, pixels) = Qoi::decode_alloc(data)
        .map_err(|e| MatError::InvalidData(alloc::format!("QOI: {e:?}")))?;
    stop.check()?;

    let channels = if qoi.colors.has_alpha() { 4 } else { 3 };
    let mut out = Vec::with_capacity(out_bytes);
    for px in pixels.chunks_exact(channels) {
        push_bgr(&mut out, px);
    }

    Ok(Bgr8 {
        width: qoi.width as usize,
        height: qoi.height as usize,
        bgr: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use enough::Unstoppable;
    use rapid_qoi::Colors;

    #[test]
    fn rgba_drops_alpha() {
        let qoi = Qoi {
            width: 2,
            height: 1,
            colors: Colors::Rgba,
        };
        let encoded = qoi.encode_alloc(&[1, 2, 3, 255, 4, 5, 6, 0]).unwrap();
        let img = decode(&encoded, None, &Unstoppable).unwrap();
        assert_eq!((img.width, img.height), (2, 1));
        assert_eq!(img.bgr, vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn garbage_after_magic() {
        assert!(decode(b"qoif\x00", None, &Unstoppable).is_err());
    }
}
