//! PNM family reader: P5 (PGM), P6 (PPM), P7 (PAM), PFM.

use alloc::vec::Vec;
use enough::Stop;

use super::{Bgr8, bgr8_len, float_to_u8, push_bgr, scale_to_u8};
use crate::error::MatError;
use crate::limits::Limits;

/// Which PNM sub-format the magic selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PnmFormat {
    Pgm,
    Ppm,
    Pam,
    Pfm,
}

/// Parsed PNM header.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PnmHeader {
    pub format: PnmFormat,
    pub width: u32,
    pub height: u32,
    pub maxval: u32,
    pub depth: u32,
    /// PFM only: negative means little-endian samples.
    pub pfm_scale: f32,
    pub data_offset: usize,
}

struct HeaderReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HeaderReader<'a> {
    /// Next whitespace-delimited token, skipping `#` comments.
    fn token(&mut self) -> Result<&'a [u8], MatError> {
        loop {
            match self.data.get(self.pos) {
                None => return Err(MatError::UnexpectedEof),
                Some(b'#') => {
                    while let Some(&b) = self.data.get(self.pos) {
                        self.pos += 1;
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(_) => break,
            }
        }
        let start = self.pos;
        while self
            .data
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        Ok(&self.data[start..self.pos])
    }

    fn number(&mut self, what: &str) -> Result<u32, MatError> {
        let tok = self.token()?;
        core::str::from_utf8(tok)
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| MatError::InvalidHeader(alloc::format!("bad PNM {what}")))
    }

    /// The single whitespace byte that ends a P5/P6/PFM header.
    fn end_of_header(&mut self) -> Result<usize, MatError> {
        match self.data.get(self.pos) {
            Some(b) if b.is_ascii_whitespace() => Ok(self.pos + 1),
            Some(_) => Err(MatError::InvalidHeader(
                "PNM header not followed by whitespace".into(),
            )),
            None => Err(MatError::UnexpectedEof),
        }
    }

    fn line(&mut self) -> Result<&'a [u8], MatError> {
        let rest = &self.data[self.pos..];
        let len = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(MatError::UnexpectedEof)?;
        self.pos += len + 1;
        Ok(&rest[..len])
    }
}

pub(crate) fn parse_header(data: &[u8]) -> Result<PnmHeader, MatError> {
    let format = match data.get(..2) {
        Some(b"P5") => PnmFormat::Pgm,
        Some(b"P6") => PnmFormat::Ppm,
        Some(b"P7") => PnmFormat::Pam,
        Some(b"PF") | Some(b"Pf") => PnmFormat::Pfm,
        Some(_) => return Err(MatError::UnrecognizedFormat),
        None => return Err(MatError::UnexpectedEof),
    };
    let mut r = HeaderReader { data, pos: 2 };

    let header = match format {
        PnmFormat::Pgm | PnmFormat::Ppm => {
            let width = r.number("width")?;
            let height = r.number("height")?;
            let maxval = r.number("maxval")?;
            PnmHeader {
                format,
                width,
                height,
                maxval,
                depth: if format == PnmFormat::Pgm { 1 } else { 3 },
                pfm_scale: 0.0,
                data_offset: r.end_of_header()?,
            }
        }
        PnmFormat::Pfm => {
            let width = r.number("width")?;
            let height = r.number("height")?;
            let tok = r.token()?;
            let pfm_scale = core::str::from_utf8(tok)
                .ok()
                .and_then(|s| s.parse::<f32>().ok())
                .filter(|s| *s != 0.0 && s.is_finite())
                .ok_or_else(|| MatError::InvalidHeader("bad PFM scale".into()))?;
            PnmHeader {
                format,
                width,
                height,
                maxval: 0,
                depth: if data[1] == b'F' { 3 } else { 1 },
                pfm_scale,
                data_offset: r.end_of_header()?,
            }
        }
        PnmFormat::Pam => parse_pam(&mut r)?,
    };

    if header.width == 0 || header.height == 0 {
        return Err(MatError::InvalidHeader("PNM image has zero size".into()));
    }
    if header.format != PnmFormat::Pfm && !(1..=65535).contains(&header.maxval) {
        return Err(MatError::InvalidHeader(alloc::format!(
            "PNM maxval {} out of range",
            header.maxval
        )));
    }
    if !(1..=4).contains(&header.depth) {
        return Err(MatError::UnsupportedVariant(alloc::format!(
            "PAM depth {}",
            header.depth
        )));
    }
    Ok(header)
}

fn parse_pam(r: &mut HeaderReader<'_>) -> Result<PnmHeader, MatError> {
    let (mut width, mut height, mut depth, mut maxval) = (None, None, None, None);
    // rest of the magic line
    r.line()?;
    loop {
        let line = r.line()?;
        let text = core::str::from_utf8(line)
            .map_err(|_| MatError::InvalidHeader("PAM header is not ASCII".into()))?
            .trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        if text == "ENDHDR" {
            break;
        }
        let (key, value) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        let value = value.trim();
        let parse = |v: &str| {
            v.parse::<u32>()
                .map_err(|_| MatError::InvalidHeader(alloc::format!("bad PAM {key} {v:?}")))
        };
        match key {
            "WIDTH" => width = Some(parse(value)?),
            "HEIGHT" => height = Some(parse(value)?),
            "DEPTH" => depth = Some(parse(value)?),
            "MAXVAL" => maxval = Some(parse(value)?),
            _ => {}
        }
    }
    let missing = |k: &str| MatError::InvalidHeader(alloc::format!("PAM header missing {k}"));
    Ok(PnmHeader {
        format: PnmFormat::Pam,
        width: width.ok_or_else(|| missing("WIDTH"))?,
        height: height.ok_or_else(|| missing("HEIGHT"))?,
        maxval: maxval.ok_or_else(|| missing("MAXVAL"))?,
        depth: depth.ok_or_else(|| missing("DEPTH"))?,
        pfm_scale: 0.0,
        data_offset: r.pos,
    })
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
    let depth = header.depth as usize;
    let sample_bytes = match header.format {
        PnmFormat::Pfm => 4,
        _ if header.maxval > 255 => 2,
        _ => 1,
    };
    let row_bytes = w
        .checked_mul(depth * sample_bytes)
        .ok_or(MatError::DimensionsTooLarge {
            width: u64::from(header.width),
            height: u64::from(header.height),
        })?;
    let expected = row_bytes.checked_mul(h).ok_or(MatError::DimensionsTooLarge {
        width: u64::from(header.width),
        height: u64::from(header.height),
    })?;
    let pixel_data = data[header.data_offset..]
        .get(..expected)
        .ok_or(MatError::UnexpectedEof)?;

    let mut out = Vec::with_capacity(out_bytes);
    let mut px = [0u8; 4];
    for r in 0..h {
        if r % 16 == 0 {
            stop.check()?;
        }
        // PFM rows run bottom to top
        let src_row = if header.format == PnmFormat::Pfm { h - 1 - r } else { r };
        let row = &pixel_data[src_row * row_bytes..(src_row + 1) * row_bytes];
        for samples in row.chunks_exact(depth * sample_bytes) {
            for (c, s) in samples.chunks_exact(sample_bytes).enumerate() {
                px[c] = match (header.format, sample_bytes) {
                    (PnmFormat::Pfm, _) => {
                        let b = [s[0], s[1], s[2], s[3]];
                        let v = if header.pfm_scale < 0.0 {
                            f32::from_le_bytes(b)
                        } else {
                            f32::from_be_bytes(b)
                        };
                        float_to_u8(v)
                    }
                    (_, 2) => scale_to_u8(u32::from(u16::from_be_bytes([s[0], s[1]])), header.maxval),
                    _ => scale_to_u8(u32::from(s[0]), header.maxval),
                };
            }
            push_bgr(&mut out, &px[..depth]);
        }
    }

    Ok(Bgr8 {
        width: w,
        height: h,
        bgr: out,
    })
}
