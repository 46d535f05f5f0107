use alloc::borrow::Cow;
use alloc::vec;
use alloc::vec::Vec;

use crate::element::Pixel;
use crate::error::MatError;

/// Scalar depth of a matrix channel.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Depth {
    U8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl Depth {
    /// Bytes per channel value.
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// Element type of a matrix: channel depth plus channel count (1..=4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatType {
    pub depth: Depth,
    pub channels: u8,
}

impl MatType {
    pub const U8C1: Self = Self::new(Depth::U8, 1);
    pub const U8C2: Self = Self::new(Depth::U8, 2);
    pub const U8C3: Self = Self::new(Depth::U8, 3);
    pub const U8C4: Self = Self::new(Depth::U8, 4);
    pub const U16C1: Self = Self::new(Depth::U16, 1);
    pub const U16C3: Self = Self::new(Depth::U16, 3);
    pub const U16C4: Self = Self::new(Depth::U16, 4);
    pub const I16C1: Self = Self::new(Depth::I16, 1);
    pub const U32C1: Self = Self::new(Depth::U32, 1);
    pub const I32C1: Self = Self::new(Depth::I32, 1);
    pub const F32C1: Self = Self::new(Depth::F32, 1);
    pub const F32C3: Self = Self::new(Depth::F32, 3);
    pub const F32C4: Self = Self::new(Depth::F32, 4);
    pub const F64C1: Self = Self::new(Depth::F64, 1);
    /// Complex double: real and imaginary parts as two channels.
    pub const F64C2: Self = Self::new(Depth::F64, 2);

    pub const fn new(depth: Depth, channels: u8) -> Self {
        Self { depth, channels }
    }

    /// Bytes per element (all channels).
    pub const fn elem_size(self) -> usize {
        self.depth.size() * self.channels as usize
    }

    /// Channel count is within 1..=4.
    pub const fn is_supported(self) -> bool {
        matches!(self.channels, 1..=4)
    }

    fn check(self) -> Result<(), MatError> {
        if !self.is_supported() {
            return Err(MatError::UnsupportedVariant(alloc::format!(
                "matrix with {} channels",
                self.channels
            )));
        }
        Ok(())
    }
}

/// Dense n-dimensional matrix, top-down row order.
///
/// Data is either borrowed from an external buffer (a view, possibly with
/// padded rows) or owned. `step` is the byte distance between consecutive
/// indices of the first dimension. Elements are stored native-endian,
/// channels interleaved.
#[derive(Clone, Debug)]
pub struct Mat<'a> {
    dims: Vec<usize>,
    mat_type: MatType,
    step: usize,
    data: Cow<'a, [u8]>,
}

impl Default for Mat<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> Mat<'a> {
    /// The empty matrix (no dimensions, no data).
    pub fn empty() -> Mat<'static> {
        Mat {
            dims: Vec::new(),
            mat_type: MatType::U8C1,
            step: 0,
            data: Cow::Owned(Vec::new()),
        }
    }

    /// Zero-filled owned matrix.
    pub fn zeros(dims: &[usize], mat_type: MatType) -> Result<Mat<'static>, MatError> {
        let bytes = byte_len(dims, mat_type)?;
        Mat::from_vec(dims, mat_type, vec![0u8; bytes])
    }

    /// Owned continuous matrix over `data`, which must hold exactly
    /// `product(dims) * elem_size` bytes.
    pub fn from_vec(
        dims: &[usize],
        mat_type: MatType,
        data: Vec<u8>,
    ) -> Result<Mat<'static>, MatError> {
        let needed = byte_len(dims, mat_type)?;
        if data.len() != needed {
            return Err(MatError::BufferTooSmall {
                needed,
                actual: data.len(),
            });
        }
        Ok(Mat {
            dims: dims.to_vec(),
            mat_type,
            step: continuous_step(dims, mat_type),
            data: Cow::Owned(data),
        })
    }

    /// 2-D view over an external buffer with row pitch `step` (no copy).
    pub fn borrowed(
        rows: usize,
        cols: usize,
        mat_type: MatType,
        data: &'a [u8],
        step: usize,
    ) -> Result<Mat<'a>, MatError> {
        mat_type.check()?;
        let row_bytes = cols
            .checked_mul(mat_type.elem_size())
            .ok_or(MatError::DimensionsTooLarge {
                width: cols as u64,
                height: rows as u64,
            })?;
        if step < row_bytes {
            return Err(MatError::InvalidData(alloc::format!(
                "row step {step} is smaller than row size {row_bytes}"
            )));
        }
        let needed = if rows == 0 {
            0
        } else {
            (rows - 1)
                .checked_mul(step)
                .and_then(|n| n.checked_add(row_bytes))
                .ok_or(MatError::DimensionsTooLarge {
                    width: cols as u64,
                    height: rows as u64,
                })?
        };
        if data.len() < needed {
            return Err(MatError::BufferTooSmall {
                needed,
                actual: data.len(),
            });
        }
        Ok(Mat {
            dims: vec![rows, cols],
            mat_type,
            step,
            data: Cow::Borrowed(data),
        })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn mat_type(&self) -> MatType {
        self.mat_type
    }

    /// Size of the first dimension.
    pub fn rows(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    /// Size of the second dimension.
    pub fn cols(&self) -> usize {
        self.dims.get(1).copied().unwrap_or(0)
    }

    /// Number of elements.
    pub fn total(&self) -> usize {
        if self.dims.is_empty() {
            0
        } else {
            self.dims.iter().product()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn elem_size(&self) -> usize {
        self.mat_type.elem_size()
    }

    /// Byte distance between consecutive first-dimension indices.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Whether the data is borrowed from an external buffer.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.data, Cow::Borrowed(_))
    }

    /// Whether rows are packed without padding.
    pub fn is_continuous(&self) -> bool {
        self.step == self.row_bytes()
    }

    /// Raw backing bytes, including row padding for strided views.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes of one first-dimension slice, without padding.
    fn row_bytes(&self) -> usize {
        continuous_step(&self.dims, self.mat_type)
    }

    /// Bytes of row `r` (a first-dimension slice), without padding.
    pub fn row(&self, r: usize) -> &[u8] {
        let start = r * self.step;
        &self.data[start..start + self.row_bytes()]
    }

    /// Mutable bytes of row `r`. Copies borrowed data first.
    pub fn row_mut(&mut self, r: usize) -> &mut [u8] {
        let start = r * self.step;
        let len = self.row_bytes();
        &mut self.data.to_mut()[start..start + len]
    }

    fn offset(&self, idx: &[usize]) -> Option<usize> {
        if idx.len() != self.dims.len() || idx.iter().zip(&self.dims).any(|(i, d)| i >= d) {
            return None;
        }
        let mut inner = 0usize;
        for (i, d) in idx[1..].iter().zip(&self.dims[1..]) {
            inner = inner * d + i;
        }
        Some(idx[0] * self.step + inner * self.elem_size())
    }

    pub(crate) fn check_pixel<P: Pixel>(&self) -> Result<(), MatError> {
        // CHANNELS is compared unnarrowed so `[u8; 257]` never passes as U8C1
        if P::MAT_TYPE != self.mat_type || P::CHANNELS != usize::from(self.mat_type.channels) {
            return Err(MatError::LayoutMismatch {
                expected: P::MAT_TYPE,
                actual: self.mat_type,
            });
        }
        Ok(())
    }

    /// Read the element at `idx` (one index per dimension).
    pub fn at<P: Pixel>(&self, idx: &[usize]) -> Result<P, MatError> {
        self.check_pixel::<P>()?;
        let off = self
            .offset(idx)
            .ok_or_else(|| MatError::InvalidData(alloc::format!("index {idx:?} out of bounds")))?;
        Ok(P::read(&self.data[off..off + self.elem_size()]))
    }

    /// Write the element at `idx`. Copies borrowed data first.
    pub fn set<P: Pixel>(&mut self, idx: &[usize], value: P) -> Result<(), MatError> {
        self.check_pixel::<P>()?;
        let off = self
            .offset(idx)
            .ok_or_else(|| MatError::InvalidData(alloc::format!("index {idx:?} out of bounds")))?;
        let size = self.elem_size();
        value.write(&mut self.data.to_mut()[off..off + size]);
        Ok(())
    }

    /// All elements in row-major order.
    pub fn to_vec<P: Pixel>(&self) -> Result<Vec<P>, MatError> {
        self.check_pixel::<P>()?;
        let size = self.elem_size();
        let mut out = Vec::with_capacity(self.total());
        for r in 0..self.rows() {
            out.extend(self.row(r).chunks_exact(size).map(P::read));
        }
        Ok(out)
    }

    /// Continuous owned copy. Moves the buffer when it is already owned and
    /// continuous.
    pub fn into_owned(self) -> Mat<'static> {
        let packed = self.is_continuous() && self.data.len() == self.rows() * self.row_bytes();
        if !packed || self.is_borrowed() {
            return self.to_continuous();
        }
        Mat {
            dims: self.dims,
            mat_type: self.mat_type,
            step: self.step,
            data: Cow::Owned(self.data.into_owned()),
        }
    }

    /// Continuous owned copy, dropping any row padding.
    pub fn to_continuous(&self) -> Mat<'static> {
        let mut data = Vec::with_capacity(self.rows() * self.row_bytes());
        for r in 0..self.rows() {
            data.extend_from_slice(self.row(r));
        }
        Mat {
            dims: self.dims.clone(),
            mat_type: self.mat_type,
            step: self.row_bytes(),
            data: Cow::Owned(data),
        }
    }

    /// Continuous owned copy with the first dimension reversed
    /// (row 0 becomes the last row).
    pub fn flip_vertical(&self) -> Mat<'static> {
        let mut data = Vec::with_capacity(self.rows() * self.row_bytes());
        for r in (0..self.rows()).rev() {
            data.extend_from_slice(self.row(r));
        }
        Mat {
            dims: self.dims.clone(),
            mat_type: self.mat_type,
            step: self.row_bytes(),
            data: Cow::Owned(data),
        }
    }

    /// Exchange channels 0 and 2 of every element (RGB↔BGR, RGBA↔BGRA).
    /// No-op for fewer than three channels. Copies borrowed data first.
    pub fn swap_red_blue(&mut self) {
        if self.mat_type.channels < 3 || self.is_empty() {
            return;
        }
        let size = self.mat_type.depth.size();
        let elem = self.elem_size();
        let row_bytes = self.row_bytes();
        let step = self.step;
        let rows = self.rows();
        let data = self.data.to_mut();
        for r in 0..rows {
            let row = &mut data[r * step..r * step + row_bytes];
            for px in row.chunks_exact_mut(elem) {
                let (first, rest) = px.split_at_mut(2 * size);
                first[..size].swap_with_slice(&mut rest[..size]);
            }
        }
    }

    /// Copy a 2-D matrix into an [`imgref::ImgVec`] of typed pixels.
    ///
    /// Returns [`MatError::LayoutMismatch`] if the matrix type doesn't match `P`.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec<P: Pixel>(&self) -> Result<imgref::ImgVec<P>, MatError> {
        if self.dims.len() != 2 {
            return Err(MatError::UnsupportedVariant(alloc::format!(
                "{}-dimensional matrix has no 2D image view",
                self.dims.len()
            )));
        }
        let pixels = self.to_vec::<P>()?;
        Ok(imgref::ImgVec::new(pixels, self.cols(), self.rows()))
    }
}

/// Bytes of one first-dimension slice of a continuous matrix.
fn continuous_step(dims: &[usize], mat_type: MatType) -> usize {
    dims.get(1..)
        .map(|inner| inner.iter().product::<usize>())
        .unwrap_or(0)
        * mat_type.elem_size()
}

fn byte_len(dims: &[usize], mat_type: MatType) -> Result<usize, MatError> {
    mat_type.check()?;
    dims.iter()
        .try_fold(mat_type.elem_size(), |acc, &d| acc.checked_mul(d))
        .ok_or(MatError::DimensionsTooLarge {
            width: dims.get(1).copied().unwrap_or(0) as u64,
            height: dims.first().copied().unwrap_or(0) as u64,
        })
}
