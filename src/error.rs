use alloc::string::String;
use enough::StopReason;

use crate::mat::MatType;

/// Errors from bitmap bridging, decoding and file loading.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MatError {
    #[error("unrecognized format magic bytes")]
    UnrecognizedFormat,

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("unsupported format variant: {0}")]
    UnsupportedVariant(String),

    #[error("invalid pixel data: {0}")]
    InvalidData(String),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u64, height: u64 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("matrix type mismatch: expected {expected:?}, got {actual:?}")]
    LayoutMismatch { expected: MatType, actual: MatType },

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[cfg(feature = "std")]
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for MatError {
    fn from(r: StopReason) -> Self {
        MatError::Cancelled(r)
    }
}
