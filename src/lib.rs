//! # zenmat
//!
//! Bitmap to matrix conversion and a small set of image loaders.
//!
//! A [`Bitmap`] (or anything implementing [`SourceBitmap`]) stores
//! bottom-up scanlines with a DWORD-aligned pitch and RGB channel order. A
//! [`Mat`] is a dense, top-down, row-major n-dimensional array with
//! interleaved channels in BGR order. [`bitmap_to_mat`] bridges the two:
//! it picks the matrix type, swaps red and blue where needed, expands
//! sub-byte palettes through a gray ramp, and flips rows.
//!
//! ## Loaders
//!
//! - **HDR** (Radiance RGBE) to `F32C3`
//! - **TGA** (color-mapped, true-color, gray, RLE) to `U8C1`/`U8C3`/`U8C4`
//! - **Raw BRDF binary** volumes to 3-D `F32C3`
//! - **Generic**: BMP, PNM/PAM/PFM, farbfeld, QOI (`qoi` feature), always
//!   `U8C3` BGR
//!
//! [`LoadRequest`] picks the loader from the path suffix (`std` feature).
//!
//! ## Usage
//!
//! ```no_run
//! use zenmat::{LoadRequest, MatType, Unstoppable, uniform_horizontal_edges};
//!
//! let mut mat = LoadRequest::new("sky.hdr").load(Unstoppable)?;
//! if mat.mat_type() == MatType::F32C3 {
//!     uniform_horizontal_edges::<[f32; 3]>(&mut mat)?;
//! }
//! # Ok::<(), zenmat::MatError>(())
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`] facade. Install any logger to see
//! route decisions and decoded sizes at `debug`, and empty-matrix
//! fallbacks at `warn`.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod binary;
mod bitmap;
mod bridge;
mod cursor;
mod element;
mod error;
mod generic;
mod hdr;
mod limits;
mod mat;
mod smooth;
mod tga;

#[cfg(feature = "std")]
mod load;

// Re-exports
pub use binary::{decode_binary, encode_binary};
#[cfg(feature = "std")]
pub use binary::{read_binary, write_binary};
pub use bitmap::{Bitmap, ImageType, SourceBitmap, default_pitch};
pub use bridge::{Mapping, bitmap_to_mat, expand_palette, mat_type_for, palette_lut};
pub use element::{Element, Pixel};
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::MatError;
pub use generic::{GenericFormat, decode_generic, detect_format};
pub use hdr::decode_hdr;
pub use limits::Limits;
#[cfg(feature = "std")]
pub use load::{LoadRequest, LoadRoute, load_image, route_for};
pub use mat::{Depth, Mat, MatType};
pub use smooth::uniform_horizontal_edges;
pub use tga::decode_tga;
