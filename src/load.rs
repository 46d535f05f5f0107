//! Path-based loading.
//!
//! The route is picked from the file name suffix, not from the content:
//! `…hdr` is Radiance, `…tga` is Targa, `…binary` is a raw BRDF volume, and
//! everything else goes through magic-byte sniffing in [`decode_generic`].

use std::path::Path;

use enough::{Stop, Unstoppable};
use log::debug;

use crate::binary::decode_binary;
use crate::bridge::bitmap_to_mat;
use crate::error::MatError;
use crate::generic::decode_generic;
use crate::hdr::decode_hdr;
use crate::limits::Limits;
use crate::mat::Mat;
use crate::tga::decode_tga;

/// Decode strategy chosen from a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadRoute {
    /// Radiance RGBE, through the bitmap bridge.
    Hdr,
    /// Targa, through the bitmap bridge.
    Tga,
    /// Raw BRDF volume.
    RawBinary,
    /// Magic-byte sniffing, 8-bit BGR output.
    Generic,
}

/// Pick the decode route for `path`.
///
/// Matching is a case-sensitive suffix test on the whole path string, so
/// `x.hdr` and `xhdr` both route to [`LoadRoute::Hdr`]. Paths that are not
/// UTF-8 or have no file name (`""`, `"/"`, `".."`) are rejected.
pub fn route_for(path: &Path) -> Result<LoadRoute, MatError> {
    let text = path
        .to_str()
        .ok_or_else(|| MatError::InvalidPath(path.to_string_lossy().into_owned()))?;
    if path.file_name().is_none() {
        return Err(MatError::InvalidPath(text.into()));
    }

    let route = if text.ends_with("hdr") {
        LoadRoute::Hdr
    } else if text.ends_with("tga") {
        LoadRoute::Tga
    } else if text.ends_with("binary") {
        LoadRoute::RawBinary
    } else {
        LoadRoute::Generic
    };
    Ok(route)
}

/// Builder for loading an image file into a [`Mat`].
///
/// ```no_run
/// use zenmat::{LoadRequest, Limits, Unstoppable};
///
/// let limits = Limits {
///     max_pixels: Some(64 * 1024 * 1024),
///     ..Default::default()
/// };
/// let mat = LoadRequest::new("sky.hdr")
///     .with_limits(&limits)
///     .load(Unstoppable)?;
/// println!("{:?} {:?}", mat.dims(), mat.mat_type());
/// # Ok::<(), zenmat::MatError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LoadRequest<'a> {
    path: &'a Path,
    limits: Option<&'a Limits>,
}

impl<'a> LoadRequest<'a> {
    pub fn new(path: &'a (impl AsRef<Path> + ?Sized)) -> Self {
        Self {
            path: path.as_ref(),
            limits: None,
        }
    }

    /// Reject images exceeding `limits` before allocating pixel buffers.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Read the file and decode it by route.
    ///
    /// HDR and TGA results pass through [`bitmap_to_mat`], so an unsupported
    /// bitmap layout comes back as an empty matrix rather than an error.
    pub fn load(self, stop: impl Stop) -> Result<Mat<'static>, MatError> {
        let route = route_for(self.path)?;
        debug!("loading {} via {route:?}", self.path.display());

        let data = std::fs::read(self.path)?;
        let mat = match route {
            LoadRoute::Hdr => bitmap_to_mat(&decode_hdr(&data, self.limits, &stop)?),
            LoadRoute::Tga => bitmap_to_mat(&decode_tga(&data, self.limits, &stop)?),
            LoadRoute::RawBinary => decode_binary(&data, self.limits)?,
            LoadRoute::Generic => decode_generic(&data, self.limits, &stop)?,
        };
        debug!(
            "loaded {}: dims {:?}, {:?}",
            self.path.display(),
            mat.dims(),
            mat.mat_type()
        );
        Ok(mat)
    }
}

/// Load `path` with no limits and no cancellation.
///
/// Header dimensions are trusted up to the size of the file, so a small
/// file can still claim a very large image. For untrusted input use
/// [`LoadRequest::with_limits`].
pub fn load_image(path: impl AsRef<Path>) -> Result<Mat<'static>, MatError> {
    LoadRequest::new(path.as_ref()).load(Unstoppable)
}
