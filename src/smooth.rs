//! Top/bottom edge smoothing.

use alloc::vec;
use alloc::vec::Vec;

use crate::element::{Element, Pixel};
use crate::error::MatError;
use crate::mat::Mat;

/// Blend every column so its top and bottom values meet the mean of the
/// top and bottom rows.
///
/// For column `i`, `diff_top = mean(row 0) - m[0][i]` and
/// `diff_bottom = mean(row n-1) - m[n-1][i]`; row `j` then moves by
/// `(1 - r) * diff_top + r * diff_bottom` with `r = j / (n - 1)`.
///
/// Means are accumulated per channel in `f64` starting from an explicit
/// zero, so `P` needs no zero-valued default. Integer channels round and
/// saturate when written back.
///
/// The matrix must be 2-D with type `P::MAT_TYPE`, at least two rows and
/// one column. Borrowed data is copied first.
pub fn uniform_horizontal_edges<P: Pixel>(mat: &mut Mat<'_>) -> Result<(), MatError> {
    mat.check_pixel::<P>()?;
    if mat.dims().len() != 2 || mat.rows() < 2 || mat.cols() == 0 {
        return Err(MatError::InvalidData(alloc::format!(
            "edge smoothing needs a 2-D matrix with at least 2 rows and 1 column, got {:?}",
            mat.dims()
        )));
    }

    let rows = mat.rows();
    let channels = P::CHANNELS;
    let elem = mat.elem_size();

    let top: Vec<[f64; 4]> = read_row::<P>(mat.row(0), channels);
    let bottom: Vec<[f64; 4]> = read_row::<P>(mat.row(rows - 1), channels);
    let top_mean = column_mean(&top, channels);
    let bottom_mean = column_mean(&bottom, channels);

    let last = (rows - 1) as f64;
    for j in 0..rows {
        let ratio = j as f64 / last;
        let row = mat.row_mut(j);
        for (i, px_bytes) in row.chunks_exact_mut(elem).enumerate() {
            let px = P::read(px_bytes);
            let blended = P::from_fn(|c| {
                let diff_top = top_mean[c] - top[i][c];
                let diff_bottom = bottom_mean[c] - bottom[i][c];
                let v = px.channel(c).to_f64() + (1.0 - ratio) * diff_top + ratio * diff_bottom;
                P::Elem::from_f64(v)
            });
            blended.write(px_bytes);
        }
    }
    Ok(())
}

fn read_row<P: Pixel>(row: &[u8], channels: usize) -> Vec<[f64; 4]> {
    row.chunks_exact(P::MAT_TYPE.elem_size())
        .map(|bytes| {
            let px = P::read(bytes);
            let mut out = [0.0f64; 4];
            for (c, v) in out.iter_mut().enumerate().take(channels) {
                *v = px.channel(c).to_f64();
            }
            out
        })
        .collect()
}

fn column_mean(values: &[[f64; 4]], channels: usize) -> Vec<f64> {
    let mut acc = vec![0.0f64; channels];
    for v in values {
        for (a, x) in acc.iter_mut().zip(v) {
            *a += x;
        }
    }
    let n = values.len() as f64;
    acc.iter_mut().for_each(|a| *a /= n);
    acc
}
