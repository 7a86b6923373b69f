//! Noise and foreground covariance tensors for multi-array surveys
//!
//! Both assemblers read one tabulated spectrum file per unordered pair of
//! arrays (or frequencies), convert the `l(l+1)/2π`-normalized power of the
//! file into a per-multipole density, and symmetrize the result:
//!
//! - **noise**: temperature and polarization tensors from measured noise
//!   spectra, scaled by the number of splits
//! - **foreground**: temperature-only tensor from best-fit foreground spectra
//!
//! The monopole and dipole are not part of either model. Slices `l = 0` and
//! `l = 1` are always zero, which also keeps the `2π / (l(l+1))` conversion
//! away from its singularity at `l = 0`.

pub mod foreground;
pub mod noise;
mod tensor;

pub use foreground::{assemble_foreground_matrix, ForegroundMatrix};
pub use noise::{assemble_noise_matrices, NoiseMatrices};
pub use tensor::CovarianceTensor;

use cmb_math::{MatrixPowError, SymmetricError};
use log::warn;
use ndarray::{Array1, Zip};
use std::collections::HashSet;
use std::f64::consts::PI;
use thiserror::Error;

use crate::io::SpectraError;

/// First multipole carried by assembled tensors
pub const FIRST_MULTIPOLE: usize = 2;

/// Smallest `lmax` giving at least one non-zero multipole
pub const MIN_LMAX: usize = FIRST_MULTIPOLE + 1;

/// Relative eigenvalue tolerance used when checking assembled tensors
const PSD_TOLERANCE: f64 = 1e-10;

/// Errors that can occur while assembling covariance tensors
#[derive(Error, Debug)]
pub enum CovarianceError {
    #[error(transparent)]
    Spectra(#[from] SpectraError),
    #[error("lmax {0} leaves no multipoles above the dipole (need lmax >= 3)")]
    InvalidLmax(usize),
    #[error("nsplits must be at least 1")]
    NoSplits,
    #[error("no arrays given")]
    NoArrays,
    #[error("array '{0}' is listed more than once")]
    DuplicateArray(String),
    #[error("tensor shape {rows}x{cols}x{n_ell} does not match {labels} labels")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        n_ell: usize,
        labels: usize,
    },
    #[error(transparent)]
    Symmetric(#[from] SymmetricError),
    #[error(transparent)]
    MatrixPow(#[from] MatrixPowError),
}

/// Multipole axis `0, 1, ..., lmax - 1`
pub fn multipole_axis(lmax: usize) -> Array1<f64> {
    Array1::from_iter((0..lmax).map(|ell| ell as f64))
}

/// Factor converting `l(l+1) C_l / 2π` to `C_l`
///
/// # Panics
/// At `ell = 0`, where the conversion is undefined
pub fn dl_to_cl(ell: usize) -> f64 {
    assert!(ell > 0, "dl_to_cl is undefined at the monopole");
    let l = ell as f64;
    2.0 * PI / (l * (l + 1.0))
}

/// Multiply values starting at [`FIRST_MULTIPOLE`] by `scale * dl_to_cl(l)`
fn rescale_from(values: &mut Array1<f64>, scale: f64) {
    Zip::indexed(values).for_each(|k, v| *v *= scale * dl_to_cl(FIRST_MULTIPOLE + k));
}

/// Unordered pairs `(i, j)` with `i <= j`
pub(crate) fn unordered_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n).flat_map(|i| (i..n).map(move |j| (i, j))).collect()
}

fn validate_labels(labels: &[String]) -> Result<(), CovarianceError> {
    if labels.is_empty() {
        return Err(CovarianceError::NoArrays);
    }
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(CovarianceError::DuplicateArray(label.clone()));
        }
    }
    Ok(())
}

fn validate_lmax(lmax: usize) -> Result<(), CovarianceError> {
    if lmax < MIN_LMAX {
        return Err(CovarianceError::InvalidLmax(lmax));
    }
    Ok(())
}

/// Log multipoles where an assembled tensor is not a valid covariance
fn warn_if_not_psd(name: &str, tensor: &CovarianceTensor) -> Result<(), CovarianceError> {
    let bad = tensor.non_psd_multipoles(PSD_TOLERANCE)?;
    if let (Some(first), Some(last)) = (bad.first(), bad.last()) {
        warn!(
            "{name} covariance is not positive semi-definite at {} multipoles ({first}..={last}); \
             negative directions will be dropped when sampling",
            bad.len()
        );
    }
    Ok(())
}
