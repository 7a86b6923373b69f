//! Noise covariance from measured per-array-pair noise spectra
//!
//! `nl_t[i, j, l]` holds the temperature noise between arrays `i` and `j`
//! and `nl_pol[i, j, l]` the polarization noise (mean of EE and BB), so that
//! noise correlated between arrays is reproduced by the realizations.

use log::info;
use ndarray::{s, Array1, Array3};
use rayon::prelude::*;
use std::path::Path;

use super::{
    rescale_from, unordered_pairs, validate_labels, validate_lmax, warn_if_not_psd,
    CovarianceError, CovarianceTensor, FIRST_MULTIPOLE,
};
use crate::io::{noise_spectra_path, read_spectra, NOISE_SPECTRA};

/// Temperature and polarization noise covariance of a set of arrays
#[derive(Debug, Clone)]
pub struct NoiseMatrices {
    /// Multipole axis `0..lmax`
    pub ells: Array1<f64>,
    pub temperature: CovarianceTensor,
    pub polarization: CovarianceTensor,
}

/// Rescaled spectra of one array pair on `FIRST_MULTIPOLE..lmax`
struct PairNoise {
    i: usize,
    j: usize,
    temperature: Array1<f64>,
    polarization: Array1<f64>,
}

fn read_pair_noise(
    noise_dir: &Path,
    survey: &str,
    arrays: &[String],
    (i, j): (usize, usize),
    lmax: usize,
    nsplits: usize,
) -> Result<PairNoise, CovarianceError> {
    let path = noise_spectra_path(noise_dir, &arrays[i], &arrays[j], survey);
    let spectra = read_spectra(&path, &NOISE_SPECTRA)?;

    let mut temperature = spectra.on_range("TT", FIRST_MULTIPOLE, lmax)?;
    let ee = spectra.on_range("EE", FIRST_MULTIPOLE, lmax)?;
    let bb = spectra.on_range("BB", FIRST_MULTIPOLE, lmax)?;
    let mut polarization = (ee + bb) / 2.0;

    // Per-split noise is nsplits times the noise of the coadd
    let scale = nsplits as f64;
    rescale_from(&mut temperature, scale);
    rescale_from(&mut polarization, scale);

    Ok(PairNoise {
        i,
        j,
        temperature,
        polarization,
    })
}

/// Build the noise covariance tensors of a survey from its noise spectra files
///
/// Reads `{noise_dir}/mean_{ar_i}x{ar_j}_{survey}_noise.dat` for every pair
/// `i <= j` of `arrays`. Each entry is the file's `TT` (temperature) or
/// `(EE + BB) / 2` (polarization) spectrum converted from `l(l+1)N_l/2π` to
/// `N_l` and multiplied by `nsplits`.
///
/// # Arguments
/// * `noise_dir` - Directory holding the noise spectra files
/// * `survey` - Survey identifier used in the file names
/// * `arrays` - Array names, in tensor index order
/// * `lmax` - Length of the multipole axis (exclusive bound)
/// * `nsplits` - Number of data splits the noise is simulated for
///
/// # Returns
/// * `Ok(NoiseMatrices)` - Tensors of shape `[n_arrays, n_arrays, lmax]`
/// * `Err(CovarianceError)` - If any file is missing or malformed, or the
///   arguments are invalid
pub fn assemble_noise_matrices(
    noise_dir: &Path,
    survey: &str,
    arrays: &[String],
    lmax: usize,
    nsplits: usize,
) -> Result<NoiseMatrices, CovarianceError> {
    validate_labels(arrays)?;
    validate_lmax(lmax)?;
    if nsplits == 0 {
        return Err(CovarianceError::NoSplits);
    }

    let n = arrays.len();
    let pairs = unordered_pairs(n)
        .into_par_iter()
        .map(|pair| read_pair_noise(noise_dir, survey, arrays, pair, lmax, nsplits))
        .collect::<Result<Vec<_>, _>>()?;

    let mut nl_t = Array3::<f64>::zeros((n, n, lmax));
    let mut nl_pol = Array3::<f64>::zeros((n, n, lmax));
    for pair in pairs {
        nl_t.slice_mut(s![pair.i, pair.j, FIRST_MULTIPOLE..])
            .assign(&pair.temperature);
        nl_pol
            .slice_mut(s![pair.i, pair.j, FIRST_MULTIPOLE..])
            .assign(&pair.polarization);
    }

    let temperature = CovarianceTensor::from_upper_triangle(arrays.to_vec(), nl_t)?;
    let polarization = CovarianceTensor::from_upper_triangle(arrays.to_vec(), nl_pol)?;
    warn_if_not_psd("temperature noise", &temperature)?;
    warn_if_not_psd("polarization noise", &polarization)?;

    info!("Assembled noise covariance for {n} arrays of {survey} (lmax {lmax}, {nsplits} splits)");

    Ok(NoiseMatrices {
        ells: super::multipole_axis(lmax),
        temperature,
        polarization,
    })
}
