//! Foreground covariance from best-fit per-frequency-pair foreground spectra
//!
//! Only temperature foregrounds are modelled. `fl[i, j, l]` holds the
//! foreground power between frequency channels `i` and `j`, which lets the
//! simulated foregrounds stay correlated across channels.

use log::info;
use ndarray::{s, Array1, Array3};
use rayon::prelude::*;
use std::path::Path;

use super::{
    rescale_from, unordered_pairs, validate_labels, validate_lmax, warn_if_not_psd,
    CovarianceError, CovarianceTensor, FIRST_MULTIPOLE,
};
use crate::io::{foreground_spectrum_path, read_spectra, FOREGROUND_SPECTRA};

/// Temperature foreground covariance of a set of frequency channels
#[derive(Debug, Clone)]
pub struct ForegroundMatrix {
    /// Multipole axis `0..lmax`
    pub ells: Array1<f64>,
    pub temperature: CovarianceTensor,
}

/// Build the temperature foreground covariance from best-fit spectra files
///
/// Reads `{fg_dir}/fg_{f_i}x{f_j}_TT.dat` for every pair `i <= j` of
/// `frequencies` and converts each spectrum from `l(l+1)C_l/2π` to `C_l`.
/// Multipoles 0 and 1 are zero whatever the files contain.
///
/// # Arguments
/// * `fg_dir` - Directory holding the foreground spectra files
/// * `frequencies` - Frequency channel names, in tensor index order
/// * `lmax` - Length of the multipole axis (exclusive bound)
pub fn assemble_foreground_matrix(
    fg_dir: &Path,
    frequencies: &[String],
    lmax: usize,
) -> Result<ForegroundMatrix, CovarianceError> {
    validate_labels(frequencies)?;
    validate_lmax(lmax)?;

    let n = frequencies.len();
    let pairs = unordered_pairs(n)
        .into_par_iter()
        .map(|(i, j)| -> Result<_, CovarianceError> {
            let path = foreground_spectrum_path(fg_dir, &frequencies[i], &frequencies[j]);
            let spectra = read_spectra(&path, &FOREGROUND_SPECTRA)?;
            let mut fl = spectra.on_range("TT", FIRST_MULTIPOLE, lmax)?;
            rescale_from(&mut fl, 1.0);
            Ok((i, j, fl))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut fl_array = Array3::<f64>::zeros((n, n, lmax));
    for (i, j, fl) in pairs {
        fl_array.slice_mut(s![i, j, FIRST_MULTIPOLE..]).assign(&fl);
    }

    let temperature = CovarianceTensor::from_upper_triangle(frequencies.to_vec(), fl_array)?;
    warn_if_not_psd("foreground", &temperature)?;

    info!("Assembled foreground covariance for {n} frequencies (lmax {lmax})");

    Ok(ForegroundMatrix {
        ells: super::multipole_axis(lmax),
        temperature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;
    use tempfile::TempDir;

    fn write_fg(dir: &Path, f1: &str, f2: &str, lmin: usize, lmax_file: usize, value: f64) {
        let text: String = (lmin..=lmax_file)
            .map(|ell| format!("{ell} {value}\n"))
            .collect();
        std::fs::write(foreground_spectrum_path(dir, f1, f2), text).unwrap();
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_low_multipoles_are_zero_even_if_file_has_them() {
        let temp_dir = TempDir::new().unwrap();
        write_fg(temp_dir.path(), "150", "150", 0, 30, 5.0);

        let fg = assemble_foreground_matrix(temp_dir.path(), &names(&["150"]), 20).unwrap();

        assert_eq!(fg.temperature.slice(0)[[0, 0]], 0.0);
        assert_eq!(fg.temperature.slice(1)[[0, 0]], 0.0);
        assert_relative_eq!(
            fg.temperature.slice(2)[[0, 0]],
            5.0 * PI / 3.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_values_land_on_their_multipole() {
        let temp_dir = TempDir::new().unwrap();
        let text: String = (2..=15).map(|ell| format!("{ell} {}\n", ell * 100)).collect();
        std::fs::write(foreground_spectrum_path(temp_dir.path(), "090", "090"), text).unwrap();

        let fg = assemble_foreground_matrix(temp_dir.path(), &names(&["090"]), 10).unwrap();

        for ell in 2..10 {
            let l = ell as f64;
            let expected = l * 100.0 * 2.0 * PI / (l * (l + 1.0));
            assert_relative_eq!(
                fg.temperature.slice(ell)[[0, 0]],
                expected,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_three_frequencies_symmetric() {
        let temp_dir = TempDir::new().unwrap();
        let freqs = ["090", "150", "220"];
        for (i, f1) in freqs.iter().enumerate() {
            for f2 in &freqs[i..] {
                write_fg(temp_dir.path(), f1, f2, 2, 12, 1.0 + i as f64);
            }
        }

        let fg = assemble_foreground_matrix(temp_dir.path(), &names(&freqs), 12).unwrap();

        assert_eq!(fg.temperature.data().dim(), (3, 3, 12));
        assert!(fg.temperature.is_symmetric(0.0));
        assert_eq!(fg.temperature.labels(), names(&freqs).as_slice());
        assert_eq!(fg.ells.len(), 12);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        write_fg(temp_dir.path(), "090", "090", 2, 12, 1.0);

        let result = assemble_foreground_matrix(temp_dir.path(), &names(&["090", "150"]), 12);
        assert!(matches!(result, Err(CovarianceError::Spectra(_))));
    }
}
