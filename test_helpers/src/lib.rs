//! Test helpers for cmb-sim
//!
//! This crate writes spectra fixture files in the on-disk layout the
//! simulation reads, so tests can build complete noise and foreground
//! directories inside a temporary directory. The `stats` module holds the
//! normality and correlation checks used to validate random draws.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub mod stats;

pub use stats::{ks_critical_value, ks_test_normal, normal_cdf, pearson_correlation};

/// Column order of noise spectra files after the multipole
pub const NOISE_COLUMNS: [&str; 9] = ["TT", "TE", "TB", "ET", "BT", "EE", "EB", "BE", "BB"];

/// First multipole written to fixture files
pub const FIRST_FIXTURE_MULTIPOLE: usize = 2;

/// Error type for test helper operations
#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("Failed to write fixture {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn write_fixture(path: PathBuf, text: String) -> Result<PathBuf, TestHelperError> {
    std::fs::write(&path, text).map_err(|source| TestHelperError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Write `mean_{ar1}x{ar2}_{survey}_noise.dat` into `dir`
///
/// # Arguments
/// * `dir` - Directory to write into
/// * `ar1`, `ar2` - Array names of the pair
/// * `survey` - Survey tag of the file name
/// * `lmax_file` - Last multipole written (inclusive)
/// * `value` - `l(l+1)N_l/2π` of spectrum `name` at multipole `ell`
///
/// # Returns
/// * Ok(PathBuf) - Path of the written file
/// * Err(TestHelperError) - If the file could not be written
pub fn write_noise_spectra<F>(
    dir: &Path,
    ar1: &str,
    ar2: &str,
    survey: &str,
    lmax_file: usize,
    value: F,
) -> Result<PathBuf, TestHelperError>
where
    F: Fn(&str, usize) -> f64,
{
    let mut text = format!("# l {}\n", NOISE_COLUMNS.join(" "));
    for ell in FIRST_FIXTURE_MULTIPOLE..=lmax_file {
        let _ = write!(text, "{ell}");
        for name in NOISE_COLUMNS {
            let _ = write!(text, " {:.17e}", value(name, ell));
        }
        text.push('\n');
    }
    write_fixture(dir.join(format!("mean_{ar1}x{ar2}_{survey}_noise.dat")), text)
}

/// Write noise spectra files for every pair `i <= j` of `arrays`
///
/// `value(i, j, name, ell)` gives the spectrum of pair `(i, j)`.
pub fn write_survey_noise<F>(
    dir: &Path,
    survey: &str,
    arrays: &[&str],
    lmax_file: usize,
    value: F,
) -> Result<Vec<PathBuf>, TestHelperError>
where
    F: Fn(usize, usize, &str, usize) -> f64,
{
    let mut paths = Vec::new();
    for (i, ar1) in arrays.iter().enumerate() {
        for (j, ar2) in arrays.iter().enumerate().skip(i) {
            paths.push(write_noise_spectra(
                dir,
                ar1,
                ar2,
                survey,
                lmax_file,
                |name, ell| value(i, j, name, ell),
            )?);
        }
    }
    Ok(paths)
}

/// Write `fg_{freq1}x{freq2}_TT.dat` into `dir`
///
/// `value(ell)` is the `l(l+1)C_l/2π` of the foreground at `ell`.
pub fn write_foreground_spectrum<F>(
    dir: &Path,
    freq1: &str,
    freq2: &str,
    lmax_file: usize,
    value: F,
) -> Result<PathBuf, TestHelperError>
where
    F: Fn(usize) -> f64,
{
    let mut text = String::new();
    for ell in FIRST_FIXTURE_MULTIPOLE..=lmax_file {
        let _ = writeln!(text, "{ell} {:.17e}", value(ell));
    }
    write_fixture(dir.join(format!("fg_{freq1}x{freq2}_TT.dat")), text)
}

/// Convert `C_l` to the `l(l+1)C_l/2π` stored in fixture files
pub fn flat_cl_to_dl(cl: f64, ell: usize) -> f64 {
    let l = ell as f64;
    cl * l * (l + 1.0) / (2.0 * std::f64::consts::PI)
}
