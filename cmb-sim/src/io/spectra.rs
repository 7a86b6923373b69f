//! Reader for tabulated 1-D power spectra
//!
//! Spectra files are whitespace separated text with one row per multipole:
//! a multipole column followed by one column per named spectrum. Lines
//! starting with `#` are comments. A comment line listing exactly the
//! expected spectrum names (optionally preceded by `l` or `ell`) fixes the
//! column order; without one the caller's order is assumed.
//!
//! Noise files follow `{noise_dir}/mean_{ar1}x{ar2}_{survey}_noise.dat` and
//! carry the nine spin-0/spin-2 spectra. Foreground files follow
//! `{fg_dir}/fg_{freq1}x{freq2}_TT.dat` and carry temperature only.

use log::debug;
use ndarray::Array1;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Column names of a spin-0 and spin-2 noise spectra file, in file order
pub const NOISE_SPECTRA: [&str; 9] = ["TT", "TE", "TB", "ET", "BT", "EE", "EB", "BE", "BB"];

/// Column names of a foreground spectrum file
pub const FOREGROUND_SPECTRA: [&str; 1] = ["TT"];

/// Errors that can occur while reading tabulated spectra
#[derive(Error, Debug)]
pub enum SpectraError {
    #[error("failed to read spectra file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: expected {expected} columns, found {found}")]
    ColumnCount {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("{path}:{line}: cannot parse '{token}' as a number")]
    NotNumeric {
        path: PathBuf,
        line: usize,
        token: String,
    },
    #[error("{path}:{line}: multipole {value} is not a non-negative integer")]
    InvalidMultipole {
        path: PathBuf,
        line: usize,
        value: f64,
    },
    #[error("{path}:{line}: multipole {ell} appears more than once")]
    DuplicateMultipole {
        path: PathBuf,
        line: usize,
        ell: usize,
    },
    #[error("{path}: no data rows")]
    Empty { path: PathBuf },
    #[error("{path}: missing multipole {ell} of spectrum {spectrum}")]
    MissingMultipole {
        path: PathBuf,
        spectrum: String,
        ell: usize,
    },
    #[error("{path}: no spectrum named {name}")]
    UnknownSpectrum { path: PathBuf, name: String },
}

/// Power spectra read from one tabulated file
#[derive(Debug, Clone)]
pub struct TabulatedSpectra {
    path: PathBuf,
    multipoles: Vec<usize>,
    columns: HashMap<String, Vec<f64>>,
    /// Multipole -> row index
    rows: BTreeMap<usize, usize>,
}

impl TabulatedSpectra {
    /// File the spectra were read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Multipole of every row, in file order
    pub fn multipoles(&self) -> &[usize] {
        &self.multipoles
    }

    /// Raw values of one named spectrum, in file order
    pub fn spectrum(&self, name: &str) -> Result<&[f64], SpectraError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SpectraError::UnknownSpectrum {
                path: self.path.clone(),
                name: name.to_string(),
            })
    }

    /// Values of one spectrum on the contiguous multipole range `lmin..lmax`
    ///
    /// Element `k` of the result holds the value at multipole `lmin + k`.
    /// Rows outside the range are ignored; every multipole inside it must be
    /// present in the file.
    pub fn on_range(
        &self,
        name: &str,
        lmin: usize,
        lmax: usize,
    ) -> Result<Array1<f64>, SpectraError> {
        let values = self.spectrum(name)?;

        (lmin..lmax)
            .map(|ell| {
                self.rows
                    .get(&ell)
                    .map(|&row| values[row])
                    .ok_or_else(|| SpectraError::MissingMultipole {
                        path: self.path.clone(),
                        spectrum: name.to_string(),
                        ell,
                    })
            })
            .collect::<Result<Vec<f64>, _>>()
            .map(Array1::from)
    }
}

/// Path of the mean noise spectra file for an array pair
pub fn noise_spectra_path(noise_dir: &Path, ar1: &str, ar2: &str, survey: &str) -> PathBuf {
    noise_dir.join(format!("mean_{ar1}x{ar2}_{survey}_noise.dat"))
}

/// Path of the best-fit foreground temperature spectrum for a frequency pair
pub fn foreground_spectrum_path(fg_dir: &Path, freq1: &str, freq2: &str) -> PathBuf {
    fg_dir.join(format!("fg_{freq1}x{freq2}_TT.dat"))
}

/// Read a tabulated spectra file
///
/// # Arguments
/// * `path` - File to read
/// * `names` - Spectrum names carried by the file, in default column order
///
/// # Returns
/// * `Ok(TabulatedSpectra)` - Multipoles and one column per name
/// * `Err(SpectraError)` - If the file is missing or malformed
pub fn read_spectra<P: AsRef<Path>>(
    path: P,
    names: &[&str],
) -> Result<TabulatedSpectra, SpectraError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SpectraError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let spectra = parse_spectra(&text, path, names)?;
    debug!(
        "Read {} multipoles ({}..={}) from {}",
        spectra.multipoles.len(),
        spectra.rows.keys().next().copied().unwrap_or_default(),
        spectra.rows.keys().next_back().copied().unwrap_or_default(),
        path.display()
    );
    Ok(spectra)
}

/// Column order declared by a header comment, if the comment is one
fn header_order(comment: &str, names: &[&str]) -> Option<Vec<usize>> {
    let mut tokens: Vec<&str> = comment.split_whitespace().collect();
    if matches!(tokens.first(), Some(&"l") | Some(&"ell")) {
        tokens.remove(0);
    }
    if tokens.len() != names.len() {
        return None;
    }

    // order[k] = column (after the multipole) holding names[k]
    names
        .iter()
        .map(|name| tokens.iter().position(|t| t == name))
        .collect()
}

/// Parse the text of a tabulated spectra file
///
/// `path` is only used for error messages.
pub fn parse_spectra(
    text: &str,
    path: &Path,
    names: &[&str],
) -> Result<TabulatedSpectra, SpectraError> {
    let expected = names.len() + 1;
    let mut order: Vec<usize> = (0..names.len()).collect();
    let mut seen_data = false;

    let mut multipoles = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    let mut rows = BTreeMap::new();

    for (line_idx, raw) in text.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if !seen_data {
                if let Some(header) = header_order(comment, names) {
                    order = header;
                }
            }
            continue;
        }
        seen_data = true;

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != expected {
            return Err(SpectraError::ColumnCount {
                path: path.to_path_buf(),
                line: line_no,
                expected,
                found: tokens.len(),
            });
        }

        let numbers = tokens
            .iter()
            .map(|token| {
                token.parse::<f64>().map_err(|_| SpectraError::NotNumeric {
                    path: path.to_path_buf(),
                    line: line_no,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let ell_value = numbers[0];
        if !ell_value.is_finite() || ell_value < 0.0 || ell_value.fract() != 0.0 {
            return Err(SpectraError::InvalidMultipole {
                path: path.to_path_buf(),
                line: line_no,
                value: ell_value,
            });
        }
        let ell = ell_value as usize;

        if rows.insert(ell, multipoles.len()).is_some() {
            return Err(SpectraError::DuplicateMultipole {
                path: path.to_path_buf(),
                line: line_no,
                ell,
            });
        }
        multipoles.push(ell);

        for (column, &source) in values.iter_mut().zip(order.iter()) {
            column.push(numbers[source + 1]);
        }
    }

    if multipoles.is_empty() {
        return Err(SpectraError::Empty {
            path: path.to_path_buf(),
        });
    }

    let columns = names
        .iter()
        .map(|name| name.to_string())
        .zip(values)
        .collect();

    Ok(TabulatedSpectra {
        path: path.to_path_buf(),
        multipoles,
        columns,
        rows,
    })
}
