//! Per-realization power summaries
//!
//! Compares the empirical auto-power of every array in a realization with
//! the diagonal of the covariance it was drawn from. A median ratio near one
//! means the realization carries the expected noise level.

use cmb_math::{median, AlmLayout, StatsError};
use serde::Serialize;
use thiserror::Error;

use crate::alm::{empirical_spectra, Alm, AlmError, AlmPrecision, Component, NoiseRealizations};
use crate::covariance::{CovarianceTensor, NoiseMatrices, FIRST_MULTIPOLE};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Alm(#[from] AlmError),
    #[error("no multipoles with expected power for array '{array}': {source}")]
    NoPower {
        array: String,
        #[source]
        source: StatsError,
    },
    #[error("realization has {alm} arrays but the covariance has {expected}")]
    ArrayCountMismatch { alm: usize, expected: usize },
}

/// Power summary of one array in one realization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealizationSummary {
    /// Realization key, e.g. `(E, 1)`
    pub key: String,
    pub array: String,
    /// Median over multipoles of empirical / expected auto-power
    pub median_power_ratio: f64,
    /// Number of multipoles entering the median
    pub multipoles: usize,
}

/// Summarize one realization against the covariance it was drawn from
///
/// Multipoles from `FIRST_MULTIPOLE` up to the smaller of the realization's
/// `lmax` and the last tensor multipole are compared. Multipoles where the
/// expected power is zero are skipped. The realization must carry one row
/// per tensor label.
pub fn summarize_alm<T: AlmPrecision>(
    key: &str,
    alm: &Alm<T>,
    expected: &CovarianceTensor,
    layout: &AlmLayout,
) -> Result<Vec<RealizationSummary>, ReportError> {
    if alm.nrows() != expected.n_arrays() {
        return Err(ReportError::ArrayCountMismatch {
            alm: alm.nrows(),
            expected: expected.n_arrays(),
        });
    }
    let spectra = empirical_spectra(alm, layout)?;
    let last = layout.lmax().min(expected.n_ell().saturating_sub(1));

    expected
        .labels()
        .iter()
        .enumerate()
        .map(|(i, array)| {
            let ratios: Vec<f64> = (FIRST_MULTIPOLE..=last)
                .filter_map(|ell| {
                    let power = expected.slice(ell)[[i, i]];
                    (power != 0.0).then_some(spectra[[i, i, ell]] / power)
                })
                .collect();
            let median_power_ratio = median(&ratios).map_err(|source| ReportError::NoPower {
                array: array.clone(),
                source,
            })?;
            Ok(RealizationSummary {
                key: key.to_string(),
                array: array.clone(),
                median_power_ratio,
                multipoles: ratios.len(),
            })
        })
        .collect()
}

/// Summarize every noise realization of a set
///
/// Temperature realizations are compared with the temperature noise, E and
/// B realizations with the polarization noise.
pub fn summarize_noise<T: AlmPrecision>(
    realizations: &NoiseRealizations<T>,
    noise: &NoiseMatrices,
    layout: &AlmLayout,
) -> Result<Vec<RealizationSummary>, ReportError> {
    let mut summaries = Vec::new();
    for (key, alm) in realizations.entries() {
        let expected = match key.component() {
            None | Some(Component::T) => &noise.temperature,
            Some(_) => &noise.polarization,
        };
        summaries.extend(summarize_alm(&key.to_string(), alm, expected, layout)?);
    }
    Ok(summaries)
}
