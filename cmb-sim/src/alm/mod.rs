//! Random harmonic-space noise realizations
//!
//! This module turns covariance tensors into random alms:
//! - **sampler**: correlated Gaussian draw of one realization
//! - **generate**: per-split, per-component noise realization sets
//! - **power**: per-multipole power of realizations, for validation
//! - **precision**: output coefficient width

pub mod generate;
pub mod power;
pub mod precision;
pub mod sampler;

pub use generate::{
    generate_noise_alms, generate_noise_alms_seeded, Component, NoiseRealizations,
    PolarizedAlms, RealizationKey,
};
pub use power::{cross_power, empirical_spectra};
pub use precision::{Alm, AlmPrecision, Precision};
pub use sampler::{rand_alm, HarmonicSampler};

use cmb_math::MatrixPowError;
use thiserror::Error;

/// Errors that can occur while generating or analysing realizations
#[derive(Error, Debug)]
pub enum AlmError {
    #[error("ncomp = 3 requires a polarization covariance tensor")]
    MissingPolarization,
    #[error("unsupported component count {0} (expected 1 or 3)")]
    UnsupportedComponents(usize),
    #[error(
        "polarization covariance has {polarization} arrays but temperature covariance has {temperature}"
    )]
    ArrayCountMismatch {
        temperature: usize,
        polarization: usize,
    },
    #[error("alm has {found} coefficients but lmax {lmax} needs {expected}")]
    LayoutMismatch {
        lmax: usize,
        expected: usize,
        found: usize,
    },
    #[error("covariance at multipole {ell} has no square root: {source}")]
    CovarianceRoot {
        ell: usize,
        #[source]
        source: MatrixPowError,
    },
}
