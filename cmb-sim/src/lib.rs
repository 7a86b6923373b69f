//! Noise simulation for multi-array CMB surveys
//!
//! This crate assembles per-multipole noise and foreground covariance
//! tensors from tabulated spectra and draws correlated random harmonic
//! coefficients (alms) from them, one realization per data split.

pub mod alm;
pub mod config;
pub mod covariance;
pub mod io;
pub mod report;
pub mod shared_args;

// Re-exports for easier access
pub use alm::{
    generate_noise_alms, generate_noise_alms_seeded, rand_alm, Alm, AlmError, Component,
    NoiseRealizations, Precision, RealizationKey,
};
pub use cmb_math::AlmLayout;
pub use config::{ConfigError, SimulationConfig};
pub use covariance::{
    assemble_foreground_matrix, assemble_noise_matrices, CovarianceError, CovarianceTensor,
    ForegroundMatrix, NoiseMatrices,
};
pub use io::{read_spectra, SpectraError, TabulatedSpectra};
pub use report::{summarize_alm, summarize_noise, RealizationSummary, ReportError};
