//! Floating-point width of generated harmonic coefficients

use ndarray::Array2;
use num_complex::Complex;
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Harmonic coefficients of several arrays, shape `[n_arrays, n_alm]`
pub type Alm<T = f64> = Array2<Complex<T>>;

/// Real type of generated coefficients
///
/// Sampling always runs in `f64`; values are narrowed once when stored.
pub trait AlmPrecision: Float + Debug + Send + Sync + 'static {
    fn from_sample(value: f64) -> Self;

    fn widen(self) -> f64;
}

impl AlmPrecision for f32 {
    fn from_sample(value: f64) -> Self {
        value as f32
    }

    fn widen(self) -> f64 {
        self as f64
    }
}

impl AlmPrecision for f64 {
    fn from_sample(value: f64) -> Self {
        value
    }

    fn widen(self) -> f64 {
        self
    }
}

/// Runtime choice of coefficient width, for configuration files and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Complex single precision (`Complex<f32>`)
    Single,
    /// Complex double precision (`Complex<f64>`)
    #[default]
    Double,
}
