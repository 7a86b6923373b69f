//! cmb-math - Numerical primitives for CMB simulation inputs
//!
//! This crate provides the small linear-algebra and indexing building blocks
//! used when turning tabulated power spectra into covariance tensors and
//! random harmonic realizations:
//!
//! - **Symmetric** - Fill an upper-triangular matrix (or every multipole
//!   slice of a tensor) into a full symmetric matrix
//! - **Matrix power** - Square root of a positive semi-definite matrix
//! - **Alm layout** - Triangular m-major indexing of harmonic coefficients
//! - **Statistics** - NaN-tolerant median of power ratios
//!
//! # Example
//!
//! ```text
//! use cmb_math::{fill_symmetric, psd_sqrt};
//! use ndarray::array;
//!
//! let upper = array![[4.0, 1.0], [0.0, 9.0]];
//! let full = fill_symmetric(&upper.view())?;
//! let root = psd_sqrt(&full.view())?;
//! ```

pub mod alm_layout;
pub mod matrix_pow;
pub mod stats;
pub mod symmetric;

// Re-export commonly used types
pub use alm_layout::AlmLayout;
pub use matrix_pow::{min_eigenvalue, psd_sqrt, MatrixPowError};
pub use stats::{median, StatsError};
pub use symmetric::{fill_symmetric, fill_symmetric_slices, is_symmetric, SymmetricError};
