//! Correlated Gaussian harmonic realizations of a covariance tensor
//!
//! For every multipole `l` the covariance slice `C_l` (arrays x arrays) is
//! factored as `S_l = C_l^{1/2}`. Each coefficient vector is then
//! `a_lm = S_l g_lm` with white noise `g_lm`:
//!
//! - `m = 0`: `g` real, `g ~ N(0, 1)`
//! - `m > 0`: `g = (x + i y) / √2`, `x, y ~ N(0, 1)`
//!
//! so that `<a_lm a_lm^†> = C_l` for every `m`, as for an isotropic random
//! field whose cross-power spectrum is `C_l`.

use cmb_math::{psd_sqrt, AlmLayout};
use ndarray::Array2;
use num_complex::{Complex, Complex64};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use std::f64::consts::FRAC_1_SQRT_2;

use super::{Alm, AlmError, AlmPrecision};
use crate::covariance::CovarianceTensor;

/// Square roots of every multipole slice of a covariance tensor, ready to draw
///
/// Building the sampler is the expensive part; drawing is a matrix-vector
/// product per coefficient. Multipoles at or beyond the tensor's axis, and
/// slices that are identically zero, produce zero coefficients.
#[derive(Debug, Clone)]
pub struct HarmonicSampler {
    layout: AlmLayout,
    n_arrays: usize,
    /// `roots[l]` is `None` where the slice carries no power
    roots: Vec<Option<Array2<f64>>>,
}

impl HarmonicSampler {
    /// Factor `covariance` for draws truncated at `lmax` (inclusive)
    pub fn new(covariance: &CovarianceTensor, lmax: usize) -> Result<Self, AlmError> {
        let roots = (0..=lmax)
            .into_par_iter()
            .map(|ell| {
                if ell >= covariance.n_ell() {
                    return Ok(None);
                }
                let slice = covariance.slice(ell);
                if slice.iter().all(|&v| v == 0.0) {
                    return Ok(None);
                }
                psd_sqrt(&slice)
                    .map(Some)
                    .map_err(|source| AlmError::CovarianceRoot { ell, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            layout: AlmLayout::new(lmax),
            n_arrays: covariance.n_arrays(),
            roots,
        })
    }

    pub fn layout(&self) -> AlmLayout {
        self.layout
    }

    pub fn n_arrays(&self) -> usize {
        self.n_arrays
    }

    /// Draw one realization, shape `[n_arrays, n_alm]`
    ///
    /// The same number of normal deviates is consumed whatever the
    /// covariance, so a seeded generator yields the same white noise for
    /// different tensors of equal shape.
    pub fn draw<T, R>(&self, rng: &mut R) -> Alm<T>
    where
        T: AlmPrecision,
        R: Rng + ?Sized,
    {
        let n = self.n_arrays;
        let mut alm = Alm::<T>::zeros((n, self.layout.n_alm()));
        let mut white = vec![Complex64::new(0.0, 0.0); n];

        for (l, m, idx) in self.layout.iter() {
            for w in white.iter_mut() {
                let re: f64 = StandardNormal.sample(rng);
                *w = if m == 0 {
                    Complex64::new(re, 0.0)
                } else {
                    let im: f64 = StandardNormal.sample(rng);
                    Complex64::new(re, im) * FRAC_1_SQRT_2
                };
            }

            let Some(root) = &self.roots[l] else {
                continue;
            };
            for a in 0..n {
                let value: Complex64 = white
                    .iter()
                    .enumerate()
                    .map(|(b, g)| *g * root[[a, b]])
                    .sum();
                alm[[a, idx]] = Complex::new(T::from_sample(value.re), T::from_sample(value.im));
            }
        }

        alm
    }
}

/// Draw one correlated realization of `covariance` truncated at `lmax`
///
/// Convenience wrapper building a [`HarmonicSampler`] for a single draw.
pub fn rand_alm<T, R>(
    rng: &mut R,
    covariance: &CovarianceTensor,
    lmax: usize,
) -> Result<Alm<T>, AlmError>
where
    T: AlmPrecision,
    R: Rng + ?Sized,
{
    Ok(HarmonicSampler::new(covariance, lmax)?.draw(rng))
}
