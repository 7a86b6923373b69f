//! Empirical angular power of harmonic realizations
//!
//! `C_l = (Re(a_l0 b*_l0) + 2 Σ_{m>0} Re(a_lm b*_lm)) / (2l + 1)`, the
//! estimator whose expectation is the input covariance for realizations of
//! an isotropic field.

use cmb_math::AlmLayout;
use ndarray::{Array1, Array3, ArrayView1};
use num_complex::Complex;

use super::{Alm, AlmError, AlmPrecision};

fn check_layout(found: usize, layout: &AlmLayout) -> Result<(), AlmError> {
    if found != layout.n_alm() {
        return Err(AlmError::LayoutMismatch {
            lmax: layout.lmax(),
            expected: layout.n_alm(),
            found,
        });
    }
    Ok(())
}

/// Cross-power spectrum of two coefficient vectors, one value per `l` in `0..=lmax`
pub fn cross_power<T: AlmPrecision>(
    a: ArrayView1<Complex<T>>,
    b: ArrayView1<Complex<T>>,
    layout: &AlmLayout,
) -> Result<Array1<f64>, AlmError> {
    check_layout(a.len(), layout)?;
    check_layout(b.len(), layout)?;

    let mut cl = Array1::<f64>::zeros(layout.lmax() + 1);
    for (l, m, idx) in layout.iter() {
        let (x, y) = (a[idx], b[idx]);
        let re = x.re.widen() * y.re.widen() + x.im.widen() * y.im.widen();
        cl[l] += if m == 0 { re } else { 2.0 * re };
    }
    for (l, value) in cl.iter_mut().enumerate() {
        *value /= (2 * l + 1) as f64;
    }
    Ok(cl)
}

/// All auto- and cross-spectra of a realization, shape `[n_arrays, n_arrays, lmax + 1]`
pub fn empirical_spectra<T: AlmPrecision>(
    alm: &Alm<T>,
    layout: &AlmLayout,
) -> Result<Array3<f64>, AlmError> {
    let n = alm.nrows();
    check_layout(alm.ncols(), layout)?;

    let mut spectra = Array3::<f64>::zeros((n, n, layout.lmax() + 1));
    for i in 0..n {
        for j in i..n {
            let cl = cross_power(alm.row(i), alm.row(j), layout)?;
            spectra.slice_mut(ndarray::s![i, j, ..]).assign(&cl);
            if i != j {
                spectra.slice_mut(ndarray::s![j, i, ..]).assign(&cl);
            }
        }
    }
    Ok(spectra)
}
