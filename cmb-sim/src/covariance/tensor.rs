//! Symmetric per-multipole covariance tensor

use cmb_math::{fill_symmetric_slices, is_symmetric, min_eigenvalue, MatrixPowError};
use ndarray::{s, Array3, ArrayView1, ArrayView2, Axis};

use super::CovarianceError;

/// Cross-array covariance `C[i, j, l]` for every multipole of an axis
///
/// The first two axes are indexed by the labels (array or frequency names)
/// in the order they were given. `C[i, j, l] == C[j, i, l]` holds for every
/// tensor built through [`CovarianceTensor::from_upper_triangle`].
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceTensor {
    labels: Vec<String>,
    data: Array3<f64>,
}

impl CovarianceTensor {
    /// Build a tensor from data whose `i <= j` entries are populated
    ///
    /// The lower triangle of every multipole slice is overwritten with the
    /// transpose of the upper triangle.
    pub fn from_upper_triangle(
        labels: Vec<String>,
        mut data: Array3<f64>,
    ) -> Result<Self, CovarianceError> {
        let (rows, cols, n_ell) = data.dim();
        if rows != labels.len() || cols != labels.len() {
            return Err(CovarianceError::ShapeMismatch {
                rows,
                cols,
                n_ell,
                labels: labels.len(),
            });
        }

        fill_symmetric_slices(&mut data)?;
        Ok(Self { labels, data })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_arrays(&self) -> usize {
        self.labels.len()
    }

    /// Length of the multipole axis
    pub fn n_ell(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Index of a label on the first two axes
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Covariance matrix between arrays at multipole `ell`
    ///
    /// # Panics
    /// If `ell >= n_ell()`
    pub fn slice(&self, ell: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(2), ell)
    }

    /// Cross spectrum between arrays `i` and `j` over the multipole axis
    pub fn spectrum(&self, i: usize, j: usize) -> ArrayView1<'_, f64> {
        self.data.slice(s![i, j, ..])
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn into_inner(self) -> Array3<f64> {
        self.data
    }

    /// Whether every multipole slice is symmetric to within `tolerance`
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        self.data
            .axis_iter(Axis(2))
            .all(|slice| is_symmetric(&slice, tolerance))
    }

    /// Multipoles whose slice has an eigenvalue below `-tolerance * trace`
    ///
    /// Such slices are not valid covariances; realizations drawn from them
    /// silently drop the negative directions.
    pub fn non_psd_multipoles(&self, tolerance: f64) -> Result<Vec<usize>, MatrixPowError> {
        let mut bad = Vec::new();
        for (ell, slice) in self.data.axis_iter(Axis(2)).enumerate() {
            let trace = slice.diag().iter().map(|v| v.abs()).sum::<f64>();
            if let Some(smallest) = min_eigenvalue(&slice)? {
                if smallest < -tolerance * trace {
                    bad.push(ell);
                }
            }
        }
        Ok(bad)
    }
}
