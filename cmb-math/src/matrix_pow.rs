//! Square roots of positive semi-definite matrices using nalgebra
//!
//! Drawing a correlated Gaussian vector with covariance `C` needs a matrix
//! `S` with `S Sᵀ = C`. Covariance slices are routinely singular (zeroed
//! monopoles, identical arrays), so the root is taken from the symmetric
//! eigendecomposition and must tolerate zero eigenvalues.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array2, ArrayView2};
use thiserror::Error;

/// Errors from matrix power evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixPowError {
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("non-finite matrix entry at ({row}, {col})")]
    NonFinite { row: usize, col: usize },
}

fn to_nalgebra(matrix: &ArrayView2<f64>) -> Result<DMatrix<f64>, MatrixPowError> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(MatrixPowError::NotSquare { rows, cols });
    }
    if let Some(((row, col), _)) = matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(MatrixPowError::NonFinite { row, col });
    }

    Ok(DMatrix::from_fn(rows, cols, |i, j| matrix[[i, j]]))
}

/// Symmetric square root of a positive semi-definite matrix
///
/// Computes `Q diag(sqrt(max(λ, 0))) Qᵀ` from the symmetric eigendecomposition
/// `C = Q diag(λ) Qᵀ`. Negative eigenvalues (round-off, or slightly
/// inconsistent measured cross spectra) are clipped to zero.
///
/// # Arguments
/// * `matrix` - Symmetric matrix; only its symmetric part is meaningful
///
/// # Returns
/// * `Ok(Array2<f64>)` - `S` with `S S = C` on the non-negative eigenspace
/// * `Err(MatrixPowError)` - If the matrix is not square or has NaN/inf entries
pub fn psd_sqrt(matrix: &ArrayView2<f64>) -> Result<Array2<f64>, MatrixPowError> {
    let n = matrix.nrows();
    let na_matrix = to_nalgebra(matrix)?;
    if n == 0 {
        return Ok(Array2::zeros((0, 0)));
    }

    let eigen = SymmetricEigen::new(na_matrix);
    let roots = eigen.eigenvalues.map(|v| v.max(0.0).sqrt());
    let q = &eigen.eigenvectors;
    let root = q * DMatrix::from_diagonal(&roots) * q.transpose();

    Ok(Array2::from_shape_fn((n, n), |(i, j)| root[(i, j)]))
}

/// Smallest eigenvalue of a symmetric matrix
///
/// Used to flag covariance slices that are not positive semi-definite.
/// Returns `None` for an empty matrix.
pub fn min_eigenvalue(matrix: &ArrayView2<f64>) -> Result<Option<f64>, MatrixPowError> {
    let na_matrix = to_nalgebra(matrix)?;
    if na_matrix.nrows() == 0 {
        return Ok(None);
    }

    let eigen = SymmetricEigen::new(na_matrix);
    Ok(eigen.eigenvalues.iter().copied().reduce(f64::min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, StandardNormal};

    fn assert_matrix_eq(a: &Array2<f64>, b: &Array2<f64>, epsilon: f64) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(*x, *y, epsilon = epsilon);
        }
    }

    #[test]
    fn test_sqrt_of_diagonal() {
        let m = array![[4.0, 0.0], [0.0, 9.0]];
        let root = psd_sqrt(&m.view()).unwrap();
        assert_matrix_eq(&root, &array![[2.0, 0.0], [0.0, 3.0]], 1e-12);
    }

    #[test]
    fn test_sqrt_squares_back_to_input() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = Array2::<f64>::from_shape_fn((4, 4), |_| StandardNormal.sample(&mut rng));
        let cov = a.dot(&a.t());

        let root = psd_sqrt(&cov.view()).unwrap();

        assert_matrix_eq(&root.dot(&root), &cov, 1e-9);
        assert_matrix_eq(&root, &root.t().to_owned(), 1e-12);
    }

    #[test]
    fn test_singular_matrix_is_accepted() {
        // Two perfectly correlated arrays: rank one
        let m = array![[1.0, 1.0], [1.0, 1.0]];
        let root = psd_sqrt(&m.view()).unwrap();
        assert_matrix_eq(&root.dot(&root), &m, 1e-12);
    }

    #[test]
    fn test_negative_eigenvalues_are_clipped() {
        // Eigenvalues 3 and -1
        let m = array![[1.0, 2.0], [2.0, 1.0]];
        let root = psd_sqrt(&m.view()).unwrap();
        let squared = root.dot(&root);

        // Projection onto the positive eigenvector (1, 1)/sqrt(2) with eigenvalue 3
        assert_matrix_eq(&squared, &array![[1.5, 1.5], [1.5, 1.5]], 1e-12);
    }

    #[test]
    fn test_zero_matrix_has_zero_root() {
        let m = Array2::<f64>::zeros((3, 3));
        let root = psd_sqrt(&m.view()).unwrap();
        assert!(root.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_errors() {
        let rect = Array2::<f64>::zeros((2, 3));
        assert_eq!(
            psd_sqrt(&rect.view()),
            Err(MatrixPowError::NotSquare { rows: 2, cols: 3 })
        );

        let nan = array![[1.0, f64::NAN], [f64::NAN, 1.0]];
        assert_eq!(
            psd_sqrt(&nan.view()),
            Err(MatrixPowError::NonFinite { row: 0, col: 1 })
        );
    }

    #[test]
    fn test_min_eigenvalue() {
        let m = array![[1.0, 2.0], [2.0, 1.0]];
        let smallest = min_eigenvalue(&m.view()).unwrap().unwrap();
        assert_relative_eq!(smallest, -1.0, epsilon = 1e-12);

        let empty = Array2::<f64>::zeros((0, 0));
        assert_eq!(min_eigenvalue(&empty.view()).unwrap(), None);
    }
}
