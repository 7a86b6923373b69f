//! Symmetric fill of upper-triangular matrices
//!
//! Covariance tensors are assembled by computing only the `i <= j` entries of
//! each multipole slice. These helpers derive the lower triangle from the
//! upper one, leaving the diagonal untouched.

use ndarray::{Array2, Array3, ArrayView2, ArrayViewMut2, Axis};
use thiserror::Error;

/// Error when a matrix that must be square is not
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymmetricError {
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("tensor slices are not square: {rows}x{cols}x{depth}")]
    NotSquareSlices {
        rows: usize,
        cols: usize,
        depth: usize,
    },
}

/// Build the full symmetric matrix from the upper triangle of `upper`
///
/// Entries below the diagonal of the input are ignored.
///
/// # Arguments
/// * `upper` - Square matrix with the `i <= j` entries populated
///
/// # Returns
/// * `Ok(Array2<f64>)` - Matrix with `out[i, j] == out[j, i] == upper[min, max]`
/// * `Err(SymmetricError)` - If the input is not square
pub fn fill_symmetric(upper: &ArrayView2<f64>) -> Result<Array2<f64>, SymmetricError> {
    let (rows, cols) = upper.dim();
    if rows != cols {
        return Err(SymmetricError::NotSquare { rows, cols });
    }

    Ok(Array2::from_shape_fn((rows, cols), |(i, j)| {
        if i <= j {
            upper[[i, j]]
        } else {
            upper[[j, i]]
        }
    }))
}

/// Mirror the upper triangle of a square view into its lower triangle in place
fn mirror_upper_in_place(matrix: &mut ArrayViewMut2<f64>) {
    let n = matrix.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            matrix[[j, i]] = matrix[[i, j]];
        }
    }
}

/// Symmetrize every multipole slice `tensor[:, :, l]` of a covariance tensor
///
/// Must run after all `i <= j` entries of every slice are populated.
pub fn fill_symmetric_slices(tensor: &mut Array3<f64>) -> Result<(), SymmetricError> {
    let (rows, cols, depth) = tensor.dim();
    if rows != cols {
        return Err(SymmetricError::NotSquareSlices { rows, cols, depth });
    }

    for mut slice in tensor.axis_iter_mut(Axis(2)) {
        mirror_upper_in_place(&mut slice);
    }
    Ok(())
}

/// Check `matrix[i, j] == matrix[j, i]` to within `tolerance`
///
/// Non-square matrices are never symmetric.
pub fn is_symmetric(matrix: &ArrayView2<f64>, tolerance: f64) -> bool {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return false;
    }

    (0..rows).all(|i| {
        ((i + 1)..cols).all(|j| (matrix[[i, j]] - matrix[[j, i]]).abs() <= tolerance)
    })
}
