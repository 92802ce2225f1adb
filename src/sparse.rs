//! Sparse matrix utilities.
//!
//! Helpers for assembling the nalgebra-sparse matrices handed to Clarabel.

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Create a CSC matrix from triplets (row, col, value).
///
/// Duplicates are summed together; out-of-range entries are ignored.
pub fn csc_from_triplets(
    nrows: usize,
    ncols: usize,
    triplets: impl IntoIterator<Item = (usize, usize, f64)>,
) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(nrows, ncols);
    for (row, col, val) in triplets {
        if row < nrows && col < ncols {
            coo.push(row, col, val);
        }
    }
    CscMatrix::from(&coo)
}

/// Upper triangle of a dense square matrix in CSC format.
///
/// Clarabel reads the quadratic cost from the upper triangle only.
pub fn dense_upper_to_csc(dense: &DMatrix<f64>) -> CscMatrix<f64> {
    let n = dense.ncols();
    let triplets = (0..n).flat_map(|j| {
        (0..=j.min(dense.nrows().saturating_sub(1)))
            .map(move |i| (i, j, dense[(i, j)]))
            .filter(|(_, _, v)| v.abs() > 1e-15)
    });
    csc_from_triplets(dense.nrows(), n, triplets)
}
