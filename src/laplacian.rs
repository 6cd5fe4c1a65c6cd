//! Signed graph Laplacian.
//!
//! For a signed adjacency matrix A, the signed Laplacian is L = D - A where
//! D is the absolute-degree matrix: D\[i,i\] counts the nonzero entries of
//! row i of A, regardless of sign.
//!
//! The degree here counts *all* row entries including the diagonal. Part of
//! the literature sums over non-diagonal entries only, but earlier sources
//! (e.g. Chiang et al., CIKM 2012) define the absolute degree matrix this
//! way, it is more consistent with the usual graph Laplacian, and diagonal
//! entries are self-relationships so the difference is empirically
//! immaterial.
//!
//! L is symmetric whenever A is, and is expected to be positive
//! semidefinite; clustering quality depends on this. The PSD property is
//! not re-verified at runtime except via [`check_positive_semidefinite`]
//! in the pipeline's diagnostic test mode.

use faer::prelude::*;
use faer::Side;

use crate::error::{Error, Result};
use crate::matrix::SparseMatrix;

/// Diagonal ridge added before the Cholesky PSD check.
///
/// A perfectly balanced signed network has a singular Laplacian (zero
/// eigenvalue), which a plain LLT factorization rejects even though the
/// matrix is semidefinite. PSD of L is equivalent to positive definiteness
/// of L + eps*I for eps > 0, so the check factors the ridged matrix.
const PSD_RIDGE: f64 = 1e-9;

/// Compute the signed Laplacian L = D - A of a sparse signed matrix.
pub fn signed_laplacian(adj: &SparseMatrix) -> Result<SparseMatrix> {
    if !adj.is_square() {
        return Err(Error::NotSquare {
            rows: adj.n_rows(),
            cols: adj.n_cols(),
        });
    }
    let n = adj.n_rows();

    // Diagonal degrees plus negated adjacency entries; from_triplets sums
    // the diagonal overlap, so L[i,i] = deg(i) - A[i,i] as required.
    let degrees = (0..n).map(|i| (i, i, adj.row_nnz(i) as f64));
    let negated = adj.iter().map(|(i, j, v)| (i, j, -v));
    SparseMatrix::from_triplets(n, n, degrees.chain(negated))
}

/// Verify that a matrix is positive semidefinite via dense Cholesky.
///
/// Returns [`Error::NotPositiveSemidefinite`] when factorization fails.
/// Used by the pipeline's test mode to validate the signed Laplacian.
pub fn check_positive_semidefinite(matrix: &SparseMatrix) -> Result<()> {
    if !matrix.is_square() {
        return Err(Error::NotSquare {
            rows: matrix.n_rows(),
            cols: matrix.n_cols(),
        });
    }
    let n = matrix.n_rows();
    let mut dense = matrix.to_faer();
    for i in 0..n {
        dense[(i, i)] += PSD_RIDGE;
    }
    match dense.cholesky(Side::Lower) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::NotPositiveSemidefinite),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_laplacian_elementwise() {
        // Two positive edges, one negative, no self-edges.
        let adj = SparseMatrix::from_dense(&array![
            [0.0, 1.0, -1.0],
            [1.0, 0.0, 1.0],
            [-1.0, 1.0, 0.0],
        ]);
        let lap = signed_laplacian(&adj).unwrap();

        // L = D - A with D[i,i] = row nonzero count.
        let expected = array![[2.0, -1.0, 1.0], [-1.0, 2.0, -1.0], [1.0, -1.0, 2.0]];
        assert_eq!(lap.to_ndarray(), expected);
    }

    #[test]
    fn test_laplacian_diagonal_counted_in_degree() {
        // A self-edge contributes to the degree and is subtracted back on
        // the diagonal: L[0,0] = 2 - 1 = 1.
        let adj = SparseMatrix::from_dense(&array![[1.0, 1.0], [1.0, 0.0]]);
        let lap = signed_laplacian(&adj).unwrap();
        assert_eq!(lap.get(0, 0), 1.0);
        assert_eq!(lap.get(1, 1), 1.0);
        assert_eq!(lap.get(0, 1), -1.0);
    }

    #[test]
    fn test_laplacian_symmetric_for_symmetric_input() {
        let adj = SparseMatrix::from_dense(&array![
            [0.0, 1.0, 0.0, -1.0],
            [1.0, 0.0, -1.0, 0.0],
            [0.0, -1.0, 0.0, 1.0],
            [-1.0, 0.0, 1.0, 0.0],
        ]);
        assert!(adj.is_symmetric());
        let lap = signed_laplacian(&adj).unwrap();
        assert!(lap.is_symmetric());
    }

    #[test]
    fn test_laplacian_not_square() {
        let adj = SparseMatrix::from_triplets(2, 3, vec![(0, 2, 1.0)]).unwrap();
        assert!(matches!(
            signed_laplacian(&adj),
            Err(Error::NotSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn test_psd_check_accepts_laplacian() {
        let adj = SparseMatrix::from_dense(&array![
            [0.0, 1.0, -1.0],
            [1.0, 0.0, 1.0],
            [-1.0, 1.0, 0.0],
        ]);
        let lap = signed_laplacian(&adj).unwrap();
        assert!(check_positive_semidefinite(&lap).is_ok());
    }

    #[test]
    fn test_psd_check_accepts_singular_balanced_laplacian() {
        // Balanced two-cluster network: the signed Laplacian has a zero
        // eigenvalue but is still semidefinite and must pass.
        let adj = SparseMatrix::from_dense(&array![
            [0.0, 1.0, -1.0, -1.0],
            [1.0, 0.0, -1.0, -1.0],
            [-1.0, -1.0, 0.0, 1.0],
            [-1.0, -1.0, 1.0, 0.0],
        ]);
        let lap = signed_laplacian(&adj).unwrap();
        assert!(check_positive_semidefinite(&lap).is_ok());
    }

    #[test]
    fn test_psd_check_rejects_indefinite() {
        let m = SparseMatrix::from_dense(&array![[1.0, 0.0], [0.0, -1.0]]);
        assert_eq!(
            check_positive_semidefinite(&m),
            Err(Error::NotPositiveSemidefinite)
        );
    }
}
