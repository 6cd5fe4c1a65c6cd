//! Sparse matrices for signed networks.
//!
//! A signed adjacency matrix is square with entries in {-1, 0, +1}, where 0
//! means "no observed edge". At the scale of these experiments a plain CSR
//! layout is enough: rows are contiguous, columns sorted within each row,
//! explicit zeros never stored. The same type carries derived real-valued
//! matrices (signed Laplacian, completed sign matrices), so values are `f64`
//! rather than a sign enum.
//!
//! Dense bridges ([`SparseMatrix::to_faer`], [`SparseMatrix::to_ndarray`])
//! exist for the operations that intrinsically need dense form: the Cholesky
//! PSD check, the dense eigendecomposition fallback, and k-means input.

use faer::Mat;
use ndarray::Array2;

use crate::error::{Error, Result};

/// Square-or-rectangular sparse matrix in Compressed Sparse Row format.
///
/// Immutable after construction; build via [`SparseMatrix::from_triplets`]
/// or [`SparseMatrix::from_dense`].
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    n_rows: usize,
    n_cols: usize,
    /// Row i spans `col_idx[row_ptr[i]..row_ptr[i + 1]]`.
    row_ptr: Vec<usize>,
    /// Column indices, sorted within each row.
    col_idx: Vec<usize>,
    /// Nonzero values, parallel to `col_idx`.
    values: Vec<f64>,
}

impl SparseMatrix {
    /// Build from (row, col, value) triplets.
    ///
    /// Duplicate coordinates are summed; entries that are (or sum to) zero
    /// are dropped, so `nnz` counts genuinely nonzero entries.
    pub fn from_triplets(
        n_rows: usize,
        n_cols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self> {
        let mut entries: Vec<(usize, usize, f64)> = Vec::new();
        for (i, j, v) in triplets {
            if i >= n_rows || j >= n_cols {
                return Err(Error::DimensionMismatch {
                    expected: n_rows.max(n_cols),
                    found: i.max(j) + 1,
                });
            }
            entries.push((i, j, v));
        }
        entries.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut row_ptr = vec![0usize; n_rows + 1];
        let mut col_idx = Vec::with_capacity(entries.len());
        let mut values: Vec<f64> = Vec::with_capacity(entries.len());

        let mut iter = entries.into_iter().peekable();
        while let Some((i, j, mut v)) = iter.next() {
            while let Some(&(ni, nj, nv)) = iter.peek() {
                if ni == i && nj == j {
                    v += nv;
                    let _ = iter.next();
                } else {
                    break;
                }
            }
            if v != 0.0 {
                col_idx.push(j);
                values.push(v);
                row_ptr[i + 1] += 1;
            }
        }
        for i in 0..n_rows {
            row_ptr[i + 1] += row_ptr[i];
        }

        Ok(Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Build from a dense `ndarray` matrix, dropping zeros.
    pub fn from_dense(dense: &Array2<f64>) -> Self {
        let (n_rows, n_cols) = dense.dim();
        let triplets = dense
            .indexed_iter()
            .filter(|(_, &v)| v != 0.0)
            .map(|((i, j), &v)| (i, j, v));
        // Indices come straight from the dense shape, so this cannot fail.
        Self::from_triplets(n_rows, n_cols, triplets)
            .expect("dense indices are in bounds by construction")
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Total number of stored (nonzero) entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Number of nonzero entries in row `i`.
    ///
    /// This is the "absolute degree" of node `i` when the matrix is a signed
    /// adjacency matrix: the count of signed edges touching it, regardless
    /// of sign.
    pub fn row_nnz(&self, i: usize) -> usize {
        self.row_ptr[i + 1] - self.row_ptr[i]
    }

    /// Value at (i, j); zero if unstored.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let row = &self.col_idx[self.row_ptr[i]..self.row_ptr[i + 1]];
        match row.binary_search(&j) {
            Ok(pos) => self.values[self.row_ptr[i] + pos],
            Err(_) => 0.0,
        }
    }

    /// Iterate over stored entries as (row, col, value).
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.n_rows).flat_map(move |i| {
            let start = self.row_ptr[i];
            let end = self.row_ptr[i + 1];
            (start..end).map(move |p| (i, self.col_idx[p], self.values[p]))
        })
    }

    /// Whether the matrix is square.
    pub fn is_square(&self) -> bool {
        self.n_rows == self.n_cols
    }

    /// Whether the matrix equals its transpose (exact comparison; entries
    /// here are small integers so no tolerance is needed).
    pub fn is_symmetric(&self) -> bool {
        self.is_square() && self.iter().all(|(i, j, v)| self.get(j, i) == v)
    }

    /// Whether every stored entry is -1 or +1 (a sign matrix).
    pub fn is_sign_matrix(&self) -> bool {
        self.values.iter().all(|&v| v == 1.0 || v == -1.0)
    }

    /// Elementwise sign: entries map to -1/+1, zeros stay unstored.
    pub fn signum(&self) -> Self {
        let mut out = self.clone();
        for v in &mut out.values {
            *v = if *v > 0.0 { 1.0 } else { -1.0 };
        }
        out
    }

    /// Sparse matrix-vector product `y = A x`.
    pub fn matvec(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.n_cols {
            return Err(Error::DimensionMismatch {
                expected: self.n_cols,
                found: x.len(),
            });
        }
        let mut y = vec![0.0; self.n_rows];
        for i in 0..self.n_rows {
            let mut acc = 0.0;
            for p in self.row_ptr[i]..self.row_ptr[i + 1] {
                acc += self.values[p] * x[self.col_idx[p]];
            }
            y[i] = acc;
        }
        Ok(y)
    }

    /// Densify into a `faer` matrix.
    pub fn to_faer(&self) -> Mat<f64> {
        let mut out = Mat::<f64>::zeros(self.n_rows, self.n_cols);
        for (i, j, v) in self.iter() {
            out[(i, j)] = v;
        }
        out
    }

    /// Densify into an `ndarray` matrix.
    pub fn to_ndarray(&self) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((self.n_rows, self.n_cols));
        for (i, j, v) in self.iter() {
            out[[i, j]] = v;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_triplets_basic() {
        let m = SparseMatrix::from_triplets(3, 3, vec![(0, 1, 1.0), (1, 0, -1.0), (2, 2, 1.0)])
            .unwrap();
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.get(0, 1), 1.0);
        assert_eq!(m.get(1, 0), -1.0);
        assert_eq!(m.get(2, 2), 1.0);
        assert_eq!(m.get(0, 0), 0.0);
    }

    #[test]
    fn test_duplicates_summed_zeros_dropped() {
        let m = SparseMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, 1.0), (0, 0, 1.0), (0, 1, 1.0), (0, 1, -1.0)],
        )
        .unwrap();
        assert_eq!(m.get(0, 0), 2.0);
        // +1 and -1 cancel; the entry must not be stored.
        assert_eq!(m.nnz(), 1);
        assert_eq!(m.row_nnz(0), 1);
    }

    #[test]
    fn test_out_of_bounds_triplet() {
        let result = SparseMatrix::from_triplets(2, 2, vec![(2, 0, 1.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_row_nnz_counts_diagonal() {
        let m = SparseMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (0, 1, -1.0)]).unwrap();
        assert_eq!(m.row_nnz(0), 2);
        assert_eq!(m.row_nnz(1), 0);
    }

    #[test]
    fn test_dense_round_trip() {
        let dense = array![[0.0, 1.0, -1.0], [1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]];
        let sparse = SparseMatrix::from_dense(&dense);
        assert_eq!(sparse.nnz(), 4);
        assert_eq!(sparse.to_ndarray(), dense);
    }

    #[test]
    fn test_symmetry() {
        let sym = SparseMatrix::from_dense(&array![[0.0, 1.0], [1.0, 0.0]]);
        assert!(sym.is_symmetric());
        let asym = SparseMatrix::from_dense(&array![[0.0, 1.0], [-1.0, 0.0]]);
        assert!(!asym.is_symmetric());
    }

    #[test]
    fn test_signum() {
        let m = SparseMatrix::from_dense(&array![[0.5, -2.0], [0.0, 3.0]]);
        let s = m.signum();
        assert!(s.is_sign_matrix());
        assert_eq!(s.get(0, 0), 1.0);
        assert_eq!(s.get(0, 1), -1.0);
        assert_eq!(s.get(1, 0), 0.0);
    }

    #[test]
    fn test_matvec() {
        let m = SparseMatrix::from_dense(&array![[2.0, 0.0], [0.0, 3.0]]);
        let y = m.matvec(&[1.0, 2.0]).unwrap();
        assert_eq!(y, vec![2.0, 6.0]);

        assert!(m.matvec(&[1.0]).is_err());
    }

    #[test]
    fn test_to_faer() {
        let m = SparseMatrix::from_dense(&array![[1.0, -1.0], [0.0, 2.0]]);
        let f = m.to_faer();
        assert_eq!(f[(0, 0)], 1.0);
        assert_eq!(f[(0, 1)], -1.0);
        assert_eq!(f[(1, 0)], 0.0);
        assert_eq!(f[(1, 1)], 2.0);
    }
}
