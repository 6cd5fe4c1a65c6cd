//! Singular-value-projection sign prediction.
//!
//! Projected gradient descent for low-rank matrix completion (Jain et al.,
//! 2010), specialized to symmetric sign matrices: alternate a gradient step
//! on the observed entries with a projection onto the rank-r matrices, then
//! read off entry signs. The projection uses a self-adjoint
//! eigendecomposition rather than an SVD — the iterates stay symmetric
//! because the adjacency and every residual are.

use faer::prelude::*;
use faer::{Mat, Side};

use crate::error::{Error, Result};
use crate::matrix::SparseMatrix;

/// Parameters for SVP sign prediction.
#[derive(Debug, Clone)]
pub struct SvpParams {
    /// Target rank of the completed matrix.
    pub rank: usize,
    /// Stop when the Frobenius norm of the observed residual drops below
    /// this.
    pub tol: f64,
    /// Maximum projected-gradient iterations.
    pub max_iter: usize,
    /// Gradient step size.
    pub step_size: f64,
}

impl SvpParams {
    fn validate(&self, n: usize) -> Result<()> {
        if self.rank == 0 || self.rank > n {
            return Err(Error::InvalidParameter {
                name: "rank",
                message: "must be in [1, n]",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if !(self.step_size > 0.0) {
            return Err(Error::InvalidParameter {
                name: "step_size",
                message: "must be positive",
            });
        }
        if self.tol < 0.0 {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be nonnegative",
            });
        }
        Ok(())
    }
}

/// Predict edge signs by low-rank completion of the observed entries.
///
/// Returns a completed sign matrix with entries in {-1, 0, +1}; entries of
/// the low-rank iterate that are numerically zero stay unobserved.
pub fn sign_prediction_svp(adj: &SparseMatrix, params: &SvpParams) -> Result<SparseMatrix> {
    if !adj.is_square() {
        return Err(Error::NotSquare {
            rows: adj.n_rows(),
            cols: adj.n_cols(),
        });
    }
    let n = adj.n_rows();
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    params.validate(n)?;

    let mut x = Mat::<f64>::zeros(n, n);
    for _ in 0..params.max_iter {
        // Gradient step on the observed set: X += step * P_Omega(A - X).
        let mut residual_norm_sq = 0.0;
        for (i, j, v) in adj.iter() {
            let r = v - x[(i, j)];
            residual_norm_sq += r * r;
            x[(i, j)] += params.step_size * r;
        }
        if residual_norm_sq.sqrt() <= params.tol {
            break;
        }
        x = project_rank(&x, params.rank, adj.nnz());
    }

    Ok(signs_of_dense(&x, n))
}

/// Project a symmetric matrix onto the best rank-r approximation by
/// magnitude of eigenvalue.
fn project_rank(x: &Mat<f64>, rank: usize, _nnz: usize) -> Mat<f64> {
    let n = x.nrows();
    let evd = x.selfadjoint_eigendecomposition(Side::Lower);
    let u = evd.u().to_owned();

    // Eigenvalue per column as a Rayleigh quotient; avoids depending on
    // the decomposition's eigenvalue ordering.
    let xu = x * &u;
    let mut lambdas: Vec<(f64, usize)> = (0..n)
        .map(|j| {
            let lambda: f64 = (0..n).map(|i| u[(i, j)] * xu[(i, j)]).sum();
            (lambda, j)
        })
        .collect();
    lambdas.sort_by(|a, b| b.0.abs().total_cmp(&a.0.abs()));

    let mut projected = Mat::<f64>::zeros(n, n);
    for &(lambda, j) in lambdas.iter().take(rank) {
        for r in 0..n {
            let ur = lambda * u[(r, j)];
            for c in 0..n {
                projected[(r, c)] += ur * u[(c, j)];
            }
        }
    }
    projected
}

fn signs_of_dense(x: &Mat<f64>, n: usize) -> SparseMatrix {
    let triplets = (0..n).flat_map(|i| {
        (0..n).filter_map(move |j| {
            let v = x[(i, j)];
            if v.abs() < 1e-12 {
                None
            } else {
                Some((i, j, if v > 0.0 { 1.0 } else { -1.0 }))
            }
        })
    });
    SparseMatrix::from_triplets(n, n, triplets).expect("indices in bounds by construction")
}
