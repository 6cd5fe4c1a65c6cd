//! Low-rank factorization of partially observed sign matrices.
//!
//! Two routines with deliberately different factor conventions:
//!
//! * [`matrix_factor_sgd`] returns row-major factors `(F1, F2)`, each
//!   `n x d`, completing as `sign(F1 * F2^T)`.
//! * [`matrix_factor_als`] returns column-major factors `(F1, F2)`, each
//!   `d x n`, completing as `sign(F1^T * F2)`.
//!
//! Callers must honor the convention of the routine they picked; the
//! adapter in [`super`] does.

use ndarray::Array2;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};
use crate::matrix::SparseMatrix;

/// Ridge added to every ALS normal-equation system. Rows with few observed
/// entries would otherwise produce singular d x d systems.
const ALS_RIDGE: f64 = 1e-6;

/// Standard deviation of the random factor initialization.
const INIT_SCALE: f64 = 0.1;

/// Loss minimized by the SGD factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossType {
    /// Squared error on the observed entries.
    Squared,
    /// Logistic loss on the observed signs.
    Logistic,
}

/// Parameters for SGD matrix factorization.
#[derive(Debug, Clone)]
pub struct SgdParams {
    /// Per-update learning rate.
    pub learning_rate: f64,
    /// Loss minimized on the observed entries.
    pub loss: LossType,
    /// Stop when the epoch loss improves by less than this.
    pub tol: f64,
    /// Maximum epochs over the observed set.
    pub max_iter: usize,
    /// L2 regularization on both factors.
    pub regularization: f64,
    /// Factor dimension.
    pub dim: usize,
    /// Random seed for factor initialization.
    pub seed: u64,
}

/// Parameters for ALS matrix factorization.
#[derive(Debug, Clone)]
pub struct AlsParams {
    /// Factor dimension.
    pub dim: usize,
    /// Number of alternating sweeps.
    pub num_iter: usize,
    /// Random seed for factor initialization.
    pub seed: u64,
}

impl SgdParams {
    fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(Error::InvalidParameter {
                name: "dim",
                message: "must be at least 1",
            });
        }
        if !(self.learning_rate > 0.0) {
            return Err(Error::InvalidParameter {
                name: "learning_rate",
                message: "must be positive",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if self.regularization < 0.0 {
            return Err(Error::InvalidParameter {
                name: "regularization",
                message: "must be nonnegative",
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

impl AlsParams {
    fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(Error::InvalidParameter {
                name: "dim",
                message: "must be at least 1",
            });
        }
        if self.num_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "num_iter",
                message: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Factor the observed entries by stochastic gradient descent.
///
/// Returns `n x d` factors `(F1, F2)`; the completed matrix is
/// `sign(F1 * F2^T)`.
pub fn matrix_factor_sgd(
    adj: &SparseMatrix,
    params: &SgdParams,
) -> Result<(Array2<f64>, Array2<f64>)> {
    if adj.nnz() == 0 {
        return Err(Error::EmptyInput);
    }
    params.validate()?;

    let n = adj.n_rows();
    let d = params.dim;
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut f1 = random_factor(n, d, &mut rng)?;
    let mut f2 = random_factor(n, d, &mut rng)?;

    let mut prev_loss = f64::MAX;
    for _ in 0..params.max_iter {
        let mut epoch_loss = 0.0;
        for (i, j, v) in adj.iter() {
            let p: f64 = (0..d).map(|t| f1[[i, t]] * f2[[j, t]]).sum();
            // Gradient coefficient on the prediction; sign depends on the
            // loss but the factor updates share one shape.
            let coeff = match params.loss {
                LossType::Squared => {
                    let e = v - p;
                    epoch_loss += e * e;
                    e
                }
                LossType::Logistic => {
                    let margin = v * p;
                    epoch_loss += (1.0 + (-margin).exp()).ln();
                    v / (1.0 + margin.exp())
                }
            };
            for t in 0..d {
                let g1 = coeff * f2[[j, t]] - params.regularization * f1[[i, t]];
                let g2 = coeff * f1[[i, t]] - params.regularization * f2[[j, t]];
                f1[[i, t]] += params.learning_rate * g1;
                f2[[j, t]] += params.learning_rate * g2;
            }
        }
        if !epoch_loss.is_finite() {
            return Err(Error::ConvergenceFailure {
                iterations: params.max_iter,
            });
        }
        if (prev_loss - epoch_loss).abs() < params.tol {
            break;
        }
        prev_loss = epoch_loss;
    }

    Ok((f1, f2))
}

/// Factor the observed entries by alternating least squares.
///
/// Returns `d x n` factors `(F1, F2)`; the completed matrix is
/// `sign(F1^T * F2)`.
pub fn matrix_factor_als(
    adj: &SparseMatrix,
    params: &AlsParams,
) -> Result<(Array2<f64>, Array2<f64>)> {
    if adj.nnz() == 0 {
        return Err(Error::EmptyInput);
    }
    params.validate()?;

    let n = adj.n_rows();
    let d = params.dim;
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut f1 = random_factor(d, n, &mut rng)?;
    let mut f2 = random_factor(d, n, &mut rng)?;

    for _ in 0..params.num_iter {
        solve_half(adj, &f2, &mut f1, false)?;
        solve_half(adj, &f1, &mut f2, true)?;
    }
    Ok((f1, f2))
}

/// One ALS half-sweep: for each index `i`, solve the ridge-regularized
/// normal equations over the entries observed in that row (or column, when
/// `transpose` is set) against the fixed factor.
fn solve_half(
    adj: &SparseMatrix,
    fixed: &Array2<f64>,
    free: &mut Array2<f64>,
    transpose: bool,
) -> Result<()> {
    use faer::prelude::*;
    use faer::{Mat, Side};

    let d = fixed.nrows();
    let n = adj.n_rows();
    for i in 0..n {
        let mut gram = Mat::<f64>::zeros(d, d);
        let mut rhs = Mat::<f64>::zeros(d, 1);
        for (r, c, v) in adj.iter() {
            let (row, other) = if transpose { (c, r) } else { (r, c) };
            if row != i {
                continue;
            }
            for a in 0..d {
                let fa = fixed[[a, other]];
                rhs[(a, 0)] += v * fa;
                for b in 0..d {
                    gram[(a, b)] += fa * fixed[[b, other]];
                }
            }
        }
        for a in 0..d {
            gram[(a, a)] += ALS_RIDGE;
        }
        let solution = gram
            .cholesky(Side::Lower)
            .map_err(|_| Error::Other("ridge-regularized normal equations not SPD".into()))?
            .solve(&rhs);
        for a in 0..d {
            free[[a, i]] = solution[(a, 0)];
        }
    }
    Ok(())
}

fn random_factor(rows: usize, cols: usize, rng: &mut StdRng) -> Result<Array2<f64>> {
    let normal = Normal::new(0.0, INIT_SCALE).map_err(|e| Error::Other(e.to_string()))?;
    Ok(Array2::from_shape_fn((rows, cols), |_| normal.sample(rng)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::{balanced_sign, NetworkModel};

    fn sgd_params() -> SgdParams {
        SgdParams {
            learning_rate: 0.05,
            loss: LossType::Squared,
            tol: 1e-8,
            max_iter: 300,
            regularization: 0.01,
            dim: 4,
            seed: 9,
        }
    }

    #[test]
    fn test_sgd_factor_shapes() {
        let adj = NetworkModel::new(&[3, 3]).with_seed(1).sample().unwrap();
        let (f1, f2) = matrix_factor_sgd(&adj, &sgd_params()).unwrap();
        assert_eq!(f1.dim(), (6, 4));
        assert_eq!(f2.dim(), (6, 4));
    }

    #[test]
    fn test_sgd_fits_observed_signs() {
        let sizes = [3, 3];
        let adj = NetworkModel::new(&sizes).with_seed(3).sample().unwrap();
        let (f1, f2) = matrix_factor_sgd(&adj, &sgd_params()).unwrap();
        let product = f1.dot(&f2.t());
        for (i, j, v) in adj.iter() {
            assert_eq!(product[[i, j]].signum(), v, "wrong sign at ({i}, {j})");
        }
    }

    #[test]
    fn test_sgd_logistic_loss_runs() {
        let adj = NetworkModel::new(&[3, 3]).with_seed(5).sample().unwrap();
        let mut params = sgd_params();
        params.loss = LossType::Logistic;
        params.max_iter = 500;
        let (f1, f2) = matrix_factor_sgd(&adj, &params).unwrap();
        let product = f1.dot(&f2.t());
        for (i, j, v) in adj.iter() {
            assert_eq!(product[[i, j]].signum(), v, "wrong sign at ({i}, {j})");
        }
    }

    #[test]
    fn test_als_factor_shapes_are_transposed_convention() {
        let adj = NetworkModel::new(&[3, 4]).with_seed(2).sample().unwrap();
        let params = AlsParams {
            dim: 4,
            num_iter: 20,
            seed: 7,
        };
        let (f1, f2) = matrix_factor_als(&adj, &params).unwrap();
        assert_eq!(f1.dim(), (4, 7));
        assert_eq!(f2.dim(), (4, 7));
    }

    #[test]
    fn test_als_fits_observed_signs() {
        let sizes = [3, 4];
        let adj = NetworkModel::new(&sizes).with_seed(2).sample().unwrap();
        let params = AlsParams {
            dim: 4,
            num_iter: 20,
            seed: 7,
        };
        let (f1, f2) = matrix_factor_als(&adj, &params).unwrap();
        let product = f1.t().dot(&f2);
        for (i, j, _) in adj.iter() {
            assert_eq!(
                product[[i, j]].signum(),
                balanced_sign(&sizes, i, j),
                "wrong sign at ({i}, {j})"
            );
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        let adj = NetworkModel::new(&[2, 2]).with_seed(1).sample().unwrap();
        let mut params = sgd_params();
        params.dim = 0;
        assert!(matrix_factor_sgd(&adj, &params).is_err());

        let mut params = sgd_params();
        params.learning_rate = -1.0;
        assert!(matrix_factor_sgd(&adj, &params).is_err());

        let params = AlsParams {
            dim: 0,
            num_iter: 5,
            seed: 0,
        };
        assert!(matrix_factor_als(&adj, &params).is_err());
    }

    #[test]
    fn test_empty_observation_set() {
        let adj = NetworkModel::new(&[3, 3])
            .with_sparsity(0.0)
            .with_seed(1)
            .sample()
            .unwrap();
        assert!(matches!(
            matrix_factor_sgd(&adj, &sgd_params()),
            Err(Error::EmptyInput)
        ));
    }
}
