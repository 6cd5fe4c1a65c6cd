//! Matrix-completion front end for sparse signed networks.
//!
//! When a network is too sparsely observed to cluster directly, a
//! completion algorithm fills in the missing edge signs first and the
//! pipeline clusters the completed sign matrix instead of the signed
//! Laplacian. [`complete_signs`] is the single entry point: it dispatches
//! on [`CompletionAlgorithm`], normalizes every failure into
//! [`Error::CompletionFailed`] with the algorithm name and underlying
//! cause attached, and reports a recovery diagnostic against the balanced
//! oracle for the planted partition.

mod factorization;
mod svp;

pub use factorization::{matrix_factor_als, matrix_factor_sgd, AlsParams, LossType, SgdParams};
pub use svp::{sign_prediction_svp, SvpParams};

use crate::error::{Error, Result};
use crate::matrix::SparseMatrix;
use crate::simulate::balanced_sign;

/// Completion algorithm plus its parameters, fixed at configuration time.
#[derive(Debug, Clone)]
pub enum CompletionAlgorithm {
    /// Singular value projection.
    Svp(SvpParams),
    /// Stochastic gradient descent factorization, completed as
    /// `sign(F1 * F2^T)`.
    Sgd(SgdParams),
    /// Alternating least squares factorization, completed as
    /// `sign(F1^T * F2)`.
    Als(AlsParams),
}

impl CompletionAlgorithm {
    /// Short algorithm name used in diagnostics and error causes.
    pub fn name(&self) -> &'static str {
        match self {
            CompletionAlgorithm::Svp(_) => "svp",
            CompletionAlgorithm::Sgd(_) => "sgd",
            CompletionAlgorithm::Als(_) => "als",
        }
    }
}

/// How well a completed matrix recovered the balanced network it was
/// sampled from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoveryReport {
    /// Fraction of all n^2 entries whose completed sign matches the
    /// balanced oracle. The denominator counts every entry of the
    /// hypothetical fully connected network, diagonal included, so a
    /// perfect off-diagonal recovery scores just below 1.
    pub recovered_fraction: f64,
    /// Number of matching entries.
    pub matching_entries: usize,
    /// Total entries checked (n^2).
    pub total_entries: usize,
}

/// Complete the missing signs of a partially observed network.
///
/// The returned matrix has entries in {-1, 0, +1}. The recovery
/// diagnostic goes to `observer` when one is given, otherwise it is
/// logged at info level.
pub fn complete_signs(
    adj: &SparseMatrix,
    algorithm: &CompletionAlgorithm,
    cluster_sizes: &[usize],
    observer: Option<&dyn Fn(&RecoveryReport)>,
) -> Result<SparseMatrix> {
    let completed = run_algorithm(adj, algorithm).map_err(|cause| {
        tracing::warn!(algorithm = algorithm.name(), %cause, "sign completion failed");
        Error::CompletionFailed {
            algorithm: algorithm.name(),
            reason: cause.to_string(),
        }
    })?;

    let report = recovery_report(&completed, cluster_sizes);
    match observer {
        Some(observe) => observe(&report),
        None => tracing::info!(
            algorithm = algorithm.name(),
            recovered = report.recovered_fraction,
            "sign recovery against the balanced network"
        ),
    }

    Ok(completed)
}

fn run_algorithm(adj: &SparseMatrix, algorithm: &CompletionAlgorithm) -> Result<SparseMatrix> {
    match algorithm {
        CompletionAlgorithm::Svp(params) => sign_prediction_svp(adj, params),
        CompletionAlgorithm::Sgd(params) => {
            let (f1, f2) = matrix_factor_sgd(adj, params)?;
            Ok(SparseMatrix::from_dense(&f1.dot(&f2.t()).mapv(signum)))
        }
        CompletionAlgorithm::Als(params) => {
            let (f1, f2) = matrix_factor_als(adj, params)?;
            Ok(SparseMatrix::from_dense(&f1.t().dot(&f2).mapv(signum)))
        }
    }
}

/// Compare the completed signs against the fully connected balanced
/// network for the planted partition.
fn recovery_report(completed: &SparseMatrix, cluster_sizes: &[usize]) -> RecoveryReport {
    let n: usize = cluster_sizes.iter().sum();
    let matching = completed
        .iter()
        .filter(|&(i, j, v)| i < n && j < n && v == balanced_sign(cluster_sizes, i, j))
        .count();
    let total = n * n;
    RecoveryReport {
        recovered_fraction: if total == 0 {
            0.0
        } else {
            matching as f64 / total as f64
        },
        matching_entries: matching,
        total_entries: total,
    }
}

/// Sign with a dead zone for numerically zero products.
fn signum(v: f64) -> f64 {
    if v.abs() < 1e-12 {
        0.0
    } else if v > 0.0 {
        1.0
    } else {
        -1.0
    }
}
