//! Clustering evaluation under label-permutation invariance.
//!
//! A clustering algorithm names its clusters arbitrarily: a prediction can
//! be exactly right and still disagree elementwise with the ground truth
//! because the labels are permuted. [`permutation_accuracy`] therefore
//! tries every bijection of predicted label names and reports the best
//! elementwise agreement.
//!
//! # Complexity
//!
//! Brute force over all k! bijections: O(k! * n). The routine is generic
//! over any k and does not enforce a ceiling itself — callers decide what
//! factorial cost they will accept before invoking it (the pipeline
//! refuses above [`crate::pipeline::MAX_BRUTE_FORCE_CLUSTERS`]). Each
//! permutation is scored in a streaming pass; no relabeled sequence is
//! ever materialized.

use crate::error::{Error, Result};

/// Best elementwise agreement between `pred` and `truth` over all k!
/// bijections of predicted label names. Returns a value in `[0, 1]`.
///
/// Labels must lie in `[0, k)` on both sides.
pub fn permutation_accuracy(pred: &[usize], truth: &[usize], k: usize) -> Result<f64> {
    if pred.is_empty() {
        return Err(Error::EmptyInput);
    }
    if pred.len() != truth.len() {
        return Err(Error::DimensionMismatch {
            expected: truth.len(),
            found: pred.len(),
        });
    }
    if k == 0 || pred.iter().chain(truth.iter()).any(|&l| l >= k) {
        return Err(Error::InvalidParameter {
            name: "labels",
            message: "labels must lie in [0, k)",
        });
    }

    // Heap's algorithm enumerates the k! permutations in place, scoring
    // each one as it appears.
    let mut perm: Vec<usize> = (0..k).collect();
    let mut best = agreement(pred, truth, &perm);

    let mut counters = vec![0usize; k];
    let mut i = 0;
    while i < k {
        if counters[i] < i {
            if i % 2 == 0 {
                perm.swap(0, i);
            } else {
                perm.swap(counters[i], i);
            }
            best = best.max(agreement(pred, truth, &perm));
            counters[i] += 1;
            i = 0;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }

    Ok(best)
}

/// Fraction of positions where `perm[pred[t]] == truth[t]`.
fn agreement(pred: &[usize], truth: &[usize], perm: &[usize]) -> f64 {
    let matches = pred
        .iter()
        .zip(truth.iter())
        .filter(|&(&p, &t)| perm[p] == t)
        .count();
    matches as f64 / pred.len() as f64
}
