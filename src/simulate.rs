//! Synthetic signed networks with planted cluster structure.
//!
//! A *balanced* signed network has all within-cluster edges positive and all
//! between-cluster edges negative. [`NetworkModel`] samples a noisy, partially
//! observed version of that ideal: each node pair is observed with
//! probability `sparsity`, and each observed edge sign is flipped with
//! probability `noise`. The fully observed, noiseless network is available
//! pointwise through [`balanced_sign`], which the matrix-completion
//! diagnostic uses as its recovery oracle.

use rand::prelude::*;

use crate::error::{Error, Result};
use crate::matrix::SparseMatrix;

/// Planted-partition generator for signed networks.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    /// Cluster sizes; cluster c owns the c-th contiguous index block.
    cluster_sizes: Vec<usize>,
    /// Probability that a node pair is observed.
    sparsity: f64,
    /// Probability that an observed edge sign is flipped.
    noise: f64,
    /// Random seed.
    seed: Option<u64>,
}

impl NetworkModel {
    /// Create a model over the given cluster sizes.
    ///
    /// Defaults: fully observed (`sparsity = 1.0`), noiseless (`noise = 0.0`).
    pub fn new(cluster_sizes: &[usize]) -> Self {
        Self {
            cluster_sizes: cluster_sizes.to_vec(),
            sparsity: 1.0,
            noise: 0.0,
            seed: None,
        }
    }

    /// Set the observation probability.
    pub fn with_sparsity(mut self, sparsity: f64) -> Self {
        self.sparsity = sparsity;
        self
    }

    /// Set the sign-flip probability.
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Total number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.cluster_sizes.iter().sum()
    }

    /// Sample a symmetric signed adjacency matrix.
    ///
    /// Each unordered off-diagonal pair {i, j} is observed with probability
    /// `sparsity`; an observed pair gets the balanced sign for the planted
    /// partition, flipped with probability `noise`, stored at both (i, j)
    /// and (j, i). The diagonal is never sampled: self-relationships carry
    /// no information about the partition.
    pub fn sample(&self) -> Result<SparseMatrix> {
        if self.cluster_sizes.is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.cluster_sizes.contains(&0) {
            return Err(Error::InvalidParameter {
                name: "cluster_sizes",
                message: "cluster sizes must be positive",
            });
        }
        if !(0.0..=1.0).contains(&self.sparsity) {
            return Err(Error::InvalidParameter {
                name: "sparsity",
                message: "must be in [0, 1]",
            });
        }
        if !(0.0..=1.0).contains(&self.noise) {
            return Err(Error::InvalidParameter {
                name: "noise",
                message: "must be in [0, 1]",
            });
        }

        let n = self.n_nodes();
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut triplets = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if rng.random::<f64>() >= self.sparsity {
                    continue;
                }
                let mut sign = balanced_sign(&self.cluster_sizes, i, j);
                if rng.random::<f64>() < self.noise {
                    sign = -sign;
                }
                triplets.push((i, j, sign));
                triplets.push((j, i, sign));
            }
        }
        SparseMatrix::from_triplets(n, n, triplets)
    }
}

/// Sign that the fully connected, noiseless balanced network would have at
/// coordinate (i, j): +1 within a cluster, -1 across clusters.
pub fn balanced_sign(cluster_sizes: &[usize], i: usize, j: usize) -> f64 {
    if block_of(cluster_sizes, i) == block_of(cluster_sizes, j) {
        1.0
    } else {
        -1.0
    }
}

/// Canonical ground-truth labels: label c for the c-th contiguous block.
pub fn ground_truth_labels(cluster_sizes: &[usize]) -> Vec<usize> {
    let mut labels = Vec::with_capacity(cluster_sizes.iter().sum());
    for (c, &size) in cluster_sizes.iter().enumerate() {
        labels.extend(std::iter::repeat(c).take(size));
    }
    labels
}

fn block_of(cluster_sizes: &[usize], idx: usize) -> usize {
    let mut end = 0;
    for (c, &size) in cluster_sizes.iter().enumerate() {
        end += size;
        if idx < end {
            return c;
        }
    }
    // Index invariant: callers only pass coordinates below sum(cluster_sizes).
    panic!("node index {idx} out of range for cluster sizes {cluster_sizes:?}");
}
