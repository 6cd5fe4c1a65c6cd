//! # schism
//!
//! Spectral clustering for signed networks: signed Laplacians + matrix-completion
//! primitives for recovering planted partitions from noisy, partially observed
//! edge signs.
//!
//! The high-level entry points live in [`pipeline`]: [`cluster_signed_network`]
//! clusters an observed network, [`clustering_pipeline`] runs a full simulation
//! study (sample, cluster, score). The building blocks are public and usable on
//! their own.

pub mod completion;
pub mod embedding;
/// Error types used across `schism`.
pub mod error;
pub mod laplacian;
pub mod matrix;
pub mod metrics;
pub mod partition;
pub mod pipeline;
pub mod simulate;

#[cfg(test)]
mod pipeline_tests;

pub use error::{Error, Result};

pub use crate::completion::{
    complete_signs, AlsParams, CompletionAlgorithm, LossType, RecoveryReport, SgdParams, SvpParams,
};
pub use crate::embedding::{SolverPath, SpectralEmbedding, SpectralEnd};
pub use crate::laplacian::{check_positive_semidefinite, signed_laplacian};
pub use crate::matrix::SparseMatrix;
pub use crate::metrics::permutation_accuracy;
pub use crate::partition::Kmeans;
pub use crate::pipeline::{
    build_cluster_matrix, cluster_signed_network, clustering_pipeline, ClusterConfig,
    ClusterMethod, Mode, NetworkParams, PipelineResult, MAX_BRUTE_FORCE_CLUSTERS,
};
pub use crate::simulate::{balanced_sign, ground_truth_labels, NetworkModel};
