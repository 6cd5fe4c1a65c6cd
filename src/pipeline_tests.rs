#[cfg(test)]
mod tests {
    use crate::completion::{AlsParams, CompletionAlgorithm, LossType, SgdParams, SvpParams};
    use crate::pipeline::{
        clustering_pipeline, ClusterConfig, ClusterMethod, Mode, NetworkParams,
    };
    use crate::Result;
    use std::cell::Cell;

    fn params(cluster_sizes: &[usize], sparsity: f64, noise: f64, seed: u64) -> NetworkParams {
        NetworkParams {
            cluster_sizes: cluster_sizes.to_vec(),
            sparsity,
            noise,
            seed,
        }
    }

    fn svp() -> CompletionAlgorithm {
        CompletionAlgorithm::Svp(SvpParams {
            rank: 4,
            tol: 1e-6,
            max_iter: 50,
            step_size: 1.0,
        })
    }

    fn sgd() -> CompletionAlgorithm {
        CompletionAlgorithm::Sgd(SgdParams {
            learning_rate: 0.05,
            loss: LossType::Squared,
            tol: 1e-10,
            max_iter: 500,
            regularization: 0.01,
            dim: 4,
            seed: 9,
        })
    }

    fn als() -> CompletionAlgorithm {
        CompletionAlgorithm::Als(AlsParams {
            dim: 4,
            num_iter: 25,
            seed: 7,
        })
    }

    #[test]
    fn test_laplacian_recovers_noiseless_network_exactly() -> Result<()> {
        // Fully observed, noiseless [3, 4, 5]: the planted partition is the
        // unique balanced one and must be recovered perfectly.
        let config = ClusterConfig::new(ClusterMethod::SignedLaplacian).with_mode(Mode::Test);
        let result = clustering_pipeline(&params(&[3, 4, 5], 1.0, 0.0, 11), &config, None)?;
        assert_eq!(result.accuracy, 1.0);
        assert_eq!(result.labels.len(), 12);
        assert_eq!(result.truth, crate::ground_truth_labels(&[3, 4, 5]));
        Ok(())
    }

    #[test]
    fn test_laplacian_on_sparse_noisy_network() -> Result<()> {
        let config = ClusterConfig::new(ClusterMethod::SignedLaplacian);
        let result = clustering_pipeline(&params(&[3, 4, 5], 0.5, 0.1, 3), &config, None)?;
        assert_eq!(result.labels.len(), 12);
        assert!((0.0..=1.0).contains(&result.accuracy));
        Ok(())
    }

    #[test]
    fn test_completion_methods_recover_full_network() -> Result<()> {
        // Fully observed balanced network: every completion algorithm
        // reproduces the observed signs, and the sign matrix's dominant
        // eigenpairs are exactly the block structure.
        for algorithm in [svp(), sgd(), als()] {
            let config =
                ClusterConfig::new(ClusterMethod::MatrixCompletion(algorithm)).with_mode(Mode::Test);
            let result = clustering_pipeline(&params(&[3, 4, 5], 1.0, 0.0, 11), &config, None)?;
            assert_eq!(
                result.accuracy, 1.0,
                "method {:?} missed the planted partition",
                config.method()
            );
        }
        Ok(())
    }

    #[test]
    fn test_completion_on_sparse_network() -> Result<()> {
        let config = ClusterConfig::new(ClusterMethod::MatrixCompletion(svp()));
        let result = clustering_pipeline(&params(&[3, 3], 0.7, 0.0, 5), &config, None)?;
        assert_eq!(result.labels.len(), 6);
        assert!((0.0..=1.0).contains(&result.accuracy));
        Ok(())
    }

    #[test]
    fn test_recovery_observer_is_called() -> Result<()> {
        let calls = Cell::new(0usize);
        let observer = |report: &crate::RecoveryReport| {
            assert_eq!(report.total_entries, 36);
            assert!((0.0..=1.0).contains(&report.recovered_fraction));
            calls.set(calls.get() + 1);
        };
        let config = ClusterConfig::new(ClusterMethod::MatrixCompletion(svp()));
        clustering_pipeline(&params(&[3, 3], 0.6, 0.0, 8), &config, Some(&observer))?;
        assert_eq!(calls.get(), 1);
        Ok(())
    }

    #[test]
    fn test_six_clusters_is_still_accepted() -> Result<()> {
        let config = ClusterConfig::new(ClusterMethod::SignedLaplacian);
        let result = clustering_pipeline(&params(&[3; 6], 1.0, 0.0, 2), &config, None)?;
        assert_eq!(result.labels.len(), 18);
        assert!(result.labels.iter().all(|&l| l < 6));
        Ok(())
    }

    #[test]
    fn test_runs_are_reproducible() -> Result<()> {
        let config = ClusterConfig::new(ClusterMethod::SignedLaplacian).with_seed(77);
        let p = params(&[3, 4, 5], 0.6, 0.05, 13);
        let a = clustering_pipeline(&p, &config, None)?;
        let b = clustering_pipeline(&p, &config, None)?;
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.accuracy, b.accuracy);
        Ok(())
    }
}
