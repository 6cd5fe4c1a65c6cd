//! K-means partitioning of the spectral embedding.
//!
//! Lloyd's algorithm with k-means++ initialization over the rows of an
//! n x k embedding matrix. WCSS (within-cluster sum of squares) decreases
//! monotonically, so the iteration converges to a local optimum; k-means++
//! plus a few deterministic restarts guard against unlucky first centroids
//! on the tiny problems spectral embeddings produce.

use ndarray::{Array2, ArrayView1};
use rand::prelude::*;

use crate::error::{Error, Result};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// K-means clusterer over embedding rows.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum Lloyd iterations per restart.
    max_iter: usize,
    /// Convergence tolerance on total centroid shift.
    tol: f64,
    /// Number of restarts; the assignment with the lowest WCSS wins.
    restarts: usize,
    /// Random seed.
    seed: Option<u64>,
}

impl Kmeans {
    /// Create a new K-means clusterer for `k` clusters.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            tol: 1e-6,
            restarts: 4,
            seed: None,
        }
    }

    /// Set maximum iterations per restart.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the number of restarts.
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts.max(1);
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.k
    }

    /// Cluster the rows of `points`, returning one label in `[0, k)` per row.
    pub fn fit_predict(&self, points: &Array2<f64>) -> Result<Vec<usize>> {
        let n = points.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        let base_seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let mut best: Option<(f64, Vec<usize>)> = None;

        for t in 0..self.restarts as u64 {
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(t));
            let (wcss, labels) = self.run_lloyd(points, &mut rng);
            match &mut best {
                None => best = Some((wcss, labels)),
                Some((best_wcss, best_labels)) => {
                    if wcss < *best_wcss {
                        *best_wcss = wcss;
                        *best_labels = labels;
                    }
                }
            }
        }

        Ok(best.expect("restarts >= 1").1)
    }

    /// One k-means++ initialization followed by Lloyd iterations.
    fn run_lloyd(&self, points: &Array2<f64>, rng: &mut StdRng) -> (f64, Vec<usize>) {
        let n = points.nrows();
        let d = points.ncols();

        let mut centroids = self.init_centroids(points, rng);
        let mut labels = vec![0usize; n];

        for _ in 0..self.max_iter {
            self.assign(points, &centroids, &mut labels);

            // Update step.
            let mut new_centroids = Array2::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];
            for i in 0..n {
                let c = labels[i];
                for j in 0..d {
                    new_centroids[[c, j]] += points[[i, j]];
                }
                counts[c] += 1;
            }
            for c in 0..self.k {
                if counts[c] > 0 {
                    for j in 0..d {
                        new_centroids[[c, j]] /= counts[c] as f64;
                    }
                } else {
                    // Empty cluster: reseed from a random point.
                    let idx = rng.random_range(0..n);
                    new_centroids.row_mut(c).assign(&points.row(idx));
                }
            }

            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            centroids = new_centroids;
            if shift < self.tol {
                break;
            }
        }

        self.assign(points, &centroids, &mut labels);
        let wcss = (0..n)
            .map(|i| squared_distance(&points.row(i), &centroids.row(labels[i])))
            .sum();
        (wcss, labels)
    }

    /// Assignment step: each point to its nearest centroid.
    fn assign(&self, points: &Array2<f64>, centroids: &Array2<f64>, labels: &mut [usize]) {
        #[cfg(feature = "parallel")]
        {
            labels.par_iter_mut().enumerate().for_each(|(i, label)| {
                *label = nearest(&points.row(i), centroids, self.k);
            });
        }

        #[cfg(not(feature = "parallel"))]
        for (i, label) in labels.iter_mut().enumerate() {
            *label = nearest(&points.row(i), centroids, self.k);
        }
    }

    /// K-means++ initialization: spread initial centroids proportionally to
    /// squared distance from the nearest already-chosen one.
    fn init_centroids(&self, points: &Array2<f64>, rng: &mut StdRng) -> Array2<f64> {
        let n = points.nrows();
        let d = points.ncols();
        let mut centroids = Array2::zeros((self.k, d));

        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&points.row(first));

        for c in 1..self.k {
            let distances: Vec<f64> = (0..n)
                .map(|i| {
                    (0..c)
                        .map(|j| squared_distance(&points.row(i), &centroids.row(j)))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            let total: f64 = distances.iter().sum();
            if total == 0.0 {
                let idx = rng.random_range(0..n);
                centroids.row_mut(c).assign(&points.row(idx));
                continue;
            }

            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;
            for (i, &dist) in distances.iter().enumerate() {
                cumsum += dist;
                if cumsum >= threshold {
                    selected = i;
                    break;
                }
            }
            centroids.row_mut(c).assign(&points.row(selected));
        }

        centroids
    }
}

fn nearest(point: &ArrayView1<'_, f64>, centroids: &Array2<f64>, k: usize) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for c in 0..k {
        let dist = squared_distance(point, &centroids.row(c));
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    best
}

fn squared_distance(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_kmeans_two_blobs() {
        let points = array![[0.0, 0.0], [0.1, 0.1], [10.0, 10.0], [10.1, 10.1]];
        let labels = Kmeans::new(2).with_seed(42).fit_predict(&points).unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_kmeans_labels_in_range() {
        let points = Array2::from_shape_fn((50, 2), |(i, j)| (i as f64) * 0.1 + j as f64);
        let labels = Kmeans::new(5).with_seed(123).fit_predict(&points).unwrap();
        assert_eq!(labels.len(), 50);
        assert!(labels.iter().all(|&l| l < 5));
    }

    #[test]
    fn test_kmeans_k_equals_n() {
        let points = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let labels = Kmeans::new(3).with_seed(42).fit_predict(&points).unwrap();
        let unique: std::collections::HashSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let points = array![[0.0, 0.0], [0.1, 0.1], [10.0, 10.0], [10.1, 10.1]];
        let a = Kmeans::new(2).with_seed(7).fit_predict(&points).unwrap();
        let b = Kmeans::new(2).with_seed(7).fit_predict(&points).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_kmeans_empty_input() {
        let points = Array2::<f64>::zeros((0, 2));
        assert!(Kmeans::new(2).fit_predict(&points).is_err());
    }

    #[test]
    fn test_kmeans_k_larger_than_n() {
        let points = array![[0.0, 0.0], [1.0, 1.0]];
        assert!(matches!(
            Kmeans::new(5).fit_predict(&points),
            Err(Error::InvalidClusterCount {
                requested: 5,
                n_items: 2
            })
        ));
    }
}
