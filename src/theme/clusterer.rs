//! K-means clustering with k-means++ seeding.

use ahash::{AHashMap, AHashSet};
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ClusterConfig;
use crate::error::{Result, SentiscopeError};

/// Outcome of clustering one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Cluster id per row, numbered in order of first appearance.
    pub labels: Vec<usize>,
    /// Squared Euclidean distance of each row to its centroid.
    pub distances: Vec<f64>,
    /// One centroid per cluster id.
    pub centroids: Array2<f64>,
    /// Clusters asked for.
    pub requested: usize,
    /// Distinct rows in the input.
    pub distinct_points: usize,
    /// Assignment rounds run.
    pub iterations: usize,
    /// Whether assignments stopped changing before `max_iter`.
    pub converged: bool,
}

impl Clustering {
    /// Effective number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Sum of squared distances to the assigned centroids.
    pub fn inertia(&self) -> f64 {
        self.distances.iter().sum()
    }

    /// Rows per cluster id.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Lloyd's k-means over the rows of a dense matrix.
#[derive(Debug, Clone)]
pub struct KMeans {
    config: ClusterConfig,
}

impl KMeans {
    pub fn new(config: ClusterConfig) -> Self {
        KMeans { config }
    }

    /// Partition the rows of `data` into at most `n_clusters` groups.
    ///
    /// When the data has fewer distinct rows than requested clusters, the
    /// cluster count collapses to the distinct-row count.
    pub fn fit(&self, data: &Array2<f64>) -> Result<Clustering> {
        let n = data.nrows();
        if n == 0 {
            return Err(SentiscopeError::invalid_argument(
                "cannot cluster an empty set of rows",
            ));
        }

        let distinct_points = count_distinct_rows(data);
        let k = self.config.n_clusters.min(distinct_points);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut centroids = init_centroids_kmeans_plus_plus(data, k, &mut rng);

        let mut labels = assign(data, &centroids);
        let mut iterations = 1;
        let mut converged = false;
        while iterations < self.config.max_iter {
            update_centroids(data, &labels, &mut centroids);
            let next = assign(data, &centroids);
            iterations += 1;
            if next == labels {
                converged = true;
                break;
            }
            labels = next;
        }

        if !converged {
            log::debug!("k-means stopped after {iterations} iterations without converging");
        }

        let (labels, centroids) = relabel_by_first_appearance(&labels, &centroids);
        let distances = labels
            .iter()
            .enumerate()
            .map(|(i, &c)| squared_distance(data.row(i), centroids.row(c)))
            .collect();

        Ok(Clustering {
            labels,
            distances,
            centroids,
            requested: self.config.n_clusters,
            distinct_points,
            iterations,
            converged,
        })
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn count_distinct_rows(data: &Array2<f64>) -> usize {
    data.rows()
        .into_iter()
        .map(|row| {
            row.iter()
                // -0.0 and 0.0 are the same point
                .map(|&x| if x == 0.0 { 0u64 } else { x.to_bits() })
                .collect::<Vec<u64>>()
        })
        .collect::<AHashSet<_>>()
        .len()
}

/// Pick `k` initial centroids, each subsequent one with probability
/// proportional to its squared distance from the nearest chosen centroid.
fn init_centroids_kmeans_plus_plus(
    data: &Array2<f64>,
    k: usize,
    rng: &mut StdRng,
) -> Array2<f64> {
    if k == 0 {
        return Array2::zeros((0, data.ncols()));
    }
    let n = data.nrows();
    let mut chosen: Vec<usize> = Vec::with_capacity(k);

    chosen.push(rng.random_range(0..n));
    let mut nearest: Vec<f64> = (0..n)
        .map(|i| squared_distance(data.row(i), data.row(chosen[0])))
        .collect();

    while chosen.len() < k {
        let total: f64 = nearest.iter().sum();
        let next = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            let mut pick = None;
            for (i, &weight) in nearest.iter().enumerate() {
                cumulative += weight;
                if weight > 0.0 && cumulative >= target {
                    pick = Some(i);
                    break;
                }
            }
            // Rounding can leave the target just past the last weight.
            pick.or_else(|| nearest.iter().rposition(|&w| w > 0.0))
        } else {
            None
        };

        let Some(next) = next else {
            break;
        };
        chosen.push(next);
        for (i, d) in nearest.iter_mut().enumerate() {
            let candidate = squared_distance(data.row(i), data.row(next));
            if candidate < *d {
                *d = candidate;
            }
        }
    }

    let mut centroids = Array2::zeros((chosen.len(), data.ncols()));
    for (c, &i) in chosen.iter().enumerate() {
        centroids.row_mut(c).assign(&data.row(i));
    }
    centroids
}

/// Nearest centroid per row; ties go to the lowest centroid index.
fn assign(data: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    data.rows()
        .into_iter()
        .map(|row| {
            let mut best_cluster = 0;
            let mut best_distance = f64::INFINITY;
            for (c, centroid) in centroids.rows().into_iter().enumerate() {
                let distance = squared_distance(row, centroid);
                if distance < best_distance {
                    best_distance = distance;
                    best_cluster = c;
                }
            }
            best_cluster
        })
        .collect()
}

/// Move each centroid to the mean of its rows. Empty clusters keep their
/// previous centroid.
fn update_centroids(data: &Array2<f64>, labels: &[usize], centroids: &mut Array2<f64>) {
    let mut sums = Array2::<f64>::zeros(centroids.dim());
    let mut counts = vec![0usize; centroids.nrows()];

    for (row, &label) in data.rows().into_iter().zip(labels) {
        sums.row_mut(label).scaled_add(1.0, &row);
        counts[label] += 1;
    }

    for (c, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let mean = &sums.row(c) / count as f64;
        centroids.row_mut(c).assign(&mean);
    }
}

/// Renumber clusters in the order their first row appears. Clusters that
/// ended up empty are numbered last.
fn relabel_by_first_appearance(
    labels: &[usize],
    centroids: &Array2<f64>,
) -> (Vec<usize>, Array2<f64>) {
    let mut mapping: AHashMap<usize, usize> = AHashMap::new();
    let mut order: Vec<usize> = Vec::with_capacity(centroids.nrows());
    for &label in labels {
        if !mapping.contains_key(&label) {
            mapping.insert(label, order.len());
            order.push(label);
        }
    }
    for c in 0..centroids.nrows() {
        if !mapping.contains_key(&c) {
            mapping.insert(c, order.len());
            order.push(c);
        }
    }

    let relabelled = labels.iter().map(|l| mapping[l]).collect();
    let mut reordered = Array2::zeros(centroids.dim());
    for (new, &old) in order.iter().enumerate() {
        reordered.row_mut(new).assign(&centroids.row(old));
    }
    (relabelled, reordered)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn kmeans(n_clusters: usize, seed: u64) -> KMeans {
        KMeans::new(ClusterConfig {
            n_clusters,
            seed,
            ..ClusterConfig::default()
        })
    }

    fn blobs() -> Array2<f64> {
        array![
            [0.0, 0.1],
            [10.0, 10.0],
            [0.1, 0.0],
            [10.1, 9.9],
            [0.0, 0.0],
            [9.9, 10.1]
        ]
    }

    #[test]
    fn test_separates_blobs() {
        let clustering = kmeans(2, 42).fit(&blobs()).unwrap();

        assert_eq!(clustering.labels, vec![0, 1, 0, 1, 0, 1]);
        assert_eq!(clustering.n_clusters(), 2);
        assert_eq!(clustering.sizes(), vec![3, 3]);
        assert!(clustering.converged);
        assert!(clustering.inertia() < 0.1);
    }

    #[test]
    fn test_reproducible_with_fixed_seed() {
        let data = array![
            [0.2, 0.8],
            [0.3, 0.7],
            [0.9, 0.1],
            [0.5, 0.5],
            [0.1, 0.1],
            [0.8, 0.9],
            [0.4, 0.2]
        ];
        let a = kmeans(3, 42).fit(&data).unwrap();
        let b = kmeans(3, 42).fit(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_labels_follow_first_appearance() {
        for seed in [1, 7, 42, 1234] {
            let clustering = kmeans(2, seed).fit(&blobs()).unwrap();
            assert_eq!(clustering.labels[0], 0);
            assert_eq!(clustering.labels[1], 1);
        }
    }

    #[test]
    fn test_k_collapses_to_distinct_points() {
        let data = array![[1.0, 1.0], [1.0, 1.0], [2.0, 2.0]];
        let clustering = kmeans(10, 42).fit(&data).unwrap();

        assert_eq!(clustering.distinct_points, 2);
        assert_eq!(clustering.n_clusters(), 2);
        assert_eq!(clustering.requested, 10);
        assert_eq!(clustering.labels, vec![0, 0, 1]);
        assert!(clustering.distances.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_zero_dimensional_rows_form_one_cluster() {
        let data = Array2::<f64>::zeros((3, 0));
        let clustering = kmeans(10, 42).fit(&data).unwrap();
        assert_eq!(clustering.n_clusters(), 1);
        assert_eq!(clustering.labels, vec![0, 0, 0]);
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let centroids = array![[0.0], [2.0]];
        let data = array![[1.0]];
        assert_eq!(assign(&data, &centroids), vec![0]);
    }

    #[test]
    fn test_empty_cluster_keeps_centroid() {
        let data = array![[0.0], [1.0]];
        let mut centroids = array![[0.5], [100.0]];
        update_centroids(&data, &[0, 0], &mut centroids);
        assert_eq!(centroids, array![[0.5], [100.0]]);
    }

    #[test]
    fn test_max_iter_bounds_iterations() {
        let clustering = KMeans::new(ClusterConfig {
            n_clusters: 2,
            max_iter: 1,
            seed: 42,
        })
        .fit(&blobs())
        .unwrap();
        assert_eq!(clustering.iterations, 1);
        assert!(!clustering.converged);
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(kmeans(2, 42).fit(&Array2::zeros((0, 2))).is_err());
    }
}
