//! Principal component analysis by seeded power iteration.
//!
//! The data is centered, the smaller of the two Gram matrices (`XᵀX` or
//! `XXᵀ`) is decomposed one eigenpair at a time with deflation, and the
//! resulting axes are sign-fixed so repeated fits give identical output.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ReducerConfig;
use crate::error::{Result, SentiscopeError};

/// Eigenvalues below this fraction of the Gram trace are treated as zero.
const ZERO_EIGENVALUE_RATIO: f64 = 1e-10;

/// A fitted projection onto principal axes.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaModel {
    /// Column means of the fitted data.
    pub mean: Array1<f64>,
    /// Principal axes, one per row, unit length.
    pub components: Array2<f64>,
    /// Variance of the fitted data along each axis.
    pub explained_variance: Array1<f64>,
    /// Share of the total variance along each axis.
    pub explained_variance_ratio: Array1<f64>,
}

impl PcaModel {
    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Project rows onto the principal axes.
    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        if data.ncols() != self.n_features() {
            return Err(SentiscopeError::invalid_argument(format!(
                "expected {} features, got {}",
                self.n_features(),
                data.ncols()
            )));
        }
        let centered = data - &self.mean;
        Ok(centered.dot(&self.components.t()))
    }
}

/// Result of fitting PCA on a batch.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub model: PcaModel,
    /// The fitted rows in the reduced space.
    pub projected: Array2<f64>,
    /// Components asked for.
    pub requested: usize,
    /// `min(requested, rows - 1, features)`.
    pub rank_limit: usize,
    /// Components discarded because their variance was numerically zero.
    pub dropped: usize,
}

impl Reduction {
    /// Number of components actually kept.
    pub fn n_components(&self) -> usize {
        self.model.n_components()
    }
}

/// Principal component analysis.
#[derive(Debug, Clone)]
pub struct Pca {
    config: ReducerConfig,
}

impl Pca {
    pub fn new(config: ReducerConfig) -> Self {
        Pca { config }
    }

    /// Fit the principal axes of `data` and project it onto them.
    pub fn fit_transform(&self, data: &Array2<f64>) -> Result<Reduction> {
        let (n_samples, n_features) = data.dim();
        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| SentiscopeError::invalid_argument("cannot fit PCA on zero rows"))?;
        let centered = data - &mean;

        let rank_limit = self
            .config
            .n_components
            .min(n_samples.saturating_sub(1))
            .min(n_features);

        let use_features = n_features <= n_samples;
        let gram = if use_features {
            centered.t().dot(&centered)
        } else {
            centered.dot(&centered.t())
        };
        let total: f64 = gram.diag().sum();
        let eigen = self.eigenpairs(gram, rank_limit, total);

        let k = eigen.len();
        let mut components = Array2::zeros((k, n_features));
        let mut eigenvalues = Array1::zeros(k);
        for (i, (eigenvalue, vector)) in eigen.into_iter().enumerate() {
            let mut axis = if use_features {
                vector
            } else {
                centered.t().dot(&vector) / eigenvalue.sqrt()
            };
            fix_sign(&mut axis);
            components.row_mut(i).assign(&axis);
            eigenvalues[i] = eigenvalue;
        }

        let denominator = (n_samples.max(2) - 1) as f64;
        let explained_variance = &eigenvalues / denominator;
        let explained_variance_ratio = if total > 0.0 {
            &eigenvalues / total
        } else {
            Array1::zeros(k)
        };

        let projected = centered.dot(&components.t());
        log::debug!(
            "PCA fit {n_samples}x{n_features}: kept {k} of {} components (limit {rank_limit})",
            self.config.n_components
        );

        Ok(Reduction {
            model: PcaModel {
                mean,
                components,
                explained_variance,
                explained_variance_ratio,
            },
            projected,
            requested: self.config.n_components,
            rank_limit,
            dropped: rank_limit - k,
        })
    }

    /// Leading eigenpairs of a symmetric positive semi-definite matrix.
    fn eigenpairs(
        &self,
        mut gram: Array2<f64>,
        count: usize,
        trace: f64,
    ) -> Vec<(f64, Array1<f64>)> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let threshold = trace.abs() * ZERO_EIGENVALUE_RATIO;
        let mut pairs = Vec::with_capacity(count);

        for _ in 0..count {
            let (eigenvalue, vector) = power_iteration(
                &gram,
                &pairs,
                &mut rng,
                self.config.max_iter,
                self.config.tolerance,
            );
            if eigenvalue.is_nan() || eigenvalue <= threshold {
                break;
            }

            // A = A - λ v vᵀ
            let column = vector.view().insert_axis(Axis(1));
            let row = vector.view().insert_axis(Axis(0));
            gram = gram - eigenvalue * column.dot(&row);
            pairs.push((eigenvalue, vector));
        }

        pairs
    }
}

/// Largest eigenvalue and its unit eigenvector, orthogonal to `found`.
///
/// Starts from a seeded random vector: a centered Gram matrix has the
/// all-ones vector in its null space, so a uniform start would stall.
fn power_iteration(
    matrix: &Array2<f64>,
    found: &[(f64, Array1<f64>)],
    rng: &mut StdRng,
    max_iter: usize,
    tolerance: f64,
) -> (f64, Array1<f64>) {
    let n = matrix.nrows();
    let mut v: Array1<f64> = (0..n).map(|_| rng.random_range(-1.0..1.0)).collect();
    orthogonalize(&mut v, found);
    let norm = v.dot(&v).sqrt();
    if norm <= f64::EPSILON {
        return (0.0, v);
    }
    v /= norm;

    for _ in 0..max_iter {
        let mut next = matrix.dot(&v);
        orthogonalize(&mut next, found);
        let norm = next.dot(&next).sqrt();
        if norm <= f64::EPSILON {
            return (0.0, v);
        }
        next /= norm;

        let delta = (&next - &v).fold(0.0f64, |max, &x| max.max(x.abs()));
        v = next;
        if delta <= tolerance {
            break;
        }
    }

    let rayleigh = v.dot(&matrix.dot(&v));
    (rayleigh, v)
}

/// Remove the components of `v` along already extracted eigenvectors.
fn orthogonalize(v: &mut Array1<f64>, found: &[(f64, Array1<f64>)]) {
    for (_, u) in found {
        let projection = v.dot(u);
        v.scaled_add(-projection, u);
    }
}

/// Flip an axis so its largest-magnitude loading is positive.
fn fix_sign(axis: &mut Array1<f64>) {
    let mut pivot = 0.0f64;
    for &value in axis.iter() {
        if value.abs() > pivot.abs() {
            pivot = value;
        }
    }
    if pivot < 0.0 {
        axis.mapv_inplace(|x| -x);
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn pca(n_components: usize) -> Pca {
        Pca::new(ReducerConfig {
            n_components,
            max_iter: 10_000,
            tolerance: 1e-13,
            ..ReducerConfig::default()
        })
    }

    fn distance(a: ndarray::ArrayView1<f64>, b: ndarray::ArrayView1<f64>) -> f64 {
        (&a - &b).mapv(|x| x * x).sum().sqrt()
    }

    #[test]
    fn test_collinear_data_has_one_component() {
        let data = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let reduction = pca(10).fit_transform(&data).unwrap();

        assert_eq!(reduction.rank_limit, 2);
        assert_eq!(reduction.n_components(), 1);
        assert_eq!(reduction.dropped, 1);

        let axis = reduction.model.components.row(0);
        let expected = 1.0 / 5.0f64.sqrt();
        assert!((axis[0] - expected).abs() < 1e-6);
        assert!((axis[1] - 2.0 * expected).abs() < 1e-6);
        assert!((reduction.model.explained_variance_ratio[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rank_limit_by_sample_count() {
        let data = array![[1.0, 0.0, 0.0, 2.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 1.0]];
        let reduction = pca(10).fit_transform(&data).unwrap();

        assert_eq!(reduction.requested, 10);
        assert_eq!(reduction.rank_limit, 2);
        assert_eq!(reduction.projected.dim(), (3, 2));
    }

    #[test]
    fn test_wide_data_preserves_distances() {
        // More features than samples goes through the sample Gram matrix.
        let data = array![
            [0.5, 0.0, 0.5, 0.0, 0.7],
            [0.0, 0.9, 0.1, 0.0, 0.0],
            [0.3, 0.3, 0.0, 0.8, 0.1],
            [0.0, 0.0, 0.0, 0.2, 0.9]
        ];
        let reduction = pca(10).fit_transform(&data).unwrap();
        assert_eq!(reduction.n_components(), 3);

        for i in 0..4 {
            for j in 0..4 {
                let original = distance(data.row(i), data.row(j));
                let reduced = distance(reduction.projected.row(i), reduction.projected.row(j));
                assert!((original - reduced).abs() < 1e-6, "rows {i} and {j}");
            }
        }
    }

    #[test]
    fn test_axes_are_orthonormal_and_sign_fixed() {
        let data = array![
            [2.0, 0.0, 1.0],
            [0.0, 1.0, 3.0],
            [1.0, 1.0, 0.0],
            [3.0, 2.0, 1.0],
            [0.0, 0.0, 2.0]
        ];
        let model = pca(3).fit_transform(&data).unwrap().model;
        let gram = model.components.dot(&model.components.t());

        for i in 0..model.n_components() {
            for j in 0..model.n_components() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((gram[[i, j]] - expected).abs() < 1e-6);
            }
            let row = model.components.row(i);
            let pivot = row
                .iter()
                .copied()
                .fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
            assert!(pivot > 0.0);
        }
        for pair in model.explained_variance.as_slice().unwrap().windows(2) {
            assert!(pair[0] >= pair[1] - 1e-9);
        }
    }

    #[test]
    fn test_transform_matches_fit_projection() {
        let data = array![[1.0, 0.5, 0.0], [0.0, 1.0, 0.5], [0.5, 0.0, 1.0], [1.0, 1.0, 1.0]];
        let reduction = pca(2).fit_transform(&data).unwrap();
        let transformed = reduction.model.transform(&data).unwrap();

        for (a, b) in transformed.iter().zip(reduction.projected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!(reduction.model.transform(&array![[1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let data = array![[0.1, 0.9, 0.0], [0.8, 0.1, 0.3], [0.4, 0.4, 0.4], [0.0, 0.2, 0.9]];
        let a = pca(2).fit_transform(&data).unwrap();
        let b = pca(2).fit_transform(&data).unwrap();
        assert_eq!(a.model, b.model);
        assert_eq!(a.projected, b.projected);
    }

    #[test]
    fn test_identical_rows_have_no_components() {
        let data = array![[1.0, 2.0], [1.0, 2.0], [1.0, 2.0]];
        let reduction = pca(10).fit_transform(&data).unwrap();
        assert_eq!(reduction.n_components(), 0);
        assert_eq!(reduction.projected.dim(), (3, 0));
    }

    #[test]
    fn test_single_row() {
        let reduction = pca(10).fit_transform(&array![[0.3, 0.7]]).unwrap();
        assert_eq!(reduction.rank_limit, 0);
        assert_eq!(reduction.projected.dim(), (1, 0));
    }

    #[test]
    fn test_zero_rows_fail() {
        let data = Array2::<f64>::zeros((0, 3));
        assert!(pca(2).fit_transform(&data).is_err());
    }
}
