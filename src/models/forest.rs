//! Random forest classifier: bagged CART trees with soft voting.

use super::tree::{normalize, DecisionTree, TreeParams};
use super::{ClassSet, Classifier};
use crate::config::RandomForestParams;
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fitted random forest.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    class_set: ClassSet,
}

impl RandomForest {
    /// Fit `params.estimators` trees, each on a bootstrap sample drawn with
    /// its own generator seeded from `seed + tree index`.
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        class_set: ClassSet,
        params: &RandomForestParams,
        seed: u64,
    ) -> Self {
        let n = x.nrows();
        let n_features = x.ncols();
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let tree_params = TreeParams {
            max_features: Some(max_features),
            ..TreeParams::with_max_depth(params.max_depth)
        };

        let trees = (0..params.estimators)
            .map(|t| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(t as u64));
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, y, &rows, class_set.clone(), tree_params, &mut rng)
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Random forest fitted: {} trees, {} of {} features per split",
            trees.len(),
            max_features,
            n_features
        );

        RandomForest {
            trees,
            n_features,
            class_set,
        }
    }

    /// Fitted trees
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Mean of the per-tree normalised importances, renormalised
    pub fn feature_importances(&self) -> Array1<f64> {
        let mut total = Array1::zeros(self.n_features);
        for tree in &self.trees {
            total += &tree.feature_importances();
        }
        normalize(&total)
    }

    /// Average of the tree class distributions
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut proba = Array2::zeros((x.nrows(), self.class_set.len()));
        for tree in &self.trees {
            proba += &tree.predict_proba(x);
        }
        proba / self.trees.len().max(1) as f64
    }
}

impl Classifier for RandomForest {
    fn class_set(&self) -> &ClassSet {
        &self.class_set
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn class_scores(&self, x: &Array2<f64>) -> Array2<f64> {
        self.predict_proba(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn blobs() -> (Array2<f64>, Vec<usize>) {
        let n = 40;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let base = if i < n / 2 { 0.0 } else { 5.0 };
            base + ((i * 7 + j * 3) % 10) as f64 / 10.0
        });
        let y = (0..n).map(|i| usize::from(i >= n / 2)).collect();
        (x, y)
    }

    #[test]
    fn test_forest_separates_blobs() {
        let (x, y) = blobs();
        let params = RandomForestParams {
            estimators: 10,
            max_depth: 5,
        };
        let forest = RandomForest::fit(&x, &y, ClassSet::for_tests(2), &params, 42);
        assert_eq!(forest.trees().len(), 10);

        let predicted = forest.predict(&x);
        let correct = predicted.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert_eq!(correct, y.len());

        let proba = forest.predict_proba(&x);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
        assert!((forest.feature_importances().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (x, y) = blobs();
        let params = RandomForestParams {
            estimators: 5,
            max_depth: 3,
        };
        let a = RandomForest::fit(&x, &y, ClassSet::for_tests(2), &params, 42);
        let b = RandomForest::fit(&x, &y, ClassSet::for_tests(2), &params, 42);
        assert_eq!(a, b);
    }
}
