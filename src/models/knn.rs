//! K-nearest neighbors classifier.
//!
//! Euclidean distance with uniform votes. Equal distances keep training row
//! order and equal votes go to the lower class index, so predictions are
//! fully deterministic.

use super::linalg::squared_distance;
use super::{ClassSet, Classifier};
use crate::core::error::{EvalError, Result};
use ndarray::Array2;

/// Fitted KNN classifier; stores the training partition.
#[derive(Debug, Clone, PartialEq)]
pub struct KNearestNeighbors {
    neighbors: usize,
    x_train: Array2<f64>,
    y_train: Vec<usize>,
    class_set: ClassSet,
}

impl KNearestNeighbors {
    /// Store the training data; fails when `neighbors` exceeds its rows
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        class_set: ClassSet,
        neighbors: usize,
    ) -> Result<Self> {
        if neighbors > x.nrows() {
            return Err(EvalError::training(format!(
                "neighbors = {} exceeds the {} training rows",
                neighbors,
                x.nrows()
            )));
        }

        Ok(KNearestNeighbors {
            neighbors,
            x_train: x.clone(),
            y_train: y.to_vec(),
            class_set,
        })
    }

    /// Neighbor count
    pub fn neighbors(&self) -> usize {
        self.neighbors
    }

    /// Vote fractions, one column per class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let n_classes = self.class_set.len();
        let mut proba = Array2::zeros((x.nrows(), n_classes));

        for (i, query) in x.rows().into_iter().enumerate() {
            let mut distances: Vec<(f64, usize)> = self
                .x_train
                .rows()
                .into_iter()
                .enumerate()
                .map(|(r, row)| (squared_distance(row, query), r))
                .collect();
            // Stable sort keeps training order among equal distances
            distances.sort_by(|a, b| a.0.total_cmp(&b.0));

            for &(_, r) in distances.iter().take(self.neighbors) {
                proba[[i, self.y_train[r]]] += 1.0;
            }
        }

        proba / self.neighbors as f64
    }
}

impl Classifier for KNearestNeighbors {
    fn class_set(&self) -> &ClassSet {
        &self.class_set
    }

    fn n_features(&self) -> usize {
        self.x_train.ncols()
    }

    fn class_scores(&self, x: &Array2<f64>) -> Array2<f64> {
        self.predict_proba(x)
    }
}
