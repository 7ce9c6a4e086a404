//! CART classification tree.
//!
//! Splits minimise the weighted Gini impurity of the children, with
//! thresholds at midpoints between consecutive distinct feature values.
//! Nodes live in a flat arena (root at index 0) so the fitted tree can be
//! handed to a renderer as a node list without further conversion.

use super::linalg::argmax;
use super::{ClassSet, Classifier};
use crate::core::types::RowIndex;
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Split rule of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRule {
    /// Feature column tested
    pub feature: usize,
    /// Rows with `x[feature] <= threshold` go left
    pub threshold: f64,
    /// Arena index of the left child
    pub left: usize,
    /// Arena index of the right child
    pub right: usize,
}

/// A node of a fitted tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Distance from the root
    pub depth: usize,
    /// Training rows reaching this node
    pub samples: usize,
    /// Per-class training row counts
    pub class_counts: Vec<usize>,
    /// Gini impurity of the node
    pub gini: f64,
    /// `None` for leaves
    pub split: Option<SplitRule>,
}

impl TreeNode {
    /// Whether this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    /// Majority class (local index), lowest index on ties
    pub fn majority_class(&self) -> usize {
        let counts: Array1<f64> = self.class_counts.iter().map(|&c| c as f64).collect();
        argmax(counts.view())
    }
}

/// Growth limits of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth of any leaf
    pub max_depth: usize,
    /// Minimum rows required to split a node
    pub min_samples_split: usize,
    /// Minimum rows in each child
    pub min_samples_leaf: usize,
    /// Features drawn per split; all features when `None`
    pub max_features: Option<usize>,
}

impl TreeParams {
    /// Default limits with the given depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        TreeParams {
            max_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// Fitted CART classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    n_classes: usize,
    /// Unnormalised impurity decrease per feature
    raw_importances: Array1<f64>,
    class_set: ClassSet,
}

impl DecisionTree {
    /// Grow a tree on `rows` of `x` (repeats allowed, as in a bootstrap sample).
    ///
    /// `y` holds local class indices in `0..class_set.len()`.
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        rows: &[RowIndex],
        class_set: ClassSet,
        params: TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut builder = Builder {
            x,
            y,
            params,
            n_classes: class_set.len(),
            nodes: Vec::new(),
            importances: Array1::zeros(x.ncols()),
            rng,
        };
        builder.grow(rows.to_vec(), 0);

        DecisionTree {
            nodes: builder.nodes,
            n_features: x.ncols(),
            n_classes: class_set.len(),
            raw_importances: builder.importances,
            class_set,
        }
    }

    /// Nodes in arena order; index 0 is the root
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Depth of the deepest leaf
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Number of leaves
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Impurity-decrease importances normalised to sum to one
    pub fn feature_importances(&self) -> Array1<f64> {
        normalize(&self.raw_importances)
    }

    fn leaf_for(&self, row: ArrayView1<'_, f64>) -> &TreeNode {
        let mut node = &self.nodes[0];
        while let Some(rule) = node.split {
            node = if row[rule.feature] <= rule.threshold {
                &self.nodes[rule.left]
            } else {
                &self.nodes[rule.right]
            };
        }
        node
    }

    /// Leaf class distributions, one row per sample
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            let leaf = self.leaf_for(row);
            for (c, &count) in leaf.class_counts.iter().enumerate() {
                proba[[i, c]] = count as f64 / leaf.samples as f64;
            }
        }
        proba
    }
}

impl Classifier for DecisionTree {
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

pub(crate) fn normalize(values: &Array1<f64>) -> Array1<f64> {
    let total: f64 = values.sum();
    if total > 0.0 {
        values / total
    } else {
        values.clone()
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

struct Builder<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    params: TreeParams,
    n_classes: usize,
    nodes: Vec<TreeNode>,
    importances: Array1<f64>,
    rng: &'a mut ChaCha8Rng,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

impl Builder<'_> {
    fn grow(&mut self, rows: Vec<RowIndex>, depth: usize) -> usize {
        let mut class_counts = vec![0usize; self.n_classes];
        for &r in &rows {
            class_counts[self.y[r]] += 1;
        }
        let samples = rows.len();
        let node_gini = gini(&class_counts, samples);

        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            depth,
            samples,
            class_counts: class_counts.clone(),
            gini: node_gini,
            split: None,
        });

        let stop = depth >= self.params.max_depth
            || samples < self.params.min_samples_split
            || samples < 2 * self.params.min_samples_leaf
            || node_gini <= 0.0;
        if stop {
            return id;
        }

        let Some(best) = self.best_split(&rows, &class_counts, node_gini) else {
            return id;
        };

        let (left_rows, right_rows): (Vec<RowIndex>, Vec<RowIndex>) = rows
            .iter()
            .copied()
            .partition(|&r| self.x[[r, best.feature]] <= best.threshold);

        self.importances[best.feature] += best.decrease;

        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[id].split = Some(SplitRule {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        });
        id
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.x.ncols();
        match self.params.max_features {
            Some(k) if k < n_features => {
                let mut drawn = sample(&mut *self.rng, n_features, k).into_vec();
                drawn.sort_unstable();
                drawn
            }
            _ => (0..n_features).collect(),
        }
    }

    /// Best split by weighted impurity decrease `n·g − n_l·g_l − n_r·g_r`.
    fn best_split(
        &mut self,
        rows: &[RowIndex],
        parent_counts: &[usize],
        node_gini: f64,
    ) -> Option<Candidate> {
        let n = rows.len();
        let min_leaf = self.params.min_samples_leaf;
        let mut best: Option<Candidate> = None;

        for feature in self.candidate_features() {
            let mut sorted: Vec<RowIndex> = rows.to_vec();
            sorted.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left_counts = vec![0usize; self.n_classes];
            for pos in 0..n - 1 {
                left_counts[self.y[sorted[pos]]] += 1;

                let here = self.x[[sorted[pos], feature]];
                let next = self.x[[sorted[pos + 1], feature]];
                if here >= next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_counts: Vec<usize> = parent_counts
                    .iter()
                    .zip(&left_counts)
                    .map(|(p, l)| p - l)
                    .collect();
                let decrease = n as f64 * node_gini
                    - n_left as f64 * gini(&left_counts, n_left)
                    - n_right as f64 * gini(&right_counts, n_right);

                let better = match &best {
                    Some(b) => decrease > b.decrease + 1e-12,
                    None => decrease > 1e-12,
                };
                if better {
                    let mut threshold = (here + next) / 2.0;
                    // Midpoint of adjacent floats can round up to `next`
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(Candidate {
                        feature,
                        threshold,
                        decrease,
                    });
                }
            }
        }

        best
    }
}
