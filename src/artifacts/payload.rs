//! Renderer-neutral chart data and the statistics behind it.
//!
//! Every builder returns `Result` so the generator can drop an artifact whose
//! data is undefined without failing the run.

use crate::core::constants::{
    DECISION_BOUNDARY_PADDING, DECISION_BOUNDARY_RESOLUTION, DENSITY_GRID_POINTS,
};
use crate::core::error::{EvalError, Result};
use crate::core::types::ClassIndex;
use crate::models::{Classifier, DecisionTree, Predictions, TrainedModel};
use ndarray::{Array1, Array2, ArrayView1};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Number of bandwidths the density grid extends past the data.
const DENSITY_GRID_CUT: f64 = 3.0;

/// Whisker reach in interquartile ranges.
const TUKEY_WHISKER: f64 = 1.5;

/// Named vector of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    /// Legend entry
    pub name: String,
    /// Values in row order
    pub values: Vec<f64>,
}

/// Gaussian kernel density estimate of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensitySeries {
    /// Legend entry
    pub name: String,
    /// Kernel bandwidth
    pub bandwidth: f64,
    /// Evaluation points
    pub grid: Vec<f64>,
    /// Density at each grid point
    pub density: Vec<f64>,
}

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    /// First quartile
    pub q1: f64,
    /// Median
    pub median: f64,
    /// Third quartile
    pub q3: f64,
    /// Lowest value within `q1 - 1.5 IQR`
    pub whisker_low: f64,
    /// Highest value within `q3 + 1.5 IQR`
    pub whisker_high: f64,
    /// Values beyond the whiskers
    pub outliers: Vec<f64>,
}

/// One node of a rendered decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNodeView {
    /// Arena index; the root is 0
    pub id: usize,
    /// Distance from the root
    pub depth: usize,
    /// Split feature name, `None` for leaves
    pub feature: Option<String>,
    /// Split threshold; rows with `value <= threshold` go left
    pub threshold: Option<f64>,
    /// Gini impurity
    pub gini: f64,
    /// Training rows reaching the node
    pub samples: usize,
    /// Training rows per fitted class
    pub class_counts: Vec<usize>,
    /// Label of the majority class
    pub predicted: String,
    /// Left child id
    pub left: Option<usize>,
    /// Right child id
    pub right: Option<usize>,
}

/// Chart data, tagged by shape so a renderer can dispatch on `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// Count matrix, rows actual and columns predicted
    ConfusionMatrix {
        /// Row and column labels
        labels: Vec<String>,
        /// Counts
        counts: Array2<usize>,
    },
    /// Line through `(x, y)` points
    Curve {
        /// Abscissae
        x: Vec<f64>,
        /// Ordinates
        y: Vec<f64>,
        /// Score threshold per point, where defined
        thresholds: Vec<f64>,
        /// Area under the curve
        area: Option<f64>,
        /// Whether the chance diagonal is drawn
        diagonal: bool,
    },
    /// Density curves, one per group
    Density {
        /// One curve per true class
        series: Vec<DensitySeries>,
    },
    /// Predicted class over a grid of the two feature axes
    DecisionBoundary {
        /// Feature names of the two axes
        features: [String; 2],
        /// Grid coordinates along the first feature
        x_grid: Vec<f64>,
        /// Grid coordinates along the second feature
        y_grid: Vec<f64>,
        /// Predicted class index at `[y, x]`
        predicted: Array2<ClassIndex>,
        /// Training points
        points: Array2<f64>,
        /// Class index of each training point
        point_classes: Vec<ClassIndex>,
        /// Labels of the class indices
        class_labels: Vec<String>,
    },
    /// Labelled bars
    Bars {
        /// Bar labels
        categories: Vec<String>,
        /// Bar heights
        values: Vec<f64>,
    },
    /// Flattened decision tree
    Tree {
        /// Nodes in arena order
        nodes: Vec<TreeNodeView>,
    },
    /// Point cloud with an optional `y = x` reference segment
    Scatter {
        /// Abscissae
        x: Vec<f64>,
        /// Ordinates
        y: Vec<f64>,
        /// Endpoints of the reference segment
        reference: Option<(f64, f64)>,
    },
    /// Binned counts
    Histogram {
        /// Bin edges, one more than the counts
        edges: Vec<f64>,
        /// Values per bin
        counts: Vec<usize>,
    },
    /// Box and whiskers
    Boxplot {
        /// Summary of the plotted values
        stats: BoxStats,
    },
    /// Series drawn against their row index
    Series {
        /// Overlaid series
        series: Vec<NamedSeries>,
    },
    /// Target against each feature, actual as points and predicted as a line
    FeatureScatter {
        /// Feature values, one series per feature
        features: Vec<NamedSeries>,
        /// Actual target values
        actual: Vec<f64>,
        /// Predicted target values
        predicted: Vec<f64>,
    },
}

impl Payload {
    /// Confusion counts with their labels
    pub fn confusion_matrix(cm: &crate::metrics::ConfusionMatrix) -> Self {
        Payload::ConfusionMatrix {
            labels: cm.labels.clone(),
            counts: cm.matrix.clone(),
        }
    }

    /// Bars for one value per feature
    pub fn feature_bars(feature_names: &[String], values: ArrayView1<'_, f64>) -> Result<Self> {
        if feature_names.len() != values.len() {
            return Err(EvalError::shape_mismatch(
                format!("{} values", feature_names.len()),
                format!("{} values", values.len()),
            ));
        }
        Ok(Payload::Bars {
            categories: feature_names.to_vec(),
            values: values.to_vec(),
        })
    }

    /// Scatter of `actual` against `predicted` with the diagonal over the actual range
    pub fn actual_vs_predicted(actual: &Array1<f64>, predicted: &Array1<f64>) -> Result<Self> {
        let (lo, hi) = min_max(actual.view())
            .ok_or_else(|| EvalError::undefined_metric("actual_vs_predicted", "no test rows"))?;
        Ok(Payload::Scatter {
            x: actual.to_vec(),
            y: predicted.to_vec(),
            reference: Some((lo, hi)),
        })
    }

    /// Flattened view of a fitted tree
    pub fn tree(tree: &DecisionTree, feature_names: &[String]) -> Self {
        let class_set = tree.class_set();
        let nodes = tree
            .nodes()
            .iter()
            .enumerate()
            .map(|(id, node)| {
                let split = node.split.as_ref();
                let predicted = class_set.global(node.majority_class());
                TreeNodeView {
                    id,
                    depth: node.depth,
                    feature: split.map(|s| {
                        feature_names
                            .get(s.feature)
                            .cloned()
                            .unwrap_or_else(|| format!("x[{}]", s.feature))
                    }),
                    threshold: split.map(|s| s.threshold),
                    gini: node.gini,
                    samples: node.samples,
                    class_counts: node.class_counts.clone(),
                    predicted: class_set
                        .labels()
                        .get(predicted)
                        .cloned()
                        .unwrap_or_else(|| predicted.to_string()),
                    left: split.map(|s| s.left),
                    right: split.map(|s| s.right),
                }
            })
            .collect();
        Payload::Tree { nodes }
    }
}

/// Smallest and largest value, `None` when empty.
pub fn min_max(values: ArrayView1<'_, f64>) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Linearly interpolated quantile of sorted values.
pub fn quantile<T: Float>(sorted: &[T], q: T) -> Option<T> {
    if sorted.is_empty() {
        return None;
    }
    let last = T::from(sorted.len() - 1)?;
    let position = q * last;
    let lower = position.floor();
    let fract = position - lower;
    let index = lower.to_usize()?;
    let value = sorted[index];
    Some(match sorted.get(index + 1) {
        Some(&next) if fract > T::zero() => value * (T::one() - fract) + next * fract,
        _ => value,
    })
}

/// Gaussian KDE with Scott's rule bandwidth `σ · n^(-1/5)`.
///
/// Undefined for fewer than two values or values without spread.
pub fn gaussian_kde<S: Into<String>>(name: S, values: &[f64]) -> Result<DensitySeries> {
    let name = name.into();
    let n = values.len();
    if n < 2 {
        return Err(EvalError::undefined_metric(
            "class_density",
            format!("class '{}' has {} value(s)", name, n),
        ));
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let bandwidth = variance.sqrt() * (n as f64).powf(-0.2);
    if !(bandwidth > 0.0) {
        return Err(EvalError::undefined_metric(
            "class_density",
            format!("class '{}' has no spread", name),
        ));
    }

    let (lo, hi) = min_max(ArrayView1::from(values))
        .ok_or_else(|| EvalError::undefined_metric("class_density", "no values"))?;
    let grid = Array1::linspace(
        lo - DENSITY_GRID_CUT * bandwidth,
        hi + DENSITY_GRID_CUT * bandwidth,
        DENSITY_GRID_POINTS,
    );
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let density = grid
        .iter()
        .map(|&g| {
            values
                .iter()
                .map(|&v| (-0.5 * ((g - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm
        })
        .collect();

    Ok(DensitySeries {
        name,
        bandwidth,
        grid: grid.to_vec(),
        density,
    })
}

/// Equal-width histogram over the value range; the last bin is closed.
pub fn histogram(values: ArrayView1<'_, f64>, bins: usize) -> Result<Payload> {
    let (mut lo, mut hi) = min_max(values)
        .ok_or_else(|| EvalError::undefined_metric("histogram", "no values"))?;
    if bins == 0 || !lo.is_finite() || !hi.is_finite() {
        return Err(EvalError::undefined_metric("histogram", "no finite range"));
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for &v in values {
        let bin = (((v - lo) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    Ok(Payload::Histogram { edges, counts })
}

/// Quartiles, Tukey whiskers and outliers.
pub fn box_stats(values: ArrayView1<'_, f64>) -> Result<BoxStats> {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let undefined = || EvalError::undefined_metric("boxplot", "no values");

    let q1 = quantile(&sorted, 0.25).ok_or_else(undefined)?;
    let median = quantile(&sorted, 0.5).ok_or_else(undefined)?;
    let q3 = quantile(&sorted, 0.75).ok_or_else(undefined)?;
    let reach = TUKEY_WHISKER * (q3 - q1);
    let (low_fence, high_fence) = (q1 - reach, q3 + reach);

    let (inside, outliers): (Vec<f64>, Vec<f64>) = sorted
        .iter()
        .copied()
        .partition(|&v| v >= low_fence && v <= high_fence);
    let whisker_low = inside.first().copied().unwrap_or(q1);
    let whisker_high = inside.last().copied().unwrap_or(q3);

    Ok(BoxStats {
        q1,
        median,
        q3,
        whisker_low,
        whisker_high,
        outliers,
    })
}

/// Predicted classes over a grid spanning the training range of two features.
pub fn decision_boundary(
    model: &TrainedModel,
    feature_names: &[String],
    x_train: &Array2<f64>,
    y_train: &[ClassIndex],
    class_labels: &[String],
) -> Result<Payload> {
    if x_train.ncols() != 2 || feature_names.len() != 2 {
        return Err(EvalError::shape_mismatch(
            "2 features",
            format!("{} features", x_train.ncols()),
        ));
    }

    let axis = |col: usize| -> Result<Vec<f64>> {
        let (lo, hi) = min_max(x_train.column(col))
            .ok_or_else(|| EvalError::undefined_metric("decision_boundary", "no training rows"))?;
        Ok(Array1::linspace(
            lo - DECISION_BOUNDARY_PADDING,
            hi + DECISION_BOUNDARY_PADDING,
            DECISION_BOUNDARY_RESOLUTION,
        )
        .to_vec())
    };
    let x_grid = axis(0)?;
    let y_grid = axis(1)?;

    let grid = Array2::from_shape_fn((y_grid.len() * x_grid.len(), 2), |(i, j)| {
        if j == 0 {
            x_grid[i % x_grid.len()]
        } else {
            y_grid[i / x_grid.len()]
        }
    });
    let predicted = match model.predict(&grid)? {
        Predictions::Classes(c) => c,
        Predictions::Values(_) => {
            return Err(EvalError::undefined_metric(
                "decision_boundary",
                "model does not predict classes",
            ))
        }
    };
    let predicted = Array2::from_shape_vec((y_grid.len(), x_grid.len()), predicted)
        .map_err(|e| EvalError::shape_mismatch("grid of predictions", e.to_string()))?;

    Ok(Payload::DecisionBoundary {
        features: [feature_names[0].clone(), feature_names[1].clone()],
        x_grid,
        y_grid,
        predicted,
        points: x_train.clone(),
        point_classes: y_train.to_vec(),
        class_labels: class_labels.to_vec(),
    })
}
