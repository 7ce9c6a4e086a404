//! Hyperparameter bounds, defaults and fixed pipeline settings.
//!
//! The ranges mirror the controls offered to the user when a model is
//! configured; the split settings are fixed so that repeated runs over the
//! same dataset reproduce the same partition.

/// Fraction of rows held out for evaluation.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Seed for the train/test permutation and for every seeded estimator.
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Minimum number of rows each partition must receive.
pub const MIN_PARTITION_ROWS: usize = 2;

/// Default random forest tree count.
pub const DEFAULT_ESTIMATORS: i64 = 10;
/// Inclusive range of the random forest tree count.
pub const ESTIMATORS_RANGE: (i64, i64) = (1, 100);

/// Default tree depth limit, shared by the random forest and the decision tree.
pub const DEFAULT_MAX_DEPTH: i64 = 10;
/// Inclusive range of the tree depth limit.
pub const MAX_DEPTH_RANGE: (i64, i64) = (1, 20);

/// Default inverse regularization strength for logistic regression and SVM.
pub const DEFAULT_C: f64 = 1.0;
/// Inclusive range of the inverse regularization strength.
pub const C_RANGE: (f64, f64) = (0.01, 10.0);

/// Default KNN neighbor count.
pub const DEFAULT_NEIGHBORS: i64 = 5;
/// Inclusive range of the KNN neighbor count.
pub const NEIGHBORS_RANGE: (i64, i64) = (1, 20);

/// Degree of the polynomial SVM kernel.
pub const POLY_KERNEL_DEGREE: i32 = 3;

/// SMO stopping tolerance on the KKT conditions.
pub const SVM_TOLERANCE: f64 = 1e-3;

/// Upper bound on SMO sweeps over the training set.
pub const SVM_MAX_SWEEPS: usize = 1000;

/// Newton iterations allowed for logistic regression.
pub const LOGISTIC_MAX_ITER: usize = 100;

/// Convergence threshold on the Newton step norm.
pub const LOGISTIC_TOLERANCE: f64 = 1e-8;

/// Rows of the test partition shown in the feature-vs-target chart.
pub const FEATURE_SCATTER_ROW_LIMIT: usize = 100;

/// Bins of the regression error histogram.
pub const ERROR_HISTOGRAM_BINS: usize = 30;

/// Evaluation points of each class density curve.
pub const DENSITY_GRID_POINTS: usize = 100;

/// Grid resolution (per axis) of the decision boundary surface.
pub const DECISION_BOUNDARY_RESOLUTION: usize = 50;

/// Padding added around the training range of the decision boundary grid.
pub const DECISION_BOUNDARY_PADDING: f64 = 1.0;

/// Decimal places used when metrics are rendered for presentation.
pub const DISPLAY_PRECISION: usize = 2;

/// Tokens treated as missing when reading CSV cells (compared case-insensitively).
pub const MISSING_VALUE_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none"];
