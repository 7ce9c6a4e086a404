//! Per-variant hyperparameter records.
//!
//! A [`ModelSpec`] is built once from the raw values a user supplied
//! ([`HyperParameters`]), validated against the declared ranges and then
//! passed around immutably. Each variant owns exactly the hyperparameters
//! its estimator understands.

use crate::core::constants::*;
use crate::core::error::{EvalError, Result};
use crate::core::types::{ModelKind, SvmKernel, TaskType};
use serde::{Deserialize, Serialize};

/// Raw hyperparameter values as supplied by a caller.
///
/// Every field is optional; unset fields take their defaults during
/// [`ModelSpec::resolve`]. Values irrelevant to the selected kind are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperParameters {
    /// Number of trees in a random forest
    pub estimators: Option<i64>,
    /// Depth limit of tree based models
    pub max_depth: Option<i64>,
    /// Inverse regularization strength
    pub c: Option<f64>,
    /// SVM kernel name
    pub kernel: Option<String>,
    /// KNN neighbor count
    pub neighbors: Option<i64>,
}

impl HyperParameters {
    /// Take each unset value from `fallback`
    pub fn or(self, fallback: HyperParameters) -> Self {
        HyperParameters {
            estimators: self.estimators.or(fallback.estimators),
            max_depth: self.max_depth.or(fallback.max_depth),
            c: self.c.or(fallback.c),
            kernel: self.kernel.or(fallback.kernel),
            neighbors: self.neighbors.or(fallback.neighbors),
        }
    }
}

impl From<&ModelSpec> for HyperParameters {
    fn from(spec: &ModelSpec) -> Self {
        let mut params = HyperParameters::default();
        match spec {
            ModelSpec::RandomForest(p) => {
                params.estimators = Some(p.estimators as i64);
                params.max_depth = Some(p.max_depth as i64);
            }
            ModelSpec::LogisticRegression(p) => params.c = Some(p.c),
            ModelSpec::Svm(p) => {
                params.c = Some(p.c);
                params.kernel = Some(p.kernel.to_string());
            }
            ModelSpec::Knn(p) => params.neighbors = Some(p.neighbors as i64),
            ModelSpec::DecisionTree(p) => params.max_depth = Some(p.max_depth as i64),
            ModelSpec::LinearRegression => {}
        }
        params
    }
}

/// Random forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestParams {
    /// Number of trees, in [1, 100]
    pub estimators: usize,
    /// Depth limit of every tree, in [1, 20]
    pub max_depth: usize,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            estimators: DEFAULT_ESTIMATORS as usize,
            max_depth: DEFAULT_MAX_DEPTH as usize,
        }
    }
}

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticRegressionParams {
    /// Inverse L2 strength, in [0.01, 10.0]
    pub c: f64,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self { c: DEFAULT_C }
    }
}

/// Support vector classifier hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmParams {
    /// Box constraint, in [0.01, 10.0]
    pub c: f64,
    /// Kernel function
    pub kernel: SvmKernel,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: DEFAULT_C,
            kernel: SvmKernel::default(),
        }
    }
}

/// K-nearest neighbors hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnParams {
    /// Neighbor count, in [1, 20]
    pub neighbors: usize,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self {
            neighbors: DEFAULT_NEIGHBORS as usize,
        }
    }
}

/// Decision tree hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionTreeParams {
    /// Depth limit, in [1, 20]
    pub max_depth: usize,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH as usize,
        }
    }
}

/// Serialized form of a [`ModelSpec`]: the variant tag next to raw values.
///
/// Files are decoded into this record first so the tag goes through
/// [`ModelKind::from_str`](std::str::FromStr) and the values through
/// [`ModelSpec::resolve`], keeping their error kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Variant tag, e.g. `"random_forest"` or `"K-Nearest Neighbors"`
    pub kind: String,
    /// Hyperparameters next to the tag
    #[serde(flatten)]
    pub params: HyperParameters,
}

impl TryFrom<ModelRecord> for ModelSpec {
    type Error = EvalError;

    fn try_from(record: ModelRecord) -> Result<Self> {
        let kind = record.kind.parse::<ModelKind>()?;
        ModelSpec::resolve(kind, &record.params)
    }
}

/// Model selection together with its hyperparameter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", try_from = "ModelRecord")]
pub enum ModelSpec {
    /// Bagged CART ensemble
    RandomForest(RandomForestParams),
    /// L2-regularized logistic regression
    LogisticRegression(LogisticRegressionParams),
    /// Kernel support vector classifier
    Svm(SvmParams),
    /// K-nearest neighbors classifier
    Knn(KnnParams),
    /// Single CART tree
    DecisionTree(DecisionTreeParams),
    /// Ordinary least squares
    LinearRegression,
}

impl Default for ModelSpec {
    fn default() -> Self {
        ModelSpec::RandomForest(RandomForestParams::default())
    }
}

impl ModelSpec {
    /// Build and validate the record for `kind` from raw values.
    pub fn resolve(kind: ModelKind, params: &HyperParameters) -> Result<Self> {
        let spec = match kind {
            ModelKind::RandomForest => ModelSpec::RandomForest(RandomForestParams {
                estimators: int_in_range(
                    "estimators",
                    params.estimators,
                    DEFAULT_ESTIMATORS,
                    ESTIMATORS_RANGE,
                )?,
                max_depth: int_in_range(
                    "max_depth",
                    params.max_depth,
                    DEFAULT_MAX_DEPTH,
                    MAX_DEPTH_RANGE,
                )?,
            }),
            ModelKind::LogisticRegression => {
                ModelSpec::LogisticRegression(LogisticRegressionParams {
                    c: float_in_range("C", params.c, DEFAULT_C, C_RANGE)?,
                })
            }
            ModelKind::Svm => {
                let kernel = match params.kernel.as_deref() {
                    Some(name) => name.parse::<SvmKernel>()?,
                    None => SvmKernel::default(),
                };
                ModelSpec::Svm(SvmParams {
                    c: float_in_range("C", params.c, DEFAULT_C, C_RANGE)?,
                    kernel,
                })
            }
            ModelKind::Knn => ModelSpec::Knn(KnnParams {
                neighbors: int_in_range(
                    "neighbors",
                    params.neighbors,
                    DEFAULT_NEIGHBORS,
                    NEIGHBORS_RANGE,
                )?,
            }),
            ModelKind::DecisionTree => ModelSpec::DecisionTree(DecisionTreeParams {
                max_depth: int_in_range(
                    "max_depth",
                    params.max_depth,
                    DEFAULT_MAX_DEPTH,
                    MAX_DEPTH_RANGE,
                )?,
            }),
            ModelKind::LinearRegression => ModelSpec::LinearRegression,
        };

        log::debug!("Resolved model spec: {:?}", spec);
        Ok(spec)
    }

    /// Variant tag of this spec
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelSpec::RandomForest(_) => ModelKind::RandomForest,
            ModelSpec::LogisticRegression(_) => ModelKind::LogisticRegression,
            ModelSpec::Svm(_) => ModelKind::Svm,
            ModelSpec::Knn(_) => ModelKind::Knn,
            ModelSpec::DecisionTree(_) => ModelKind::DecisionTree,
            ModelSpec::LinearRegression => ModelKind::LinearRegression,
        }
    }

    /// Task solved by this spec
    pub fn task_type(&self) -> TaskType {
        self.kind().task_type()
    }

    /// Check every hyperparameter against its declared range.
    ///
    /// Records deserialized from a file bypass [`ModelSpec::resolve`], so
    /// they are checked here before a model is built.
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelSpec::RandomForest(p) => {
                check_int("estimators", p.estimators, ESTIMATORS_RANGE)?;
                check_int("max_depth", p.max_depth, MAX_DEPTH_RANGE)
            }
            ModelSpec::LogisticRegression(p) => check_float("C", p.c, C_RANGE),
            ModelSpec::Svm(p) => check_float("C", p.c, C_RANGE),
            ModelSpec::Knn(p) => check_int("neighbors", p.neighbors, NEIGHBORS_RANGE),
            ModelSpec::DecisionTree(p) => check_int("max_depth", p.max_depth, MAX_DEPTH_RANGE),
            ModelSpec::LinearRegression => Ok(()),
        }
    }
}

fn int_in_range(
    name: &str,
    value: Option<i64>,
    default: i64,
    (lo, hi): (i64, i64),
) -> Result<usize> {
    let value = value.unwrap_or(default);
    if value < lo || value > hi {
        return Err(EvalError::invalid_hyperparameter(
            name,
            value,
            format!("[{}, {}]", lo, hi),
        ));
    }
    Ok(value as usize)
}

fn float_in_range(name: &str, value: Option<f64>, default: f64, range: (f64, f64)) -> Result<f64> {
    let value = value.unwrap_or(default);
    check_float(name, value, range)?;
    Ok(value)
}

fn check_int(name: &str, value: usize, (lo, hi): (i64, i64)) -> Result<()> {
    let in_range = i64::try_from(value)
        .map(|v| v >= lo && v <= hi)
        .unwrap_or(false);
    if !in_range {
        return Err(EvalError::invalid_hyperparameter(
            name,
            value,
            format!("[{}, {}]", lo, hi),
        ));
    }
    Ok(())
}

fn check_float(name: &str, value: f64, (lo, hi): (f64, f64)) -> Result<()> {
    // NaN fails the containment test
    if !(lo..=hi).contains(&value) {
        return Err(EvalError::invalid_hyperparameter(
            name,
            value,
            format!("[{}, {}]", lo, hi),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn test_record_goes_through_tag_parsing() {
        let record: ModelRecord =
            serde_json::from_str(r#"{"kind": "gradient_boosting", "estimators": 5}"#).unwrap();
        assert_eq!(record.params.estimators, Some(5));
        let err = ModelSpec::try_from(record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedModelKind);

        let record: ModelRecord =
            serde_json::from_str(r#"{"kind": "svm", "kernel": "laplacian"}"#).unwrap();
        let err = ModelSpec::try_from(record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHyperparameter);

        let spec: ModelSpec =
            serde_json::from_str(r#"{"kind": "K-Nearest Neighbors", "neighbors": 7}"#).unwrap();
        assert_eq!(spec, ModelSpec::Knn(KnnParams { neighbors: 7 }));
    }

    #[test]
    fn test_hyperparameters_from_spec_and_merge() {
        let spec = ModelSpec::Svm(SvmParams {
            c: 3.0,
            kernel: SvmKernel::Rbf,
        });
        let from_file = HyperParameters::from(&spec);
        assert_eq!(from_file.kernel.as_deref(), Some("rbf"));

        let flags = HyperParameters {
            c: Some(2.0),
            ..Default::default()
        };
        let merged = flags.or(from_file);
        assert_eq!(
            ModelSpec::resolve(ModelKind::Svm, &merged).unwrap(),
            ModelSpec::Svm(SvmParams {
                c: 2.0,
                kernel: SvmKernel::Rbf
            })
        );
    }

    #[test]
    fn test_resolve_defaults() {
        let raw = HyperParameters::default();
        assert_eq!(
            ModelSpec::resolve(ModelKind::RandomForest, &raw).unwrap(),
            ModelSpec::RandomForest(RandomForestParams {
                estimators: 10,
                max_depth: 10
            })
        );
        assert_eq!(
            ModelSpec::resolve(ModelKind::Knn, &raw).unwrap(),
            ModelSpec::Knn(KnnParams { neighbors: 5 })
        );
        assert_eq!(
            ModelSpec::resolve(ModelKind::Svm, &raw).unwrap(),
            ModelSpec::Svm(SvmParams {
                c: 1.0,
                kernel: SvmKernel::Linear
            })
        );
        assert_eq!(
            ModelSpec::resolve(ModelKind::LinearRegression, &raw).unwrap(),
            ModelSpec::LinearRegression
        );
    }

    #[test]
    fn test_resolve_rejects_out_of_range() {
        let raw = HyperParameters {
            estimators: Some(0),
            ..Default::default()
        };
        let err = ModelSpec::resolve(ModelKind::RandomForest, &raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHyperparameter);
        assert!(err.to_string().contains("estimators = 0"));

        let raw = HyperParameters {
            c: Some(10.5),
            ..Default::default()
        };
        let err = ModelSpec::resolve(ModelKind::LogisticRegression, &raw).unwrap_err();
        assert!(err.to_string().contains("[0.01, 10]"));

        let raw = HyperParameters {
            c: Some(f64::NAN),
            ..Default::default()
        };
        assert!(ModelSpec::resolve(ModelKind::Svm, &raw).is_err());

        let raw = HyperParameters {
            neighbors: Some(21),
            ..Default::default()
        };
        assert!(ModelSpec::resolve(ModelKind::Knn, &raw).is_err());
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let raw = HyperParameters {
            estimators: Some(100),
            max_depth: Some(1),
            c: Some(0.01),
            neighbors: Some(20),
            kernel: Some("rbf".to_string()),
        };
        for kind in ModelKind::ALL {
            assert!(ModelSpec::resolve(kind, &raw).is_ok(), "{kind}");
        }
    }

    #[test]
    fn test_irrelevant_parameters_are_ignored() {
        let raw = HyperParameters {
            neighbors: Some(500),
            ..Default::default()
        };
        let spec = ModelSpec::resolve(ModelKind::DecisionTree, &raw).unwrap();
        assert_eq!(spec.kind(), ModelKind::DecisionTree);
    }

    #[test]
    fn test_unknown_kernel() {
        let raw = HyperParameters {
            kernel: Some("laplacian".to_string()),
            ..Default::default()
        };
        let err = ModelSpec::resolve(ModelKind::Svm, &raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHyperparameter);
    }

    #[test]
    fn test_validate_deserialized_spec() {
        let spec: ModelSpec =
            serde_json::from_str(r#"{"kind":"decision_tree","max_depth":25}"#).unwrap();
        assert_eq!(spec.validate().unwrap_err().kind(), ErrorKind::InvalidHyperparameter);

        let spec: ModelSpec = serde_json::from_str(r#"{"kind":"svm","kernel":"poly"}"#).unwrap();
        assert!(spec.validate().is_ok());
        assert_eq!(
            spec,
            ModelSpec::Svm(SvmParams {
                c: 1.0,
                kernel: SvmKernel::Poly
            })
        );
        assert_eq!(spec.task_type(), TaskType::Classification);
    }
}
