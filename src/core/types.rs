//! Core value types shared across the pipeline.
//!
//! [`ModelKind`] is the closed set of supported estimators and [`TaskType`]
//! the learning task each of them solves. Both parse from the labels a user
//! interface shows ("Random Forest", "K-Nearest Neighbors", ...) as well as
//! from snake_case configuration values.

use crate::core::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row index within a dataset or partition.
pub type RowIndex = usize;

/// Index of a class in the sorted label set of a classification target.
pub type ClassIndex = usize;

/// The learning task solved by a model kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Discrete class labels
    Classification,
    /// Continuous target values
    Regression,
}

impl TaskType {
    /// Whether this is a classification task
    pub fn is_classification(self) -> bool {
        matches!(self, TaskType::Classification)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Classification => write!(f, "classification"),
            TaskType::Regression => write!(f, "regression"),
        }
    }
}

/// Supported model kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Bagged ensemble of CART trees
    RandomForest,
    /// L2-regularized logistic regression
    LogisticRegression,
    /// Kernel support vector classifier
    Svm,
    /// K-nearest neighbors classifier
    Knn,
    /// Single CART classification tree
    DecisionTree,
    /// Ordinary least squares regression
    LinearRegression,
}

impl ModelKind {
    /// All kinds, in the order a user is offered them
    pub const ALL: [ModelKind; 6] = [
        ModelKind::RandomForest,
        ModelKind::LogisticRegression,
        ModelKind::Svm,
        ModelKind::Knn,
        ModelKind::DecisionTree,
        ModelKind::LinearRegression,
    ];

    /// The task this kind solves
    pub fn task_type(self) -> TaskType {
        match self {
            ModelKind::LinearRegression => TaskType::Regression,
            ModelKind::RandomForest
            | ModelKind::LogisticRegression
            | ModelKind::Svm
            | ModelKind::Knn
            | ModelKind::DecisionTree => TaskType::Classification,
        }
    }

    /// Human readable name
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::RandomForest => "Random Forest",
            ModelKind::LogisticRegression => "Logistic Regression",
            ModelKind::Svm => "SVM",
            ModelKind::Knn => "K-Nearest Neighbors",
            ModelKind::DecisionTree => "Decision Tree",
            ModelKind::LinearRegression => "Linear Regression",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ModelKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "random_forest" | "rf" => Ok(ModelKind::RandomForest),
            "logistic_regression" | "logistic" => Ok(ModelKind::LogisticRegression),
            "svm" | "svc" => Ok(ModelKind::Svm),
            "k_nearest_neighbors" | "knn" => Ok(ModelKind::Knn),
            "decision_tree" | "tree" => Ok(ModelKind::DecisionTree),
            "linear_regression" | "linear" => Ok(ModelKind::LinearRegression),
            _ => Err(EvalError::unsupported_model_kind(s.trim())),
        }
    }
}

/// Kernel function of the support vector classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SvmKernel {
    /// K(x, y) = x · y
    #[default]
    Linear,
    /// K(x, y) = (γ x · y)^3
    Poly,
    /// K(x, y) = exp(-γ ‖x − y‖²)
    Rbf,
    /// K(x, y) = tanh(γ x · y)
    Sigmoid,
}

impl fmt::Display for SvmKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SvmKernel::Linear => write!(f, "linear"),
            SvmKernel::Poly => write!(f, "poly"),
            SvmKernel::Rbf => write!(f, "rbf"),
            SvmKernel::Sigmoid => write!(f, "sigmoid"),
        }
    }
}

impl FromStr for SvmKernel {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(SvmKernel::Linear),
            "poly" | "polynomial" => Ok(SvmKernel::Poly),
            "rbf" => Ok(SvmKernel::Rbf),
            "sigmoid" => Ok(SvmKernel::Sigmoid),
            other => Err(EvalError::invalid_hyperparameter(
                "kernel",
                other,
                "one of linear, poly, rbf, sigmoid",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn test_task_type_derivation() {
        for kind in ModelKind::ALL {
            let expected = if kind == ModelKind::LinearRegression {
                TaskType::Regression
            } else {
                TaskType::Classification
            };
            assert_eq!(kind.task_type(), expected);
        }
    }

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("Random Forest".parse::<ModelKind>().unwrap(), ModelKind::RandomForest);
        assert_eq!("K-Nearest Neighbors".parse::<ModelKind>().unwrap(), ModelKind::Knn);
        assert_eq!("linear_regression".parse::<ModelKind>().unwrap(), ModelKind::LinearRegression);
        assert_eq!("SVM".parse::<ModelKind>().unwrap(), ModelKind::Svm);

        for kind in ModelKind::ALL {
            assert_eq!(kind.display_name().parse::<ModelKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_model_kind() {
        let err = "Gradient Boosting".parse::<ModelKind>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedModelKind);
        assert!(err.to_string().contains("Gradient Boosting"));
    }

    #[test]
    fn test_kernel_parsing() {
        assert_eq!("linear".parse::<SvmKernel>().unwrap(), SvmKernel::Linear);
        assert_eq!("RBF".parse::<SvmKernel>().unwrap(), SvmKernel::Rbf);
        assert_eq!(SvmKernel::default(), SvmKernel::Linear);
        let err = "cubic".parse::<SvmKernel>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHyperparameter);
    }
}
