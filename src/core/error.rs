//! Error handling and error types for the evaluation pipeline.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! [`EvalError`] carries enough context (parameter names, partitions, metric
//! names) for the caller to report the failure without inspecting internals.
//! [`EvalError::kind`] collapses the variants onto the coarse [`ErrorKind`]
//! taxonomy used by callers that only need to branch on the failure class.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Main error type for the evaluation pipeline.
#[derive(Error, Debug)]
pub enum EvalError {
    /// A hyperparameter lies outside its declared range
    #[error("Invalid hyperparameter: {parameter} = {value}, expected {valid_range}")]
    InvalidHyperparameter {
        /// Parameter name
        parameter: String,
        /// Rejected value
        value: String,
        /// Accepted range
        valid_range: String,
    },

    /// The requested model kind is not one of the supported variants
    #[error("Unsupported model kind: {kind}")]
    UnsupportedModelKind {
        /// Tag as given
        kind: String,
    },

    /// Too few rows to train or evaluate
    #[error("Insufficient data in {partition}: need at least {required} rows, got {actual}")]
    InsufficientData {
        /// Partition or input that is too small
        partition: String,
        /// Minimum row count
        required: usize,
        /// Rows available
        actual: usize,
    },

    /// Fitting a model failed or is undefined for the given input
    #[error("Training failure: {message}")]
    TrainingFailure {
        /// What went wrong
        message: String,
    },

    /// Dimension mismatch between two aligned structures
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape
        expected: String,
        /// Shape found
        actual: String,
    },

    /// A metric is not defined for the given data
    #[error("Undefined metric {metric}: {reason}")]
    UndefinedMetric {
        /// Metric name
        metric: String,
        /// Why it is undefined
        reason: String,
    },

    /// Missing values survived preprocessing
    #[error("Missing values remain after backward fill in columns: {}", .columns.join(", "))]
    NullHandling {
        /// Columns with residual missing cells
        columns: Vec<String>,
    },

    /// Feature/target selection does not match the dataset
    #[error("Invalid column selection: {message}")]
    InvalidSelection {
        /// What is wrong with the selection
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// Data loading and parsing errors
    #[error("Data loading error: {message}")]
    DataLoading {
        /// What could not be read
        message: String,
    },

    /// File I/O errors
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: io::Error,
    },

    /// CSV parsing errors
    #[error("CSV parsing error: {source}")]
    Csv {
        /// Underlying CSV reader error
        #[from]
        source: csv::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        /// Underlying serde_json error
        #[from]
        source: serde_json::Error,
    },
}

/// Coarse classification of [`EvalError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Hyperparameter out of range
    InvalidHyperparameter,
    /// Unknown model tag
    UnsupportedModelKind,
    /// Not enough rows in a partition
    InsufficientData,
    /// Fitting failed or was undefined
    TrainingFailure,
    /// Aligned structures disagree in length
    ShapeMismatch,
    /// Metric undefined for the data
    UndefinedMetric,
    /// Residual missing values after preprocessing
    NullHandling,
    /// Bad feature/target selection
    InvalidSelection,
    /// Bad configuration file or values
    Config,
    /// Input table could not be read
    DataLoading,
}

/// Type alias for Results using EvalError
pub type Result<T> = std::result::Result<T, EvalError>;

impl EvalError {
    /// Create an invalid hyperparameter error
    pub fn invalid_hyperparameter<P, V, R>(parameter: P, value: V, valid_range: R) -> Self
    where
        P: Into<String>,
        V: ToString,
        R: Into<String>,
    {
        EvalError::InvalidHyperparameter {
            parameter: parameter.into(),
            value: value.to_string(),
            valid_range: valid_range.into(),
        }
    }

    /// Create an unsupported model kind error
    pub fn unsupported_model_kind<S: Into<String>>(kind: S) -> Self {
        EvalError::UnsupportedModelKind { kind: kind.into() }
    }

    /// Create an insufficient data error
    pub fn insufficient_data<S: Into<String>>(
        partition: S,
        required: usize,
        actual: usize,
    ) -> Self {
        EvalError::InsufficientData {
            partition: partition.into(),
            required,
            actual,
        }
    }

    /// Create a training failure
    pub fn training<S: Into<String>>(message: S) -> Self {
        EvalError::TrainingFailure {
            message: message.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        EvalError::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an undefined metric error
    pub fn undefined_metric<M, R>(metric: M, reason: R) -> Self
    where
        M: Into<String>,
        R: Into<String>,
    {
        EvalError::UndefinedMetric {
            metric: metric.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid selection error
    pub fn invalid_selection<S: Into<String>>(message: S) -> Self {
        EvalError::InvalidSelection {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        EvalError::Config {
            message: message.into(),
        }
    }

    /// Create a data loading error
    pub fn data_loading<S: Into<String>>(message: S) -> Self {
        EvalError::DataLoading {
            message: message.into(),
        }
    }

    /// Map this error onto its coarse kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::InvalidHyperparameter { .. } => ErrorKind::InvalidHyperparameter,
            EvalError::UnsupportedModelKind { .. } => ErrorKind::UnsupportedModelKind,
            EvalError::InsufficientData { .. } => ErrorKind::InsufficientData,
            EvalError::TrainingFailure { .. } => ErrorKind::TrainingFailure,
            EvalError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            EvalError::UndefinedMetric { .. } => ErrorKind::UndefinedMetric,
            EvalError::NullHandling { .. } => ErrorKind::NullHandling,
            EvalError::InvalidSelection { .. } => ErrorKind::InvalidSelection,
            EvalError::Config { .. } | EvalError::Json { .. } => ErrorKind::Config,
            EvalError::DataLoading { .. } | EvalError::Io { .. } | EvalError::Csv { .. } => {
                ErrorKind::DataLoading
            }
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            EvalError::InvalidHyperparameter { .. } => "invalid_hyperparameter",
            EvalError::UnsupportedModelKind { .. } => "unsupported_model_kind",
            EvalError::InsufficientData { .. } => "insufficient_data",
            EvalError::TrainingFailure { .. } => "training_failure",
            EvalError::ShapeMismatch { .. } => "shape_mismatch",
            EvalError::UndefinedMetric { .. } => "undefined_metric",
            EvalError::NullHandling { .. } => "null_handling",
            EvalError::InvalidSelection { .. } => "invalid_selection",
            EvalError::Config { .. } => "config",
            EvalError::DataLoading { .. } => "data_loading",
            EvalError::Io { .. } => "io",
            EvalError::Csv { .. } => "csv",
            EvalError::Json { .. } => "json",
        }
    }
}

impl From<toml::de::Error> for EvalError {
    fn from(err: toml::de::Error) -> Self {
        EvalError::config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<toml::ser::Error> for EvalError {
    fn from(err: toml::ser::Error) -> Self {
        EvalError::config(format!("Failed to serialize TOML: {}", err))
    }
}
