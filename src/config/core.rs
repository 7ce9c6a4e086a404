//! Pipeline configuration and its builder.
//!
//! A [`PipelineConfig`] captures every user selection a run needs: the target
//! column, the feature columns, whether to preprocess, how residual missing
//! values are treated and the model with its hyperparameters.

use crate::config::model::{HyperParameters, ModelRecord, ModelSpec};
use crate::core::error::{EvalError, Result};
use crate::core::types::ModelKind;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// What the preprocessor does with cells that are still missing after
/// backward fill (a trailing run of missing values in a column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidualNullPolicy {
    /// Fail with a null handling error naming the affected columns
    #[default]
    Reject,
    /// Carry the missing cells forward to feature extraction
    Keep,
}

/// On-disk layout of a [`PipelineConfig`], before the model is resolved.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    target: String,
    features: Vec<String>,
    #[serde(default)]
    preprocess: bool,
    #[serde(default)]
    residual_nulls: ResidualNullPolicy,
    model: Option<ModelRecord>,
}

/// Complete configuration of one training and evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Target column name
    pub target: String,
    /// Feature column names, in matrix column order
    pub features: Vec<String>,
    /// Apply backward fill and one-hot encoding before selection
    #[serde(default)]
    pub preprocess: bool,
    /// Residual missing value policy
    #[serde(default)]
    pub residual_nulls: ResidualNullPolicy,
    /// Model and hyperparameters
    #[serde(default)]
    pub model: ModelSpec,
}

impl PipelineConfig {
    /// Create a configuration with default preprocessing settings
    pub fn new<S: Into<String>>(target: S, features: Vec<String>, model: ModelSpec) -> Self {
        PipelineConfig {
            target: target.into(),
            features,
            preprocess: false,
            residual_nulls: ResidualNullPolicy::default(),
            model,
        }
    }

    /// Validate selections and hyperparameters
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(EvalError::invalid_selection("no target column selected"));
        }

        if self.features.is_empty() {
            return Err(EvalError::invalid_selection("no feature columns selected"));
        }

        let mut seen = HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.as_str()) {
                return Err(EvalError::invalid_selection(format!(
                    "feature '{}' selected more than once",
                    feature
                )));
            }
        }

        if seen.contains(self.target.as_str()) {
            return Err(EvalError::invalid_selection(format!(
                "column '{}' is selected as both target and feature",
                self.target
            )));
        }

        self.model.validate()
    }

    /// Load configuration from a `.json` or `.toml` file.
    ///
    /// The model record is resolved after parsing, so an unknown model tag
    /// fails with `UnsupportedModelKind` and an out-of-range or unknown
    /// hyperparameter with `InvalidHyperparameter`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EvalError::config(format!("Failed to read config file: {}", e)))?;

        let file: ConfigFile = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => {
                return Err(EvalError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        let config = PipelineConfig {
            target: file.target,
            features: file.features,
            preprocess: file.preprocess,
            residual_nulls: file.residual_nulls,
            model: match file.model {
                Some(record) => ModelSpec::try_from(record)?,
                None => ModelSpec::default(),
            },
        };
        log::debug!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            _ => {
                return Err(EvalError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content)
            .map_err(|e| EvalError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

/// Builder assembling a [`PipelineConfig`] from raw user selections.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    target: Option<String>,
    features: Vec<String>,
    preprocess: bool,
    residual_nulls: ResidualNullPolicy,
    kind: Option<ModelKind>,
    params: HyperParameters,
}

impl PipelineConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target column
    pub fn target<S: Into<String>>(mut self, target: S) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the feature columns
    pub fn features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable preprocessing
    pub fn preprocess(mut self, preprocess: bool) -> Self {
        self.preprocess = preprocess;
        self
    }

    /// Set the residual missing value policy
    pub fn residual_nulls(mut self, policy: ResidualNullPolicy) -> Self {
        self.residual_nulls = policy;
        self
    }

    /// Select the model kind
    pub fn model(mut self, kind: ModelKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the raw hyperparameters
    pub fn hyperparameters(mut self, params: HyperParameters) -> Self {
        self.params = params;
        self
    }

    /// Resolve the model spec and validate the result
    pub fn build(self) -> Result<PipelineConfig> {
        let kind = self
            .kind
            .ok_or_else(|| EvalError::config("no model kind selected"))?;
        let target = self
            .target
            .ok_or_else(|| EvalError::invalid_selection("no target column selected"))?;

        let config = PipelineConfig {
            target,
            features: self.features,
            preprocess: self.preprocess,
            residual_nulls: self.residual_nulls,
            model: ModelSpec::resolve(kind, &self.params)?,
        };
        config.validate()?;
        Ok(config)
    }
}
