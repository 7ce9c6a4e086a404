//! Construction of unfitted models from their specification.

use crate::config::ModelSpec;
use crate::core::constants::DEFAULT_SPLIT_SEED;
use crate::core::error::Result;
use crate::core::types::{ModelKind, TaskType};

/// An unfitted model: a validated spec plus the seed its estimator uses.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelHandle {
    spec: ModelSpec,
    seed: u64,
}

impl ModelHandle {
    /// Hyperparameter record
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Seed for randomised estimators
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Variant tag
    pub fn kind(&self) -> ModelKind {
        self.spec.kind()
    }

    /// Task solved by the model
    pub fn task_type(&self) -> TaskType {
        self.spec.task_type()
    }
}

/// Builds [`ModelHandle`]s, validating hyperparameters eagerly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelFactory {
    seed: u64,
}

impl Default for ModelFactory {
    fn default() -> Self {
        ModelFactory {
            seed: DEFAULT_SPLIT_SEED,
        }
    }
}

impl ModelFactory {
    /// Factory whose handles carry `seed`
    pub fn with_seed(seed: u64) -> Self {
        ModelFactory { seed }
    }

    /// Validate `spec` and wrap it in a handle
    pub fn build(&self, spec: &ModelSpec) -> Result<ModelHandle> {
        spec.validate()?;
        log::debug!("Built {} model handle", spec.kind());
        Ok(ModelHandle {
            spec: spec.clone(),
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KnnParams, RandomForestParams};
    use crate::core::error::ErrorKind;

    #[test]
    fn test_build_valid_spec() {
        let spec = ModelSpec::RandomForest(RandomForestParams::default());
        let handle = ModelFactory::default().build(&spec).unwrap();
        assert_eq!(handle.kind(), ModelKind::RandomForest);
        assert_eq!(handle.seed(), 42);
        assert_eq!(handle.task_type(), TaskType::Classification);
    }

    #[test]
    fn test_build_rejects_out_of_range() {
        let spec = ModelSpec::Knn(KnnParams { neighbors: 25 });
        let err = ModelFactory::default().build(&spec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHyperparameter);
    }
}
