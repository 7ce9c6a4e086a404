//! Configuration of a pipeline run.
//!
//! [`model`] holds the per-variant hyperparameter records and their
//! validation; [`core`] the run-level [`PipelineConfig`] with file loading.

pub mod core;
pub mod model;

pub use self::core::{PipelineConfig, PipelineConfigBuilder, ResidualNullPolicy};
pub use self::model::{
    DecisionTreeParams, HyperParameters, KnnParams, LogisticRegressionParams, ModelRecord,
    ModelSpec, RandomForestParams, SvmParams,
};
