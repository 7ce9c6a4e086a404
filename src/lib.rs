//! # tabular-eval
//!
//! Train and evaluate a supervised model on a tabular dataset in one call.
//!
//! A run takes a table of named columns, optionally backward fills missing
//! cells and one-hot encodes categorical columns, selects a target and a set
//! of feature columns, splits the rows 80/20 with a fixed seed, fits one of
//! six model variants and scores it on the held-out rows. Alongside the
//! metrics it returns renderer-neutral descriptions of diagnostic charts.
//!
//! ## Model variants
//!
//! | Variant | Task | Hyperparameters |
//! |---|---|---|
//! | Random forest | classification | `estimators` 1..=100, `max_depth` 1..=20 |
//! | Logistic regression | classification | `c` 0.01..=10 |
//! | Support vector machine | classification | `c` 0.01..=10, `kernel` |
//! | K-nearest neighbors | classification | `neighbors` 1..=20 |
//! | Decision tree | classification | `max_depth` 1..=20 |
//! | Linear regression | regression | none |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tabular_eval::{CsvLoader, ModelKind, Pipeline, PipelineConfigBuilder};
//!
//! # fn main() -> tabular_eval::Result<()> {
//! tabular_eval::init();
//!
//! let dataset = CsvLoader::new().load_csv("iris.csv")?;
//! let config = PipelineConfigBuilder::new()
//!     .target("species")
//!     .features(["sepal_length", "sepal_width"])
//!     .model(ModelKind::Knn)
//!     .build()?;
//!
//! let output = Pipeline::new(config).run(&dataset)?;
//! for (name, value) in output.evaluation.display_metrics() {
//!     println!("{}: {}", name, value);
//! }
//! for artifact in &output.artifacts {
//!     println!("{}", artifact.kind);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: error type, constants and shared enums
//! - [`config`]: run configuration and per-variant hyperparameter records
//! - [`dataset`]: columns, CSV loading, preprocessing and the train/test split
//! - [`models`]: estimators, the model factory and the trainer
//! - [`metrics`]: classification and regression metrics
//! - [`artifacts`]: diagnostic chart descriptions
//! - [`pipeline`]: the end-to-end run

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

pub mod artifacts;
pub mod config;
pub mod core;
pub mod dataset;
pub mod metrics;
pub mod models;
pub mod pipeline;

pub use crate::core::{
    error::{ErrorKind, EvalError, Result},
    types::{ClassIndex, ModelKind, RowIndex, SvmKernel, TaskType},
};

pub use config::{
    HyperParameters, ModelSpec, PipelineConfig, PipelineConfigBuilder, ResidualNullPolicy,
};

pub use dataset::{
    Column, ColumnData, ColumnType, CsvLoader, DataLoader, Dataset, Preprocessor, Split, Splitter,
    TargetVector,
};

pub use models::{ModelFactory, ModelHandle, Predictions, TrainedModel, Trainer};

pub use metrics::{EvaluationResult, MetricsComputer};

pub use artifacts::{ArtifactKind, ArtifactSpec, DiagnosticArtifactGenerator, Payload};

pub use pipeline::{Pipeline, PipelineOutput};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the `env_logger` backend.
///
/// The filter defaults to `info` when `RUST_LOG` is unset. Calling this more
/// than once, or after the host application installed its own logger, is
/// harmless.
pub fn init() {
    core::initialize_logging();
}
