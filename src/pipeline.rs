//! End-to-end run: preprocess, select, split, fit, evaluate, describe.
//!
//! A [`Pipeline`] owns one [`PipelineConfig`] and runs it against a
//! [`Dataset`]. Runs are all-or-nothing: the first failing stage aborts the
//! run and no partial output is returned. Artifact generation is the only
//! stage that cannot fail.

use crate::artifacts::{ArtifactContext, ArtifactSpec, DiagnosticArtifactGenerator};
use crate::config::PipelineConfig;
use crate::core::constants::{DEFAULT_SPLIT_SEED, DEFAULT_TEST_FRACTION};
use crate::core::error::Result;
use crate::core::types::{ModelKind, TaskType};
use crate::dataset::{Dataset, Preprocessor, Splitter};
use crate::metrics::{EvaluationResult, MetricsComputer};
use crate::models::{ModelFactory, Trainer};
use serde::{Deserialize, Serialize};

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Trained model variant
    pub model_kind: ModelKind,
    /// Task of the model
    pub task_type: TaskType,
    /// Feature columns in matrix order
    pub feature_names: Vec<String>,
    /// Rows in the training partition
    pub train_rows: usize,
    /// Rows in the test partition
    pub test_rows: usize,
    /// Metrics and curves on the test partition
    pub evaluation: EvaluationResult,
    /// Diagnostic charts, in emission order
    pub artifacts: Vec<ArtifactSpec>,
}

/// Runs one configuration over a dataset.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    splitter: Splitter,
    factory: ModelFactory,
}

impl Pipeline {
    /// Pipeline with the fixed 80/20 split and seed 42
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline {
            config,
            splitter: Splitter::default(),
            factory: ModelFactory::with_seed(DEFAULT_SPLIT_SEED),
        }
    }

    /// Configuration of this pipeline
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage on `dataset`.
    pub fn run(&self, dataset: &Dataset) -> Result<PipelineOutput> {
        let config = &self.config;
        config.validate()?;
        log::info!(
            "Running {} on {} rows ({} features, target '{}')",
            config.model.kind(),
            dataset.num_rows(),
            config.features.len(),
            config.target
        );

        let preprocessor = Preprocessor::new(config.preprocess, config.residual_nulls);
        let data = preprocessor.transform(dataset)?;

        data.validate_selection(&config.target, &config.features)?;
        let task = config.model.task_type();
        let x = data.feature_matrix(&config.features)?;
        let y = data.target(&config.target, task)?;
        log::debug!("Selected {} x {} feature matrix", x.nrows(), x.ncols());

        let handle = self.factory.build(&config.model)?;
        let split = self.splitter.split(&x, &y)?;
        log::info!(
            "Split {} rows into {} train / {} test (test fraction {}, seed {})",
            x.nrows(),
            split.train_rows.len(),
            split.test_rows.len(),
            DEFAULT_TEST_FRACTION,
            self.splitter.seed()
        );

        let model = Trainer::fit(&handle, &split.x_train, &split.y_train)?;
        let evaluation = MetricsComputer::evaluate(&model, &split.x_test, &split.y_test)?;

        let artifacts = DiagnosticArtifactGenerator::generate(&ArtifactContext {
            spec: &config.model,
            task,
            feature_names: &config.features,
            model: &model,
            evaluation: &evaluation,
            split: &split,
        });

        Ok(PipelineOutput {
            model_kind: model.kind(),
            task_type: task,
            feature_names: config.features.clone(),
            train_rows: split.train_rows.len(),
            test_rows: split.test_rows.len(),
            evaluation,
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelSpec, PipelineConfigBuilder, ResidualNullPolicy};
    use crate::core::error::ErrorKind;
    use crate::dataset::Column;

    fn dataset() -> Dataset {
        let n = 30;
        Dataset::new(vec![
            Column::numeric("x", (0..n).map(|i| Some(i as f64)).collect()),
            Column::categorical(
                "colour",
                (0..n).map(|i| Some(if i % 3 == 0 { "red" } else { "blue" })),
            ),
            Column::categorical(
                "label",
                (0..n).map(|i| Some(if i < n / 2 { "low" } else { "high" })),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_run_decision_tree() {
        let config = PipelineConfig::new(
            "label",
            vec!["x".to_string()],
            ModelSpec::DecisionTree(Default::default()),
        );
        let output = Pipeline::new(config).run(&dataset()).unwrap();

        assert_eq!(output.model_kind, ModelKind::DecisionTree);
        assert_eq!(output.train_rows + output.test_rows, 30);
        assert_eq!(output.test_rows, 6);
        let accuracy = output.evaluation.metric("accuracy").unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
    }

    #[test]
    fn test_categorical_feature_needs_preprocessing() {
        let config = PipelineConfig::new(
            "label",
            vec!["colour".to_string()],
            ModelSpec::DecisionTree(Default::default()),
        );
        let err = Pipeline::new(config).run(&dataset()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TrainingFailure);
    }

    #[test]
    fn test_preprocessing_exposes_indicator_columns() {
        let config = PipelineConfigBuilder::new()
            .target("label_low")
            .features(["x", "colour_red"])
            .preprocess(true)
            .residual_nulls(ResidualNullPolicy::Reject)
            .model(ModelKind::DecisionTree)
            .build()
            .unwrap();
        let output = Pipeline::new(config).run(&dataset()).unwrap();
        assert_eq!(output.feature_names, vec!["x", "colour_red"]);
        assert!(output.evaluation.confusion_matrix.is_some());
    }

    #[test]
    fn test_unknown_column_rejected() {
        let config =
            PipelineConfig::new("label", vec!["missing".to_string()], ModelSpec::default());
        let err = Pipeline::new(config).run(&dataset()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSelection);
    }
}
