//! Evaluation of a trained model on the test partition.
//!
//! [`MetricsComputer::evaluate`] predicts the held-out rows and scores the
//! predictions according to the model's task:
//!
//! - classifiers get `accuracy` and a confusion matrix; binary targets add
//!   `precision`, `recall`, `f1_score`, `auc_roc` and the ROC and
//!   precision-recall curves
//! - the regressor gets `mse`, `mae`, `rmse` and `r2`
//!
//! Curves that are undefined for the test partition (more than two classes,
//! or a single class present) are left out with a warning; the evaluation
//! itself still succeeds.

pub mod classification;
pub mod regression;

pub use classification::{
    accuracy, auc, f1_score, precision, precision_recall_curve, recall, roc_auc, roc_curve,
    BinaryCounts, ConfusionMatrix, PrecisionRecallCurve, RocCurve,
};
pub use regression::{
    mean_absolute_error, mean_squared_error, prediction_errors, r2_score, root_mean_squared_error,
};

use crate::core::constants::DISPLAY_PRECISION;
use crate::core::error::{EvalError, Result};
use crate::core::types::TaskType;
use crate::dataset::TargetVector;
use crate::models::{Predictions, TrainedModel};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// One named metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Metric name, e.g. `accuracy` or `rmse`
    pub name: String,
    /// Value
    pub value: f64,
}

/// Everything computed from the test partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Predicted classes or values for the test rows
    pub predictions: Predictions,
    /// Positive-class scores of a binary classifier
    pub scores: Option<Array1<f64>>,
    /// Metrics in computation order
    pub metrics: Vec<MetricValue>,
    /// Confusion matrix of a classifier
    pub confusion_matrix: Option<ConfusionMatrix>,
    /// ROC curve of a binary classifier
    pub roc_curve: Option<RocCurve>,
    /// Precision-recall curve of a binary classifier
    pub pr_curve: Option<PrecisionRecallCurve>,
}

impl EvaluationResult {
    fn new(predictions: Predictions) -> Self {
        EvaluationResult {
            predictions,
            scores: None,
            metrics: Vec::new(),
            confusion_matrix: None,
            roc_curve: None,
            pr_curve: None,
        }
    }

    fn push<S: Into<String>>(&mut self, name: S, value: f64) {
        self.metrics.push(MetricValue {
            name: name.into(),
            value,
        });
    }

    /// Value of metric `name`
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find(|m| m.name == name).map(|m| m.value)
    }

    /// Metric names in computation order
    pub fn metric_names(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.name.as_str()).collect()
    }

    /// Metrics rendered with two decimals, for presentation
    pub fn display_metrics(&self) -> Vec<(String, String)> {
        self.metrics
            .iter()
            .map(|m| (m.name.clone(), format!("{:.*}", DISPLAY_PRECISION, m.value)))
            .collect()
    }
}

/// Scores trained models on held-out data.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsComputer;

impl MetricsComputer {
    /// Predict `x_test` and compute the metrics of the model's task.
    pub fn evaluate(
        model: &TrainedModel,
        x_test: &Array2<f64>,
        y_test: &TargetVector,
    ) -> Result<EvaluationResult> {
        if x_test.nrows() != y_test.len() {
            return Err(EvalError::shape_mismatch(
                format!("{} test targets", x_test.nrows()),
                format!("{} test targets", y_test.len()),
            ));
        }

        let predictions = model.predict(x_test)?;
        let mut result = EvaluationResult::new(predictions);

        match model.task_type() {
            TaskType::Classification => {
                Self::classification(model, x_test, y_test, &mut result)?
            }
            TaskType::Regression => Self::regression(y_test, &mut result)?,
        }

        log::info!(
            "Evaluated {} on {} test rows: {}",
            model.kind(),
            x_test.nrows(),
            result
                .display_metrics()
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(result)
    }

    fn classification(
        model: &TrainedModel,
        x_test: &Array2<f64>,
        y_test: &TargetVector,
        result: &mut EvaluationResult,
    ) -> Result<()> {
        let (y_true, labels) = y_test
            .classes()
            .ok_or_else(|| {
                EvalError::training("classifier evaluated against a continuous target")
            })?;
        let y_pred = match &result.predictions {
            Predictions::Classes(c) => c.clone(),
            Predictions::Values(_) => {
                return Err(EvalError::training("classifier produced continuous predictions"))
            }
        };
        let fitted = model.class_set().map(|c| c.classes().to_vec()).unwrap_or_default();

        result.push("accuracy", accuracy(y_true, &y_pred)?);
        result.confusion_matrix = Some(ConfusionMatrix::compute(y_true, &y_pred, &fitted, labels)?);

        if labels.len() != 2 {
            log::warn!(
                "Target has {} classes; binary metrics and curves are skipped",
                labels.len()
            );
            return Ok(());
        }

        let counts = BinaryCounts::tally(y_true, &y_pred, classification::POSITIVE_CLASS);
        result.push("precision", counts.precision());
        result.push("recall", counts.recall());
        result.push("f1_score", counts.f1());

        let Some(scores) = model.positive_scores(x_test)? else {
            return Ok(());
        };
        match (roc_curve(y_test, &scores), precision_recall_curve(y_test, &scores)) {
            (Ok(roc), Ok(pr)) => {
                result.push("auc_roc", auc(&roc.fpr, &roc.tpr)?);
                result.roc_curve = Some(roc);
                result.pr_curve = Some(pr);
            }
            (Err(e), _) | (_, Err(e)) => log::warn!("Threshold curves skipped: {}", e),
        }
        result.scores = Some(scores);
        Ok(())
    }

    fn regression(y_test: &TargetVector, result: &mut EvaluationResult) -> Result<()> {
        let y_true = y_test
            .continuous()
            .ok_or_else(|| EvalError::training("regressor evaluated against a class target"))?;
        let y_pred = result.predictions.as_f64();

        let mse = mean_squared_error(y_true, &y_pred)?;
        result.push("mse", mse);
        result.push("mae", mean_absolute_error(y_true, &y_pred)?);
        result.push("rmse", mse.sqrt());
        result.push("r2", r2_score(y_true, &y_pred)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KnnParams, ModelSpec};
    use crate::models::{ModelFactory, Trainer};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn fit(spec: ModelSpec, x: &Array2<f64>, y: &TargetVector) -> TrainedModel {
        let handle = ModelFactory::default().build(&spec).unwrap();
        Trainer::fit(&handle, x, y).unwrap()
    }

    #[test]
    fn test_binary_classification_metrics() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let y = TargetVector::Classes {
            indices: vec![0, 0, 0, 1, 1, 1],
            labels: vec!["no".into(), "yes".into()],
        };
        let model = fit(ModelSpec::Knn(KnnParams { neighbors: 3 }), &x, &y);
        let result = MetricsComputer::evaluate(&model, &x, &y).unwrap();

        assert_eq!(
            result.metric_names(),
            vec!["accuracy", "precision", "recall", "f1_score", "auc_roc"]
        );
        assert_abs_diff_eq!(result.metric("accuracy").unwrap(), 1.0);
        assert!(result.roc_curve.is_some());
        assert!(result.pr_curve.is_some());
        assert_eq!(result.scores.as_ref().map(|s| s.len()), Some(6));
        assert_eq!(result.confusion_matrix.unwrap().row_sums(), vec![3, 3]);
    }

    #[test]
    fn test_multiclass_skips_curves() {
        let x = array![[0.0], [1.0], [5.0], [6.0], [10.0], [11.0]];
        let y = TargetVector::Classes {
            indices: vec![0, 0, 1, 1, 2, 2],
            labels: vec!["a".into(), "b".into(), "c".into()],
        };
        let model = fit(ModelSpec::Knn(KnnParams { neighbors: 1 }), &x, &y);
        let result = MetricsComputer::evaluate(&model, &x, &y).unwrap();

        assert_eq!(result.metric_names(), vec!["accuracy"]);
        assert!(result.roc_curve.is_none());
        assert!(result.scores.is_none());
        assert_eq!(result.confusion_matrix.unwrap().matrix.dim(), (3, 3));
    }

    #[test]
    fn test_single_class_test_partition() {
        let x = array![[0.0], [1.0], [10.0], [11.0]];
        let y = TargetVector::Classes {
            indices: vec![0, 0, 1, 1],
            labels: vec!["no".into(), "yes".into()],
        };
        let model = fit(ModelSpec::Knn(KnnParams { neighbors: 1 }), &x, &y);

        let x_test = array![[0.5], [0.7]];
        let y_test = TargetVector::Classes {
            indices: vec![0, 0],
            labels: vec!["no".into(), "yes".into()],
        };
        let result = MetricsComputer::evaluate(&model, &x_test, &y_test).unwrap();
        assert!(result.metric("auc_roc").is_none());
        assert!(result.pr_curve.is_none());
        assert_eq!(result.metric("recall"), Some(0.0));
    }

    #[test]
    fn test_regression_metrics() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = TargetVector::Continuous(array![2.0, 4.1, 5.9, 8.0]);
        let model = fit(ModelSpec::LinearRegression, &x, &y);
        let result = MetricsComputer::evaluate(&model, &x, &y).unwrap();

        assert_eq!(result.metric_names(), vec!["mse", "mae", "rmse", "r2"]);
        let mse = result.metric("mse").unwrap();
        assert_abs_diff_eq!(result.metric("rmse").unwrap(), mse.sqrt(), epsilon = 1e-12);
        assert!(result.metric("r2").unwrap() <= 1.0);
        assert!(result.confusion_matrix.is_none());
    }

    #[test]
    fn test_display_metrics() {
        let mut result = EvaluationResult::new(Predictions::Classes(vec![]));
        result.push("accuracy", 0.8333);
        assert_eq!(
            result.display_metrics(),
            vec![("accuracy".to_string(), "0.83".to_string())]
        );
    }
}
