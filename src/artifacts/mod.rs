//! Diagnostic artifacts: chart descriptions for an external renderer.
//!
//! [`DiagnosticArtifactGenerator::generate`] decides which charts apply to the
//! trained model and builds an [`ArtifactSpec`] for each, in a fixed order per
//! model kind. Nothing is drawn here. Generation never fails; an artifact
//! whose data is undefined for this run is left out and logged at debug
//! level.

pub mod payload;

pub use payload::{BoxStats, DensitySeries, NamedSeries, Payload, TreeNodeView};

use crate::config::ModelSpec;
use crate::core::constants::{ERROR_HISTOGRAM_BINS, FEATURE_SCATTER_ROW_LIMIT};
use crate::core::error::{EvalError, Result};
use crate::core::types::{SvmKernel, TaskType};
use crate::dataset::{Split, TargetVector};
use crate::metrics::{prediction_errors, EvaluationResult};
use crate::models::TrainedModel;
use ndarray::{s, Array1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of diagnostic chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Actual vs predicted class counts
    ConfusionMatrix,
    /// Receiver operating characteristic
    RocCurve,
    /// Precision against recall
    PrCurve,
    /// Score densities per true class
    ClassDensity,
    /// Predicted class over the plane of two features
    DecisionBoundary,
    /// Linear coefficient per feature
    FeatureCoefficients,
    /// Impurity importance per feature
    FeatureImportance,
    /// Fitted tree structure
    TreeDiagram,
    /// Actual against predicted values
    ActualVsPredictedScatter,
    /// Distribution of prediction errors
    ErrorHistogram,
    /// Box summary of prediction errors
    ErrorBoxplot,
    /// Actual and predicted series by row
    SeriesOverlay,
    /// Regression metrics as bars
    MetricsBar,
    /// Target against feature values
    FeatureVsTargetScatter,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::ConfusionMatrix => "confusion matrix",
            ArtifactKind::RocCurve => "ROC curve",
            ArtifactKind::PrCurve => "precision-recall curve",
            ArtifactKind::ClassDensity => "class density",
            ArtifactKind::DecisionBoundary => "decision boundary",
            ArtifactKind::FeatureCoefficients => "feature coefficients",
            ArtifactKind::FeatureImportance => "feature importance",
            ArtifactKind::TreeDiagram => "tree diagram",
            ArtifactKind::ActualVsPredictedScatter => "actual vs predicted scatter",
            ArtifactKind::ErrorHistogram => "error histogram",
            ArtifactKind::ErrorBoxplot => "error boxplot",
            ArtifactKind::SeriesOverlay => "series overlay",
            ArtifactKind::MetricsBar => "metrics bar",
            ArtifactKind::FeatureVsTargetScatter => "feature vs target scatter",
        };
        f.write_str(name)
    }
}

/// Axis titles and legend entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLabels {
    /// Horizontal axis title
    pub x: Option<String>,
    /// Vertical axis title
    pub y: Option<String>,
    /// Legend entries
    pub legend: Vec<String>,
}

impl AxisLabels {
    fn xy(x: &str, y: &str) -> Self {
        AxisLabels {
            x: Some(x.to_string()),
            y: Some(y.to_string()),
            legend: Vec::new(),
        }
    }

    fn with_legend<I: IntoIterator<Item = String>>(mut self, legend: I) -> Self {
        self.legend = legend.into_iter().collect();
        self
    }
}

/// A chart to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    /// Chart kind
    pub kind: ArtifactKind,
    /// Chart title
    pub title: String,
    /// Axis titles and legend
    pub labels: AxisLabels,
    /// Data to draw
    pub payload: Payload,
}

impl ArtifactSpec {
    fn new(kind: ArtifactKind, title: &str, labels: AxisLabels, payload: Payload) -> Self {
        ArtifactSpec {
            kind,
            title: title.to_string(),
            labels,
            payload,
        }
    }
}

/// Everything a run produced that charts may draw on.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactContext<'a> {
    /// Model configuration
    pub spec: &'a ModelSpec,
    /// Task of the model
    pub task: TaskType,
    /// Feature column names, in matrix order
    pub feature_names: &'a [String],
    /// Fitted model
    pub model: &'a TrainedModel,
    /// Test partition evaluation
    pub evaluation: &'a EvaluationResult,
    /// Train/test partitions
    pub split: &'a Split,
}

/// Builds the diagnostic artifacts of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticArtifactGenerator;

impl DiagnosticArtifactGenerator {
    /// Artifact kinds that apply to this run, in emission order.
    pub fn eligible_kinds(ctx: &ArtifactContext<'_>) -> Vec<ArtifactKind> {
        use ArtifactKind::*;

        let two_features = ctx.feature_names.len() == 2;
        match ctx.spec {
            ModelSpec::RandomForest(_) => {
                let mut kinds = vec![ConfusionMatrix, RocCurve, PrCurve, ClassDensity];
                if two_features {
                    kinds.push(DecisionBoundary);
                }
                kinds
            }
            ModelSpec::LogisticRegression(_) => vec![
                FeatureCoefficients,
                ConfusionMatrix,
                RocCurve,
                PrCurve,
                ClassDensity,
                ActualVsPredictedScatter,
            ],
            ModelSpec::Svm(params) => {
                let mut kinds = Vec::with_capacity(5);
                if params.kernel == SvmKernel::Linear && Self::svm_coefficients(ctx).is_some() {
                    kinds.push(FeatureCoefficients);
                }
                kinds.extend([ConfusionMatrix, RocCurve, PrCurve, ClassDensity]);
                kinds
            }
            ModelSpec::Knn(_) => {
                let mut kinds = vec![ConfusionMatrix, RocCurve, PrCurve, ActualVsPredictedScatter];
                if two_features {
                    kinds.push(DecisionBoundary);
                }
                kinds
            }
            ModelSpec::DecisionTree(_) => vec![
                FeatureImportance,
                ConfusionMatrix,
                RocCurve,
                PrCurve,
                TreeDiagram,
                ActualVsPredictedScatter,
            ],
            ModelSpec::LinearRegression => vec![
                ActualVsPredictedScatter,
                ErrorHistogram,
                ErrorBoxplot,
                SeriesOverlay,
                MetricsBar,
                FeatureVsTargetScatter,
            ],
        }
    }

    /// Build every eligible artifact whose data is defined.
    pub fn generate(ctx: &ArtifactContext<'_>) -> Vec<ArtifactSpec> {
        let artifacts: Vec<ArtifactSpec> = Self::eligible_kinds(ctx)
            .into_iter()
            .filter_map(|kind| match Self::build(kind, ctx) {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    log::debug!("Omitting {} artifact: {}", kind, e);
                    None
                }
            })
            .collect();

        log::info!(
            "Generated {} diagnostic artifacts for {} ({})",
            artifacts.len(),
            ctx.model.kind(),
            ctx.task
        );
        artifacts
    }

    /// Absolute SVM weights, when there is exactly one per feature
    fn svm_coefficients(ctx: &ArtifactContext<'_>) -> Option<Array1<f64>> {
        let weights: Array1<f64> = ctx.model.coefficients()?.iter().map(|w| w.abs()).collect();
        (weights.len() == ctx.feature_names.len()).then_some(weights)
    }

    fn build(kind: ArtifactKind, ctx: &ArtifactContext<'_>) -> Result<ArtifactSpec> {
        let eval = ctx.evaluation;
        let missing = |what: &str| EvalError::undefined_metric(kind.to_string(), what.to_string());

        let artifact = match kind {
            ArtifactKind::ConfusionMatrix => {
                let cm = eval
                    .confusion_matrix
                    .as_ref()
                    .ok_or_else(|| missing("no confusion matrix"))?;
                ArtifactSpec::new(
                    kind,
                    "Confusion Matrix",
                    AxisLabels::xy("Predicted", "Actual"),
                    Payload::confusion_matrix(cm),
                )
            }
            ArtifactKind::RocCurve => {
                let roc = eval.roc_curve.as_ref().ok_or_else(|| missing("no ROC curve"))?;
                ArtifactSpec::new(
                    kind,
                    "ROC Curve",
                    AxisLabels::xy("False Positive Rate", "True Positive Rate"),
                    Payload::Curve {
                        x: roc.fpr.clone(),
                        y: roc.tpr.clone(),
                        thresholds: roc.thresholds.clone(),
                        area: eval.metric("auc_roc"),
                        diagonal: true,
                    },
                )
            }
            ArtifactKind::PrCurve => {
                let pr = eval
                    .pr_curve
                    .as_ref()
                    .ok_or_else(|| missing("no precision-recall curve"))?;
                ArtifactSpec::new(
                    kind,
                    "Precision-Recall Curve",
                    AxisLabels::xy("Recall", "Precision"),
                    Payload::Curve {
                        x: pr.recall.clone(),
                        y: pr.precision.clone(),
                        thresholds: pr.thresholds.clone(),
                        area: None,
                        diagonal: false,
                    },
                )
            }
            ArtifactKind::ClassDensity => Self::class_density(ctx)?,
            ArtifactKind::DecisionBoundary => {
                let (y_train, labels) = ctx
                    .split
                    .y_train
                    .classes()
                    .ok_or_else(|| missing("continuous target"))?;
                ArtifactSpec::new(
                    kind,
                    "Decision Boundaries",
                    AxisLabels {
                        x: ctx.feature_names.first().cloned(),
                        y: ctx.feature_names.get(1).cloned(),
                        legend: labels.to_vec(),
                    },
                    payload::decision_boundary(
                        ctx.model,
                        ctx.feature_names,
                        &ctx.split.x_train,
                        y_train,
                        labels,
                    )?,
                )
            }
            ArtifactKind::FeatureCoefficients => match ctx.spec {
                ModelSpec::Svm(_) => {
                    let weights =
                        Self::svm_coefficients(ctx).ok_or_else(|| missing("no linear weights"))?;
                    ArtifactSpec::new(
                        kind,
                        "Feature Coefficients (Absolute Values)",
                        AxisLabels::xy("Absolute Coefficient Value", "Features"),
                        Payload::feature_bars(ctx.feature_names, weights.view())?,
                    )
                }
                _ => {
                    let coefficients =
                        ctx.model.coefficients().ok_or_else(|| missing("no coefficients"))?;
                    ArtifactSpec::new(
                        kind,
                        "Feature Coefficients",
                        AxisLabels::xy("Coefficient Value", "Features"),
                        Payload::feature_bars(ctx.feature_names, coefficients.row(0))?,
                    )
                }
            },
            ArtifactKind::FeatureImportance => {
                let importances = ctx
                    .model
                    .feature_importances()
                    .ok_or_else(|| missing("no importances"))?;
                ArtifactSpec::new(
                    kind,
                    "Feature Importances",
                    AxisLabels::xy("Feature Importance", "Features"),
                    Payload::feature_bars(ctx.feature_names, importances.view())?,
                )
            }
            ArtifactKind::TreeDiagram => {
                let tree = ctx.model.tree().ok_or_else(|| missing("not a tree model"))?;
                ArtifactSpec::new(
                    kind,
                    "Decision Tree Visualization",
                    AxisLabels::default(),
                    Payload::tree(tree, ctx.feature_names),
                )
            }
            ArtifactKind::ActualVsPredictedScatter => ArtifactSpec::new(
                kind,
                "Actual vs Predicted",
                AxisLabels::xy("Actual", "Predicted"),
                Payload::actual_vs_predicted(
                    &ctx.split.y_test.as_f64(),
                    &eval.predictions.as_f64(),
                )?,
            ),
            ArtifactKind::ErrorHistogram => ArtifactSpec::new(
                kind,
                "Error Histogram",
                AxisLabels::xy("Prediction Error", "Frequency"),
                payload::histogram(Self::errors(ctx)?.view(), ERROR_HISTOGRAM_BINS)?,
            ),
            ArtifactKind::ErrorBoxplot => ArtifactSpec::new(
                kind,
                "Boxplot of Prediction Error",
                AxisLabels {
                    x: None,
                    y: Some("Prediction Error".to_string()),
                    legend: Vec::new(),
                },
                Payload::Boxplot {
                    stats: payload::box_stats(Self::errors(ctx)?.view())?,
                },
            ),
            ArtifactKind::SeriesOverlay => ArtifactSpec::new(
                kind,
                "Actual vs Predicted",
                AxisLabels::xy("Index", "Value")
                    .with_legend(["Actual".to_string(), "Predicted".to_string()]),
                Payload::Series {
                    series: vec![
                        NamedSeries {
                            name: "Actual".to_string(),
                            values: ctx.split.y_test.as_f64().to_vec(),
                        },
                        NamedSeries {
                            name: "Predicted".to_string(),
                            values: eval.predictions.as_f64().to_vec(),
                        },
                    ],
                },
            ),
            ArtifactKind::MetricsBar => {
                let pairs = [("MSE", "mse"), ("MAE", "mae"), ("RMSE", "rmse"), ("R-squared", "r2")];
                let values = pairs
                    .iter()
                    .map(|&(_, name)| eval.metric(name).ok_or_else(|| missing(name)))
                    .collect::<Result<Vec<f64>>>()?;
                ArtifactSpec::new(
                    kind,
                    "Model Evaluation Metrics",
                    AxisLabels {
                        x: None,
                        y: Some("Value".to_string()),
                        legend: Vec::new(),
                    },
                    Payload::Bars {
                        categories: pairs.iter().map(|(label, _)| label.to_string()).collect(),
                        values,
                    },
                )
            }
            ArtifactKind::FeatureVsTargetScatter => {
                let rows = ctx.split.x_test.nrows().min(FEATURE_SCATTER_ROW_LIMIT);
                let head = ctx.split.x_test.slice(s![..rows, ..]);
                let features = ctx
                    .feature_names
                    .iter()
                    .zip(head.axis_iter(Axis(1)))
                    .map(|(name, column)| NamedSeries {
                        name: name.clone(),
                        values: column.to_vec(),
                    })
                    .collect();
                let actual = ctx.split.y_test.as_f64();
                let predicted = eval.predictions.as_f64();
                ArtifactSpec::new(
                    kind,
                    "Actual vs Predicted",
                    AxisLabels::xy("Feature", "Target")
                        .with_legend(["Actual".to_string(), "Predicted".to_string()]),
                    Payload::FeatureScatter {
                        features,
                        actual: actual.iter().take(rows).copied().collect(),
                        predicted: predicted.iter().take(rows).copied().collect(),
                    },
                )
            }
        };
        Ok(artifact)
    }

    fn errors(ctx: &ArtifactContext<'_>) -> Result<Array1<f64>> {
        let actual = ctx
            .split
            .y_test
            .continuous()
            .ok_or_else(|| EvalError::undefined_metric("prediction_errors", "class target"))?;
        prediction_errors(actual, &ctx.evaluation.predictions.as_f64())
    }

    /// KDE of positive-class scores per true class; classes without a
    /// defined density are dropped from the chart.
    fn class_density(ctx: &ArtifactContext<'_>) -> Result<ArtifactSpec> {
        let scores = ctx
            .evaluation
            .scores
            .as_ref()
            .ok_or_else(|| {
                EvalError::undefined_metric("class_density", "no positive-class scores")
            })?;
        let TargetVector::Classes { indices, labels } = &ctx.split.y_test else {
            return Err(EvalError::undefined_metric("class_density", "continuous target"));
        };

        let series: Vec<DensitySeries> = labels
            .iter()
            .enumerate()
            .filter_map(|(class, label)| {
                let values: Vec<f64> = indices
                    .iter()
                    .zip(scores.iter())
                    .filter(|(&i, _)| i == class)
                    .map(|(_, &s)| s)
                    .collect();
                match payload::gaussian_kde(format!("Class {}", label), &values) {
                    Ok(density) => Some(density),
                    Err(e) => {
                        log::debug!("Dropping density of class '{}': {}", label, e);
                        None
                    }
                }
            })
            .collect();
        if series.is_empty() {
            return Err(EvalError::undefined_metric(
                "class_density",
                "no class has a defined density",
            ));
        }

        Ok(ArtifactSpec::new(
            ArtifactKind::ClassDensity,
            "Probability Distributions of Predicted Classes",
            AxisLabels::xy("Predicted Probability", "Density")
                .with_legend(series.iter().map(|d| d.name.clone())),
            Payload::Density { series },
        ))
    }
}
