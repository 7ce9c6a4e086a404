//! Estimators, their construction and their fitted form.
//!
//! [`ModelFactory`] turns a validated [`ModelSpec`](crate::config::ModelSpec)
//! into a [`ModelHandle`]; [`Trainer`] fits a handle on the training
//! partition and returns a [`TrainedModel`], a closed enum over the six
//! fitted variants. Classifiers share the [`Classifier`] trait, which maps
//! per-class scores to predicted class indices.

pub mod factory;
pub mod forest;
pub mod knn;
pub mod linalg;
pub mod linear;
pub mod logistic;
pub mod svm;
pub mod trainer;
pub mod tree;

pub use factory::{ModelFactory, ModelHandle};
pub use forest::RandomForest;
pub use knn::KNearestNeighbors;
pub use linear::LinearRegression;
pub use logistic::LogisticRegression;
pub use svm::SupportVectorMachine;
pub use trainer::Trainer;
pub use tree::{DecisionTree, SplitRule, TreeNode};

use crate::core::error::{EvalError, Result};
use crate::core::types::{ClassIndex, ModelKind, TaskType};
use crate::dataset::TargetVector;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Classes a classifier was fitted on.
///
/// Estimators work on local indices `0..len()`; [`ClassSet::global`] maps
/// them back to indices into the target's full label set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSet {
    classes: Vec<ClassIndex>,
    labels: Vec<String>,
}

impl ClassSet {
    /// Classes present in `y`, plus `y` re-encoded with local indices
    pub fn from_target(y: &TargetVector) -> Result<(Self, Vec<usize>)> {
        let (indices, labels) = y
            .classes()
            .ok_or_else(|| EvalError::training("classifiers need a class-valued target"))?;

        let mut classes: Vec<ClassIndex> = indices.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(EvalError::training(format!(
                "training partition holds {} class(es); at least 2 are required",
                classes.len()
            )));
        }

        let local = indices
            .iter()
            .map(|i| classes.binary_search(i).unwrap_or_default())
            .collect();

        Ok((
            ClassSet {
                classes,
                labels: labels.to_vec(),
            },
            local,
        ))
    }

    #[cfg(test)]
    pub(crate) fn for_tests(n: usize) -> Self {
        ClassSet {
            classes: (0..n).collect(),
            labels: (0..n).map(|i| i.to_string()).collect(),
        }
    }

    /// Number of fitted classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no class was fitted
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Global class index of local class `local`
    pub fn global(&self, local: usize) -> ClassIndex {
        self.classes[local]
    }

    /// Global indices of the fitted classes
    pub fn classes(&self) -> &[ClassIndex] {
        &self.classes
    }

    /// Full label set of the target
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Both the target and the fitted model have exactly two classes
    pub fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.labels.len() == 2
    }
}

/// Common behaviour of fitted classifiers.
pub trait Classifier {
    /// Classes seen during fitting
    fn class_set(&self) -> &ClassSet;

    /// Number of input features
    fn n_features(&self) -> usize;

    /// Per-class scores, one column per fitted class; larger is more likely
    fn class_scores(&self, x: &Array2<f64>) -> Array2<f64>;

    /// Predicted global class indices; ties go to the lower class
    fn predict(&self, x: &Array2<f64>) -> Vec<ClassIndex> {
        let scores = self.class_scores(x);
        scores
            .rows()
            .into_iter()
            .map(|row| self.class_set().global(linalg::argmax(row)))
            .collect()
    }
}

/// Model output for a feature matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum Predictions {
    /// Global class indices
    Classes(Vec<ClassIndex>),
    /// Continuous predictions
    Values(Array1<f64>),
}

impl Predictions {
    /// Number of predicted rows
    pub fn len(&self) -> usize {
        match self {
            Predictions::Classes(c) => c.len(),
            Predictions::Values(v) => v.len(),
        }
    }

    /// Whether nothing was predicted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Predictions as `f64`; classes map to their index
    pub fn as_f64(&self) -> Array1<f64> {
        match self {
            Predictions::Classes(c) => c.iter().map(|&i| i as f64).collect(),
            Predictions::Values(v) => v.clone(),
        }
    }
}

/// A fitted model, owned by one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainedModel {
    /// Fitted random forest
    RandomForest(RandomForest),
    /// Fitted logistic regression
    LogisticRegression(LogisticRegression),
    /// Fitted support vector classifier
    Svm(SupportVectorMachine),
    /// Fitted KNN classifier
    Knn(KNearestNeighbors),
    /// Fitted decision tree
    DecisionTree(DecisionTree),
    /// Fitted least squares regression
    LinearRegression(LinearRegression),
}

impl TrainedModel {
    /// Variant tag
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::RandomForest(_) => ModelKind::RandomForest,
            TrainedModel::LogisticRegression(_) => ModelKind::LogisticRegression,
            TrainedModel::Svm(_) => ModelKind::Svm,
            TrainedModel::Knn(_) => ModelKind::Knn,
            TrainedModel::DecisionTree(_) => ModelKind::DecisionTree,
            TrainedModel::LinearRegression(_) => ModelKind::LinearRegression,
        }
    }

    /// Task solved by the model
    pub fn task_type(&self) -> TaskType {
        self.kind().task_type()
    }

    /// Classifier view, `None` for the regressor
    pub fn classifier(&self) -> Option<&dyn Classifier> {
        match self {
            TrainedModel::RandomForest(m) => Some(m as &dyn Classifier),
            TrainedModel::LogisticRegression(m) => Some(m as &dyn Classifier),
            TrainedModel::Svm(m) => Some(m as &dyn Classifier),
            TrainedModel::Knn(m) => Some(m as &dyn Classifier),
            TrainedModel::DecisionTree(m) => Some(m as &dyn Classifier),
            TrainedModel::LinearRegression(_) => None,
        }
    }

    /// Number of input features
    pub fn n_features(&self) -> usize {
        match self {
            TrainedModel::RandomForest(m) => m.n_features(),
            TrainedModel::LogisticRegression(m) => m.n_features(),
            TrainedModel::Svm(m) => m.n_features(),
            TrainedModel::Knn(m) => m.n_features(),
            TrainedModel::DecisionTree(m) => m.n_features(),
            TrainedModel::LinearRegression(m) => m.n_features(),
        }
    }

    /// Classes of a classifier
    pub fn class_set(&self) -> Option<&ClassSet> {
        self.classifier().map(|c| c.class_set())
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features() {
            return Err(EvalError::shape_mismatch(
                format!("{} feature columns", self.n_features()),
                format!("{} feature columns", x.ncols()),
            ));
        }
        Ok(())
    }

    /// Predict classes or values for `x`
    pub fn predict(&self, x: &Array2<f64>) -> Result<Predictions> {
        self.check_input(x)?;
        Ok(match self {
            TrainedModel::RandomForest(m) => Predictions::Classes(m.predict(x)),
            TrainedModel::LogisticRegression(m) => Predictions::Classes(m.predict(x)),
            TrainedModel::Svm(m) => Predictions::Classes(m.predict(x)),
            TrainedModel::Knn(m) => Predictions::Classes(m.predict(x)),
            TrainedModel::DecisionTree(m) => Predictions::Classes(m.predict(x)),
            TrainedModel::LinearRegression(m) => Predictions::Values(m.predict(x)),
        })
    }

    /// Per-class scores of a classifier
    pub fn class_scores(&self, x: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        self.check_input(x)?;
        Ok(self.classifier().map(|c| c.class_scores(x)))
    }

    /// Score of the second class for a binary classifier
    pub fn positive_scores(&self, x: &Array2<f64>) -> Result<Option<Array1<f64>>> {
        let binary = self.class_set().map(ClassSet::is_binary).unwrap_or(false);
        if !binary {
            return Ok(None);
        }
        Ok(self.class_scores(x)?.map(|scores| scores.column(1).to_owned()))
    }

    /// Linear coefficients, one row per binary machine.
    ///
    /// Logistic regression always has them; the SVM only with a linear
    /// kernel. The regressor reports a single row.
    pub fn coefficients(&self) -> Option<Array2<f64>> {
        match self {
            TrainedModel::LogisticRegression(m) => Some(m.coefficients().clone()),
            TrainedModel::Svm(m) => m.coefficients(),
            TrainedModel::LinearRegression(m) => {
                Some(m.coefficients().clone().insert_axis(ndarray::Axis(0)))
            }
            TrainedModel::RandomForest(_)
            | TrainedModel::Knn(_)
            | TrainedModel::DecisionTree(_) => None,
        }
    }

    /// Impurity-based importances of tree models
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        match self {
            TrainedModel::RandomForest(m) => Some(m.feature_importances()),
            TrainedModel::DecisionTree(m) => Some(m.feature_importances()),
            TrainedModel::LogisticRegression(_)
            | TrainedModel::Svm(_)
            | TrainedModel::Knn(_)
            | TrainedModel::LinearRegression(_) => None,
        }
    }

    /// The fitted tree of a decision tree model
    pub fn tree(&self) -> Option<&DecisionTree> {
        match self {
            TrainedModel::DecisionTree(m) => Some(m),
            TrainedModel::RandomForest(_)
            | TrainedModel::LogisticRegression(_)
            | TrainedModel::Svm(_)
            | TrainedModel::Knn(_)
            | TrainedModel::LinearRegression(_) => None,
        }
    }
}

/// Reject matrices holding NaN or infinite values.
pub(crate) fn check_finite(x: &Array2<f64>, what: &str) -> Result<()> {
    if let Some(((row, col), value)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(EvalError::training(format!(
            "{} holds non-finite value {} at row {}, column {}",
            what, value, row, col
        )));
    }
    Ok(())
}
