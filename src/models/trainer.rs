//! Fitting a model handle on the training partition.

use super::tree::TreeParams;
use super::{
    check_finite, ClassSet, DecisionTree, KNearestNeighbors, LinearRegression, LogisticRegression,
    ModelHandle, RandomForest, SupportVectorMachine, TrainedModel,
};
use crate::config::ModelSpec;
use crate::core::error::{EvalError, Result};
use crate::dataset::TargetVector;
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Fits models. Stateless; every fit is independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trainer;

impl Trainer {
    /// Fit `handle` on `x` and `y`.
    pub fn fit(handle: &ModelHandle, x: &Array2<f64>, y: &TargetVector) -> Result<TrainedModel> {
        if x.nrows() != y.len() {
            return Err(EvalError::shape_mismatch(
                format!("{} target values", x.nrows()),
                format!("{} target values", y.len()),
            ));
        }
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(EvalError::training("training matrix is empty"));
        }
        check_finite(x, "training features")?;

        log::info!(
            "Training {} on {} rows x {} features",
            handle.kind(),
            x.nrows(),
            x.ncols()
        );

        let model = match handle.spec() {
            ModelSpec::LinearRegression => {
                let values = y.continuous().ok_or_else(|| {
                    EvalError::training("linear regression needs a continuous target")
                })?;
                TrainedModel::LinearRegression(LinearRegression::fit(x, values)?)
            }
            ModelSpec::RandomForest(params) => {
                let (classes, local) = ClassSet::from_target(y)?;
                TrainedModel::RandomForest(RandomForest::fit(
                    x,
                    &local,
                    classes,
                    params,
                    handle.seed(),
                ))
            }
            ModelSpec::LogisticRegression(params) => {
                let (classes, local) = ClassSet::from_target(y)?;
                TrainedModel::LogisticRegression(LogisticRegression::fit(
                    x, &local, classes, params.c,
                )?)
            }
            ModelSpec::Svm(params) => {
                let (classes, local) = ClassSet::from_target(y)?;
                TrainedModel::Svm(SupportVectorMachine::fit(
                    x,
                    &local,
                    classes,
                    params,
                    handle.seed(),
                ))
            }
            ModelSpec::Knn(params) => {
                let (classes, local) = ClassSet::from_target(y)?;
                TrainedModel::Knn(KNearestNeighbors::fit(x, &local, classes, params.neighbors)?)
            }
            ModelSpec::DecisionTree(params) => {
                let (classes, local) = ClassSet::from_target(y)?;
                let rows: Vec<usize> = (0..x.nrows()).collect();
                let mut rng = ChaCha8Rng::seed_from_u64(handle.seed());
                TrainedModel::DecisionTree(DecisionTree::fit(
                    x,
                    &local,
                    &rows,
                    classes,
                    TreeParams::with_max_depth(params.max_depth),
                    &mut rng,
                ))
            }
        };

        log::debug!("{} training finished", handle.kind());
        Ok(model)
    }
}
