//! Regression metrics.

use crate::core::error::{EvalError, Result};
use ndarray::Array1;

fn residuals(metric: &str, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Array1<f64>> {
    if y_true.len() != y_pred.len() {
        return Err(EvalError::shape_mismatch(
            format!("{} predictions for {}", y_true.len(), metric),
            format!("{} predictions", y_pred.len()),
        ));
    }
    if y_true.is_empty() {
        return Err(EvalError::undefined_metric(metric, "no samples to evaluate"));
    }
    Ok(y_true - y_pred)
}

/// Mean squared error.
pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    let r = residuals("mse", y_true, y_pred)?;
    Ok(r.mapv(|e| e * e).sum() / r.len() as f64)
}

/// Mean absolute error.
pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    let r = residuals("mae", y_true, y_pred)?;
    Ok(r.mapv(f64::abs).sum() / r.len() as f64)
}

/// Root of the mean squared error.
pub fn root_mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    Ok(mean_squared_error(y_true, y_pred)?.sqrt())
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// A constant target has `SS_tot = 0`; the score is then 1.0 for a perfect
/// fit and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    let r = residuals("r2", y_true, y_pred)?;
    let ss_res = r.mapv(|e| e * e).sum();
    let mean = y_true.sum() / y_true.len() as f64;
    let ss_tot = y_true.mapv(|v| (v - mean) * (v - mean)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Prediction errors `y_pred - y_true`, as shown by the error diagnostics.
pub fn prediction_errors(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Array1<f64>> {
    Ok(-residuals("prediction_errors", y_true, y_pred)?)
}
