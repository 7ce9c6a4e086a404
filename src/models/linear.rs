//! Ordinary least squares regression with intercept.

use super::linalg::cholesky_solve;
use crate::core::error::{EvalError, Result};
use ndarray::{Array1, Array2, Axis};

/// Fitted linear regression.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LinearRegression {
    /// Solve the centred normal equations `XcᵀXc w = Xcᵀyc`.
    ///
    /// Fails when `XcᵀXc` is singular (a constant or collinear feature, or
    /// fewer rows than features).
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        let (x_mean, y_mean) = match (x.mean_axis(Axis(0)), y.mean()) {
            (Some(xm), Some(ym)) => (xm, ym),
            _ => return Err(EvalError::training("linear regression needs at least one row")),
        };

        let xc = x - &x_mean;
        let yc = y - y_mean;
        let gram = xc.t().dot(&xc);
        let rhs = xc.t().dot(&yc);

        let coefficients = cholesky_solve(&gram, &rhs).ok_or_else(|| {
            EvalError::training(
                "normal equations are rank-deficient; remove constant or collinear features",
            )
        })?;
        let intercept = y_mean - x_mean.dot(&coefficients);

        log::debug!(
            "Linear regression fitted: intercept {:.4}, {} coefficients",
            intercept,
            coefficients.len()
        );
        Ok(LinearRegression {
            coefficients,
            intercept,
        })
    }

    /// Coefficient per feature
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// Intercept term
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Number of features
    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Predicted values
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }
}
