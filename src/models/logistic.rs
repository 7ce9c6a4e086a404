//! L2-regularised logistic regression.
//!
//! Each binary machine minimises `½‖w‖² + C Σ logloss` with an unpenalised
//! intercept, solved by Newton's method (IRLS) with step halving. More than
//! two classes are handled one-vs-rest, with the machine probabilities
//! normalised per row.

use super::linalg::{cholesky_solve, sigmoid};
use super::{ClassSet, Classifier};
use crate::core::constants::{LOGISTIC_MAX_ITER, LOGISTIC_TOLERANCE};
use crate::core::error::{EvalError, Result};
use ndarray::{s, Array1, Array2};

const MAX_HALVINGS: usize = 30;

/// Fitted logistic regression.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    /// One row per binary machine
    coefficients: Array2<f64>,
    intercepts: Array1<f64>,
    class_set: ClassSet,
}

impl LogisticRegression {
    /// Fit with inverse regularisation strength `c`.
    pub fn fit(x: &Array2<f64>, y: &[usize], class_set: ClassSet, c: f64) -> Result<Self> {
        let n_features = x.ncols();
        let design = with_intercept(x);

        // A binary problem needs a single machine for the second class
        let machines: Vec<usize> = if class_set.len() == 2 {
            vec![1]
        } else {
            (0..class_set.len()).collect()
        };

        let mut coefficients = Array2::zeros((machines.len(), n_features));
        let mut intercepts = Array1::zeros(machines.len());
        for (m, &class) in machines.iter().enumerate() {
            let target: Array1<f64> = y
                .iter()
                .map(|&k| if k == class { 1.0 } else { 0.0 })
                .collect();
            let beta = newton(&design, &target, c)?;
            coefficients.row_mut(m).assign(&beta.slice(s![..n_features]));
            intercepts[m] = beta[n_features];
        }

        Ok(LogisticRegression {
            coefficients,
            intercepts,
            class_set,
        })
    }

    /// Coefficient matrix, one row per binary machine
    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    /// Intercept of each binary machine
    pub fn intercepts(&self) -> &Array1<f64> {
        &self.intercepts
    }

    /// Class probabilities, one column per class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let logits = x.dot(&self.coefficients.t()) + &self.intercepts;
        let machine_proba = logits.mapv(sigmoid);

        if self.class_set.len() == 2 {
            let mut proba = Array2::zeros((x.nrows(), 2));
            for (i, &p) in machine_proba.column(0).iter().enumerate() {
                proba[[i, 0]] = 1.0 - p;
                proba[[i, 1]] = p;
            }
            return proba;
        }

        let mut proba = machine_proba;
        for mut row in proba.rows_mut() {
            let total = row.sum();
            if total > 0.0 {
                row /= total;
            }
        }
        proba
    }
}

impl Classifier for LogisticRegression {
    fn class_set(&self) -> &ClassSet {
        &self.class_set
    }

    fn n_features(&self) -> usize {
        self.coefficients.ncols()
    }

    fn class_scores(&self, x: &Array2<f64>) -> Array2<f64> {
        self.predict_proba(x)
    }
}

fn with_intercept(x: &Array2<f64>) -> Array2<f64> {
    let mut design = Array2::ones((x.nrows(), x.ncols() + 1));
    design.slice_mut(s![.., ..x.ncols()]).assign(x);
    design
}

fn objective(design: &Array2<f64>, target: &Array1<f64>, beta: &Array1<f64>, c: f64) -> f64 {
    let p = beta.len() - 1;
    let penalty = 0.5 * beta.slice(s![..p]).dot(&beta.slice(s![..p]));
    let z = design.dot(beta);
    let loss: f64 = z
        .iter()
        .zip(target.iter())
        .map(|(&z, &t)| {
            // log(1 + e^z) - t z, stable for large |z|
            let softplus = if z > 0.0 { z + (-z).exp().ln_1p() } else { z.exp().ln_1p() };
            softplus - t * z
        })
        .sum();
    penalty + c * loss
}

fn newton(design: &Array2<f64>, target: &Array1<f64>, c: f64) -> Result<Array1<f64>> {
    let dim = design.ncols();
    let intercept = dim - 1;
    let mut beta = Array1::<f64>::zeros(dim);
    let mut current = objective(design, target, &beta, c);

    for iter in 0..LOGISTIC_MAX_ITER {
        let p = design.dot(&beta).mapv(sigmoid);

        let mut gradient = design.t().dot(&(&p - target)) * c;
        let mut hessian = Array2::<f64>::zeros((dim, dim));
        for (row, &pi) in design.rows().into_iter().zip(p.iter()) {
            let w = c * pi * (1.0 - pi);
            for a in 0..dim {
                let ra = row[a] * w;
                for b in 0..=a {
                    hessian[[a, b]] += ra * row[b];
                }
            }
        }
        for a in 0..dim {
            for b in 0..a {
                hessian[[b, a]] = hessian[[a, b]];
            }
            if a != intercept {
                hessian[[a, a]] += 1.0;
                gradient[a] += beta[a];
            }
        }
        // Keeps the intercept pivot positive once probabilities saturate
        hessian[[intercept, intercept]] += 1e-12;

        let step = cholesky_solve(&hessian, &gradient).ok_or_else(|| {
            EvalError::training("logistic regression Hessian is not positive definite")
        })?;

        let mut scale = 1.0;
        let mut candidate = &beta - &step;
        let mut value = objective(design, target, &candidate, c);
        let mut halvings = 0;
        while value > current && halvings < MAX_HALVINGS {
            scale *= 0.5;
            candidate = &beta - &(&step * scale);
            value = objective(design, target, &candidate, c);
            halvings += 1;
        }

        let step_norm = (&step * scale).mapv(|v| v * v).sum().sqrt();
        beta = candidate;
        current = value;

        if step_norm < LOGISTIC_TOLERANCE {
            log::debug!("Logistic regression converged after {} iterations", iter + 1);
            return Ok(beta);
        }
    }

    log::debug!(
        "Logistic regression reached {} iterations without meeting tolerance",
        LOGISTIC_MAX_ITER
    );
    Ok(beta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_binary_logistic() {
        let x = array![[-3.0], [-2.0], [-1.5], [-0.5], [0.5], [1.0], [2.0], [3.0]];
        let y = [0, 0, 0, 1, 0, 1, 1, 1];
        let model = LogisticRegression::fit(&x, &y, ClassSet::for_tests(2), 1.0).unwrap();

        assert_eq!(model.coefficients().shape(), &[1, 1]);
        assert!(model.coefficients()[[0, 0]] > 0.0);

        let proba = model.predict_proba(&array![[-10.0], [10.0]]);
        assert!(proba[[0, 0]] > 0.9);
        assert!(proba[[1, 1]] > 0.9);
        assert_eq!(model.predict(&array![[-10.0], [10.0]]), vec![0, 1]);
    }

    #[test]
    fn test_separable_data_stays_finite() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = [0, 0, 1, 1];
        let model = LogisticRegression::fit(&x, &y, ClassSet::for_tests(2), 10.0).unwrap();
        assert!(model.coefficients().iter().all(|v| v.is_finite()));
        assert!(model.intercepts().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_stronger_regularisation_shrinks() {
        let x = array![[-2.0], [-1.0], [0.0], [1.0], [2.0], [0.5]];
        let y = [0, 0, 1, 1, 1, 0];
        let loose = LogisticRegression::fit(&x, &y, ClassSet::for_tests(2), 10.0).unwrap();
        let tight = LogisticRegression::fit(&x, &y, ClassSet::for_tests(2), 0.01).unwrap();
        assert!(tight.coefficients()[[0, 0]].abs() < loose.coefficients()[[0, 0]].abs());
    }

    #[test]
    fn test_one_vs_rest() {
        let x = array![[0.0], [0.2], [5.0], [5.2], [10.0], [10.2]];
        let y = [0, 0, 1, 1, 2, 2];
        let model = LogisticRegression::fit(&x, &y, ClassSet::for_tests(3), 10.0).unwrap();
        assert_eq!(model.coefficients().nrows(), 3);
        let proba = model.predict_proba(&x);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
        let predicted = model.predict(&array![[-5.0], [15.0]]);
        assert_eq!(predicted, vec![0, 2]);
    }
}
