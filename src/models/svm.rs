//! Kernel support vector classifier trained with SMO.
//!
//! Binary problems use one machine whose positive side is the second class;
//! more classes use one machine per class (one-vs-rest) and predict the
//! class with the largest decision value. `gamma` follows the "scale"
//! heuristic `1 / (n_features · Var(X))`.

use super::{ClassSet, Classifier};
use crate::config::SvmParams;
use crate::core::constants::{POLY_KERNEL_DEGREE, SVM_MAX_SWEEPS, SVM_TOLERANCE};
use crate::core::types::SvmKernel;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Consecutive sweeps without an update before SMO stops.
const STABLE_PASSES: usize = 5;

/// Smallest alpha change that counts as progress.
const ALPHA_EPSILON: f64 = 1e-5;

/// Kernel function with its resolved `gamma`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    kind: SvmKernel,
    gamma: f64,
}

impl Kernel {
    /// Kernel of `kind` with `gamma` derived from the training matrix
    pub fn scaled(kind: SvmKernel, x: &Array2<f64>) -> Self {
        let n_features = x.ncols().max(1) as f64;
        let variance = x.var(0.0);
        let gamma = if variance > 0.0 {
            1.0 / (n_features * variance)
        } else {
            1.0
        };
        Kernel { kind, gamma }
    }

    /// Kernel kind
    pub fn kind(&self) -> SvmKernel {
        self.kind
    }

    /// Resolved gamma
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Evaluate `K(a, b)`
    pub fn apply(&self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        match self.kind {
            SvmKernel::Linear => a.dot(&b),
            SvmKernel::Poly => (self.gamma * a.dot(&b)).powi(POLY_KERNEL_DEGREE),
            SvmKernel::Rbf => {
                let diff = &a - &b;
                (-self.gamma * diff.dot(&diff)).exp()
            }
            SvmKernel::Sigmoid => (self.gamma * a.dot(&b)).tanh(),
        }
    }
}

/// A fitted binary machine.
#[derive(Debug, Clone, PartialEq)]
struct Machine {
    support_vectors: Array2<f64>,
    /// `alpha_i · y_i` for each support vector
    dual_coef: Array1<f64>,
    bias: f64,
}

impl Machine {
    fn decision(&self, kernel: &Kernel, row: ArrayView1<'_, f64>) -> f64 {
        self.support_vectors
            .rows()
            .into_iter()
            .zip(self.dual_coef.iter())
            .map(|(sv, &coef)| coef * kernel.apply(sv, row))
            .sum::<f64>()
            + self.bias
    }

    fn primal_weights(&self) -> Array1<f64> {
        self.support_vectors.t().dot(&self.dual_coef)
    }
}

/// Fitted support vector classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportVectorMachine {
    kernel: Kernel,
    machines: Vec<Machine>,
    n_features: usize,
    class_set: ClassSet,
}

impl SupportVectorMachine {
    /// Fit one SMO machine per one-vs-rest problem.
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        class_set: ClassSet,
        params: &SvmParams,
        seed: u64,
    ) -> Self {
        let kernel = Kernel::scaled(params.kernel, x);
        let gram = gram_matrix(&kernel, x);

        let positives: Vec<usize> = if class_set.len() == 2 {
            vec![1]
        } else {
            (0..class_set.len()).collect()
        };

        let machines = positives
            .iter()
            .enumerate()
            .map(|(m, &positive)| {
                let signs: Array1<f64> = y
                    .iter()
                    .map(|&k| if k == positive { 1.0 } else { -1.0 })
                    .collect();
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(m as u64));
                smo(x, &gram, &signs, params.c, &mut rng)
            })
            .collect();

        SupportVectorMachine {
            kernel,
            machines,
            n_features: x.ncols(),
            class_set,
        }
    }

    /// Kernel used by every machine
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Support vector count of each machine
    pub fn n_support_vectors(&self) -> Vec<usize> {
        self.machines.iter().map(|m| m.dual_coef.len()).collect()
    }

    /// Decision values, one column per machine
    pub fn decision_function(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut values = Array2::zeros((x.nrows(), self.machines.len()));
        for (i, row) in x.rows().into_iter().enumerate() {
            for (m, machine) in self.machines.iter().enumerate() {
                values[[i, m]] = machine.decision(&self.kernel, row);
            }
        }
        values
    }

    /// Primal weights, one row per machine; only the linear kernel has them
    pub fn coefficients(&self) -> Option<Array2<f64>> {
        if self.kernel.kind != SvmKernel::Linear {
            return None;
        }
        let mut coef = Array2::zeros((self.machines.len(), self.n_features));
        for (m, machine) in self.machines.iter().enumerate() {
            coef.row_mut(m).assign(&machine.primal_weights());
        }
        Some(coef)
    }
}

impl Classifier for SupportVectorMachine {
    fn class_set(&self) -> &ClassSet {
        &self.class_set
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    /// Binary machines score the first class with the negated decision value
    fn class_scores(&self, x: &Array2<f64>) -> Array2<f64> {
        let decision = self.decision_function(x);
        if self.class_set.len() != 2 {
            return decision;
        }
        let mut scores = Array2::zeros((x.nrows(), 2));
        for (i, &d) in decision.column(0).iter().enumerate() {
            scores[[i, 0]] = -d;
            scores[[i, 1]] = d;
        }
        scores
    }
}

fn gram_matrix(kernel: &Kernel, x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows();
    let mut gram = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let k = kernel.apply(x.row(i), x.row(j));
            gram[[i, j]] = k;
            gram[[j, i]] = k;
        }
    }
    gram
}

/// Simplified SMO: the second index is drawn at random from the generator.
fn smo(
    x: &Array2<f64>,
    gram: &Array2<f64>,
    y: &Array1<f64>,
    c: f64,
    rng: &mut ChaCha8Rng,
) -> Machine {
    let n = y.len();
    let mut alphas = Array1::<f64>::zeros(n);
    let mut bias = 0.0;

    let decision = |alphas: &Array1<f64>, bias: f64, i: usize| -> f64 {
        (0..n)
            .filter(|&k| alphas[k] > 0.0)
            .map(|k| alphas[k] * y[k] * gram[[k, i]])
            .sum::<f64>()
            + bias
    };

    let mut passes = 0;
    let mut sweeps = 0;
    while passes < STABLE_PASSES && sweeps < SVM_MAX_SWEEPS && n > 1 {
        let mut changed = 0;

        for i in 0..n {
            let e_i = decision(&alphas, bias, i) - y[i];
            let violates = (y[i] * e_i < -SVM_TOLERANCE && alphas[i] < c)
                || (y[i] * e_i > SVM_TOLERANCE && alphas[i] > 0.0);
            if !violates {
                continue;
            }

            let j = loop {
                let j = rng.gen_range(0..n);
                if j != i {
                    break j;
                }
            };
            let e_j = decision(&alphas, bias, j) - y[j];

            let (alpha_i_old, alpha_j_old) = (alphas[i], alphas[j]);
            let (low, high) = if y[i] != y[j] {
                ((alpha_j_old - alpha_i_old).max(0.0), (c + alpha_j_old - alpha_i_old).min(c))
            } else {
                ((alpha_i_old + alpha_j_old - c).max(0.0), (alpha_i_old + alpha_j_old).min(c))
            };
            if (high - low).abs() < 1e-12 {
                continue;
            }

            let eta = 2.0 * gram[[i, j]] - gram[[i, i]] - gram[[j, j]];
            if eta >= 0.0 {
                continue;
            }

            alphas[j] = (alpha_j_old - y[j] * (e_i - e_j) / eta).clamp(low, high);
            if (alphas[j] - alpha_j_old).abs() < ALPHA_EPSILON {
                alphas[j] = alpha_j_old;
                continue;
            }
            alphas[i] = alpha_i_old + y[i] * y[j] * (alpha_j_old - alphas[j]);

            let di = alphas[i] - alpha_i_old;
            let dj = alphas[j] - alpha_j_old;
            let b1 = bias - e_i - y[i] * di * gram[[i, i]] - y[j] * dj * gram[[i, j]];
            let b2 = bias - e_j - y[i] * di * gram[[i, j]] - y[j] * dj * gram[[j, j]];
            bias = if alphas[i] > 0.0 && alphas[i] < c {
                b1
            } else if alphas[j] > 0.0 && alphas[j] < c {
                b2
            } else {
                (b1 + b2) / 2.0
            };

            changed += 1;
        }

        sweeps += 1;
        passes = if changed == 0 { passes + 1 } else { 0 };
    }

    log::debug!("SMO finished after {} sweeps", sweeps);

    let support: Vec<usize> = (0..n).filter(|&i| alphas[i] > 1e-8).collect();
    Machine {
        support_vectors: x.select(Axis(0), &support),
        dual_coef: support.iter().map(|&i| alphas[i] * y[i]).collect(),
        bias,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Vec<usize>) {
        let x = array![
            [0.0, 0.0],
            [0.5, 0.3],
            [0.2, 0.8],
            [1.0, 0.5],
            [4.0, 4.0],
            [4.5, 3.8],
            [5.0, 4.5],
            [3.8, 4.9]
        ];
        (x, vec![0, 0, 0, 0, 1, 1, 1, 1])
    }

    #[test]
    fn test_linear_kernel_separates() {
        let (x, y) = separable();
        let params = SvmParams {
            c: 1.0,
            kernel: SvmKernel::Linear,
        };
        let svm = SupportVectorMachine::fit(&x, &y, ClassSet::for_tests(2), &params, 42);
        assert_eq!(svm.predict(&x), y);

        let coef = svm.coefficients().unwrap();
        assert_eq!(coef.shape(), &[1, 2]);
        assert!(coef[[0, 0]] > 0.0 || coef[[0, 1]] > 0.0);

        let scores = svm.class_scores(&x);
        assert_eq!(scores.ncols(), 2);
        assert_eq!(scores[[0, 0]], -scores[[0, 1]]);
    }

    #[test]
    fn test_rbf_kernel_has_no_coefficients() {
        let (x, y) = separable();
        let params = SvmParams {
            c: 1.0,
            kernel: SvmKernel::Rbf,
        };
        let svm = SupportVectorMachine::fit(&x, &y, ClassSet::for_tests(2), &params, 42);
        assert!(svm.coefficients().is_none());
        assert_eq!(svm.predict(&x), y);
    }

    #[test]
    fn test_scale_gamma() {
        let x = array![[0.0, 2.0], [2.0, 0.0]];
        let kernel = Kernel::scaled(SvmKernel::Rbf, &x);
        // Var over all entries is 1.0
        assert!((kernel.gamma() - 0.5).abs() < 1e-12);

        let constant = array![[1.0], [1.0]];
        assert_eq!(Kernel::scaled(SvmKernel::Rbf, &constant).gamma(), 1.0);
    }

    #[test]
    fn test_multiclass_one_vs_rest() {
        let x = array![[0.0], [0.3], [5.0], [5.3], [10.0], [10.3]];
        let y = vec![0, 0, 1, 1, 2, 2];
        let params = SvmParams {
            c: 10.0,
            kernel: SvmKernel::Rbf,
        };
        let svm = SupportVectorMachine::fit(&x, &y, ClassSet::for_tests(3), &params, 42);
        assert_eq!(svm.n_support_vectors().len(), 3);
        assert_eq!(svm.decision_function(&x).ncols(), 3);
        let predicted = svm.predict(&x);
        assert_eq!(predicted[0], 0);
        assert_eq!(predicted[5], 2);
    }
}
