//! Deterministic train/test partitioning.
//!
//! Rows are shuffled with a seeded ChaCha permutation; the first
//! `ceil(test_fraction * n)` permuted rows form the test partition and the
//! remaining rows the training partition. The same input and seed always
//! yield the same partition.

use crate::core::constants::{DEFAULT_SPLIT_SEED, DEFAULT_TEST_FRACTION, MIN_PARTITION_ROWS};
use crate::core::error::{EvalError, Result};
use crate::core::types::RowIndex;
use crate::dataset::dataset::TargetVector;
use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Train and test partitions of a feature matrix and its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Training features
    pub x_train: Array2<f64>,
    /// Test features
    pub x_test: Array2<f64>,
    /// Training targets
    pub y_train: TargetVector,
    /// Test targets
    pub y_test: TargetVector,
    /// Source rows of the training partition
    pub train_rows: Vec<RowIndex>,
    /// Source rows of the test partition
    pub test_rows: Vec<RowIndex>,
}

/// Seeded splitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Splitter {
    test_fraction: f64,
    seed: u64,
}

impl Default for Splitter {
    fn default() -> Self {
        Splitter {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SPLIT_SEED,
        }
    }
}

impl Splitter {
    /// Splitter holding out `test_fraction` of the rows
    pub fn new(test_fraction: f64, seed: u64) -> Result<Self> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(EvalError::config(format!(
                "test fraction must lie in (0, 1), got {}",
                test_fraction
            )));
        }
        Ok(Splitter {
            test_fraction,
            seed,
        })
    }

    /// Held-out fraction
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Permutation seed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Partition sizes `(n_train, n_test)` for `n` rows
    pub fn partition_sizes(&self, n: usize) -> (usize, usize) {
        let n_test = ((self.test_fraction * n as f64).ceil() as usize).min(n);
        (n - n_test, n_test)
    }

    /// Row indices `(train, test)` for `n` rows, checking partition sizes
    pub fn indices(&self, n: usize) -> Result<(Vec<RowIndex>, Vec<RowIndex>)> {
        let (n_train, n_test) = self.partition_sizes(n);
        if n_train < MIN_PARTITION_ROWS {
            return Err(EvalError::insufficient_data("train", MIN_PARTITION_ROWS, n_train));
        }
        if n_test < MIN_PARTITION_ROWS {
            return Err(EvalError::insufficient_data("test", MIN_PARTITION_ROWS, n_test));
        }

        let mut permutation: Vec<RowIndex> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        permutation.shuffle(&mut rng);

        let train = permutation.split_off(n_test);
        Ok((train, permutation))
    }

    /// Split `x` and `y` into train and test partitions
    pub fn split(&self, x: &Array2<f64>, y: &TargetVector) -> Result<Split> {
        if x.nrows() != y.len() {
            return Err(EvalError::shape_mismatch(
                format!("{} target values", x.nrows()),
                format!("{} target values", y.len()),
            ));
        }

        let (train_rows, test_rows) = self.indices(x.nrows())?;
        log::debug!(
            "Split {} rows into {} train / {} test (seed {})",
            x.nrows(),
            train_rows.len(),
            test_rows.len(),
            self.seed
        );

        Ok(Split {
            x_train: x.select(Axis(0), &train_rows),
            x_test: x.select(Axis(0), &test_rows),
            y_train: y.select(&train_rows),
            y_test: y.select(&test_rows),
            train_rows,
            test_rows,
        })
    }
}
