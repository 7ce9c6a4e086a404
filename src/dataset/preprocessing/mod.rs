//! Fixed preprocessing transform applied before column selection.
//!
//! When enabled, the [`Preprocessor`] backward fills missing cells and then
//! one-hot encodes every categorical column. Cells that remain missing after
//! the fill are handled according to the configured [`ResidualNullPolicy`].

use crate::config::ResidualNullPolicy;
use crate::core::error::{EvalError, Result};
use crate::dataset::dataset::Dataset;

pub mod encoding;
pub mod missing;

pub use encoding::one_hot;
pub use missing::{backward_fill, backward_fill_column, backward_fill_values, columns_with_missing};

/// Backward fill followed by one-hot encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preprocessor {
    enabled: bool,
    residual_nulls: ResidualNullPolicy,
}

impl Preprocessor {
    /// Create a preprocessor; a disabled one passes datasets through
    pub fn new(enabled: bool, residual_nulls: ResidualNullPolicy) -> Self {
        Preprocessor {
            enabled,
            residual_nulls,
        }
    }

    /// Whether the transform is applied
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Apply the transform
    pub fn transform(&self, dataset: &Dataset) -> Result<Dataset> {
        if !self.enabled {
            log::debug!("Preprocessing disabled, dataset passed through");
            return Ok(dataset.clone());
        }

        let filled = backward_fill(dataset)?;

        let residual = columns_with_missing(&filled);
        if !residual.is_empty() {
            match self.residual_nulls {
                ResidualNullPolicy::Reject => {
                    return Err(EvalError::NullHandling { columns: residual });
                }
                ResidualNullPolicy::Keep => {
                    log::warn!(
                        "Trailing missing values kept after backward fill in: {}",
                        residual.join(", ")
                    );
                }
            }
        }

        let encoded = one_hot(&filled)?;
        log::info!(
            "Preprocessed dataset: {} columns -> {} columns",
            dataset.num_columns(),
            encoded.num_columns()
        );
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::dataset::dataset::{Column, ColumnData};

    fn raw() -> Dataset {
        Dataset::new(vec![
            Column::numeric("x", vec![None, Some(2.0), Some(3.0)]),
            Column::categorical("c", vec![Some("u"), None, Some("v")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_disabled_passthrough() {
        let ds = raw();
        let out = Preprocessor::new(false, ResidualNullPolicy::Reject)
            .transform(&ds)
            .unwrap();
        assert_eq!(out, ds);
    }

    #[test]
    fn test_fill_then_encode() {
        let out = Preprocessor::new(true, ResidualNullPolicy::Reject)
            .transform(&raw())
            .unwrap();
        assert_eq!(out.column_names(), vec!["x", "c_u", "c_v"]);
        assert_eq!(
            out.column("x").unwrap().data(),
            &ColumnData::Numeric(vec![Some(2.0), Some(2.0), Some(3.0)])
        );
        assert_eq!(
            out.column("c_v").unwrap().data(),
            &ColumnData::Boolean(vec![Some(false), Some(true), Some(true)])
        );
    }

    #[test]
    fn test_residual_null_policy() {
        let ds = Dataset::new(vec![
            Column::numeric("x", vec![Some(1.0), None]),
            Column::categorical("c", vec![Some("a"), None]),
        ])
        .unwrap();

        let err = Preprocessor::new(true, ResidualNullPolicy::Reject)
            .transform(&ds)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NullHandling);
        assert!(err.to_string().contains("x, c"));

        let out = Preprocessor::new(true, ResidualNullPolicy::Keep)
            .transform(&ds)
            .unwrap();
        assert_eq!(
            out.column("x").unwrap().data(),
            &ColumnData::Numeric(vec![Some(1.0), None])
        );
        assert_eq!(
            out.column("c_a").unwrap().data(),
            &ColumnData::Boolean(vec![Some(true), Some(false)])
        );
    }
}
