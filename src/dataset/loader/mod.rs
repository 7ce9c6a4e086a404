//! Input boundary: reading tables into a [`Dataset`].

pub mod csv;

pub use self::csv::{CsvConfig, CsvLoader};

use crate::core::error::Result;
use crate::dataset::dataset::Dataset;
use std::path::Path;

/// Source of tabular data.
pub trait DataLoader {
    /// Load a dataset from `path`
    fn load<P: AsRef<Path>>(&self, path: P) -> Result<Dataset>;
}
