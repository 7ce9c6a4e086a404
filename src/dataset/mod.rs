//! Tabular data handling.
//!
//! This module covers everything between the raw table and the matrices a
//! model consumes: loading ([`loader`]), the in-memory [`Dataset`], the
//! preprocessing transform ([`preprocessing`]) and the deterministic
//! train/test split ([`partition`]).

pub mod dataset;
pub mod loader;
pub mod partition;
pub mod preprocessing;

pub use dataset::{Column, ColumnData, ColumnSummary, ColumnType, Dataset, TargetVector};
pub use loader::{CsvConfig, CsvLoader, DataLoader};
pub use partition::{Split, Splitter};
pub use preprocessing::Preprocessor;
