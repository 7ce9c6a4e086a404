//! In-memory tabular dataset.
//!
//! A [`Dataset`] is an ordered list of named, typed columns of equal length.
//! Cells may be missing. Feature matrices and target vectors are extracted
//! from it by column name once the user has made a selection.

use crate::core::error::{EvalError, Result};
use crate::core::types::{ClassIndex, RowIndex, TaskType};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Floating point values
    Numeric,
    /// String categories
    Categorical,
    /// True/false values, including one-hot indicators
    Boolean,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Numeric => write!(f, "numeric"),
            ColumnType::Categorical => write!(f, "categorical"),
            ColumnType::Boolean => write!(f, "boolean"),
        }
    }
}

/// Cell values of a column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    /// Numeric cells
    Numeric(Vec<Option<f64>>),
    /// Categorical cells
    Categorical(Vec<Option<String>>),
    /// Boolean cells
    Boolean(Vec<Option<bool>>),
}

impl ColumnData {
    /// Number of cells
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
        }
    }

    /// Whether the column has no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage type
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Numeric(_) => ColumnType::Numeric,
            ColumnData::Categorical(_) => ColumnType::Categorical,
            ColumnData::Boolean(_) => ColumnType::Boolean,
        }
    }

    /// Whether the cell at `row` is missing
    pub fn is_missing(&self, row: RowIndex) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Categorical(v) => v[row].is_none(),
            ColumnData::Boolean(v) => v[row].is_none(),
        }
    }

    /// Number of missing cells
    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Number of distinct non-missing values
    pub fn distinct_count(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v
                .iter()
                .flatten()
                .map(|x| x.to_bits())
                .collect::<HashSet<_>>()
                .len(),
            ColumnData::Categorical(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
            ColumnData::Boolean(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Create a column from its name and cells
    pub fn new<S: Into<String>>(name: S, data: ColumnData) -> Self {
        Column {
            name: name.into(),
            data,
        }
    }

    /// Numeric column
    pub fn numeric<S: Into<String>>(name: S, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    /// Categorical column
    pub fn categorical<S, I, V>(name: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = Option<V>>,
        V: Into<String>,
    {
        let values = values.into_iter().map(|v| v.map(Into::into)).collect();
        Self::new(name, ColumnData::Categorical(values))
    }

    /// Boolean column
    pub fn boolean<S: Into<String>>(name: S, values: Vec<Option<bool>>) -> Self {
        Self::new(name, ColumnData::Boolean(values))
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column cells
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Storage type
    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the column has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Per-column overview used when previewing a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// Column name
    pub name: String,
    /// Storage type
    pub column_type: ColumnType,
    /// Missing cell count
    pub missing: usize,
    /// Distinct non-missing value count
    pub distinct: usize,
}

/// Target values extracted for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetVector {
    /// Class indices into the sorted label set
    Classes {
        /// Per-row class index
        indices: Vec<ClassIndex>,
        /// Sorted distinct labels
        labels: Vec<String>,
    },
    /// Continuous values
    Continuous(Array1<f64>),
}

impl TargetVector {
    /// Number of rows
    pub fn len(&self) -> usize {
        match self {
            TargetVector::Classes { indices, .. } => indices.len(),
            TargetVector::Continuous(values) => values.len(),
        }
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows at `rows`, in that order. The label set is kept as is.
    pub fn select(&self, rows: &[RowIndex]) -> TargetVector {
        match self {
            TargetVector::Classes { indices, labels } => TargetVector::Classes {
                indices: rows.iter().map(|&r| indices[r]).collect(),
                labels: labels.clone(),
            },
            TargetVector::Continuous(values) => {
                TargetVector::Continuous(rows.iter().map(|&r| values[r]).collect())
            }
        }
    }

    /// Class indices and labels, if this is a classification target
    pub fn classes(&self) -> Option<(&[ClassIndex], &[String])> {
        match self {
            TargetVector::Classes { indices, labels } => Some((indices, labels)),
            TargetVector::Continuous(_) => None,
        }
    }

    /// Continuous values, if this is a regression target
    pub fn continuous(&self) -> Option<&Array1<f64>> {
        match self {
            TargetVector::Continuous(values) => Some(values),
            TargetVector::Classes { .. } => None,
        }
    }

    /// Targets as `f64`; class targets map to their class index
    pub fn as_f64(&self) -> Array1<f64> {
        match self {
            TargetVector::Classes { indices, .. } => indices.iter().map(|&i| i as f64).collect(),
            TargetVector::Continuous(values) => values.clone(),
        }
    }
}

/// Ordered collection of equal-length named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Dataset {
    /// Create a dataset, checking equal lengths and unique names
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map(Column::len).unwrap_or(0);

        let mut names = HashSet::new();
        for column in &columns {
            if column.len() != num_rows {
                return Err(EvalError::shape_mismatch(
                    format!("{} rows in every column", num_rows),
                    format!("{} rows in column '{}'", column.len(), column.name()),
                ));
            }
            if !names.insert(column.name()) {
                return Err(EvalError::data_loading(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }

        Ok(Dataset { columns, num_rows })
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Columns in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Consume the dataset, returning its columns
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Type, missing and distinct counts of every column
    pub fn describe(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .map(|c| ColumnSummary {
                name: c.name().to_string(),
                column_type: c.column_type(),
                missing: c.data().missing_count(),
                distinct: c.data().distinct_count(),
            })
            .collect()
    }

    /// Check that the selection names existing, distinct columns
    pub fn validate_selection(&self, target: &str, features: &[String]) -> Result<()> {
        if features.is_empty() {
            return Err(EvalError::invalid_selection("no feature columns selected"));
        }
        if self.column(target).is_none() {
            return Err(EvalError::invalid_selection(format!(
                "target column '{}' not found",
                target
            )));
        }
        for feature in features {
            if feature == target {
                return Err(EvalError::invalid_selection(format!(
                    "column '{}' is selected as both target and feature",
                    target
                )));
            }
            if self.column(feature).is_none() {
                return Err(EvalError::invalid_selection(format!(
                    "feature column '{}' not found",
                    feature
                )));
            }
        }
        Ok(())
    }

    /// Dense feature matrix with one column per selected feature.
    ///
    /// Boolean cells become 0.0/1.0. Categorical columns and missing cells
    /// cannot be fed to an estimator and fail the extraction.
    pub fn feature_matrix(&self, features: &[String]) -> Result<Array2<f64>> {
        let mut matrix = Array2::zeros((self.num_rows, features.len()));

        for (j, name) in features.iter().enumerate() {
            let column = self.column(name).ok_or_else(|| {
                EvalError::invalid_selection(format!("feature column '{}' not found", name))
            })?;

            match column.data() {
                ColumnData::Numeric(values) => {
                    for (i, value) in values.iter().enumerate() {
                        matrix[[i, j]] = value.ok_or_else(|| missing_cell(name, i))?;
                    }
                }
                ColumnData::Boolean(values) => {
                    for (i, value) in values.iter().enumerate() {
                        let flag = value.ok_or_else(|| missing_cell(name, i))?;
                        matrix[[i, j]] = if flag { 1.0 } else { 0.0 };
                    }
                }
                ColumnData::Categorical(_) => {
                    return Err(EvalError::training(format!(
                        "feature column '{}' is categorical; \
                         enable preprocessing to one-hot encode it",
                        name
                    )));
                }
            }
        }

        Ok(matrix)
    }

    /// Extract the target column for `task`.
    ///
    /// Classification accepts categorical, boolean and integral numeric
    /// columns; regression accepts numeric and boolean columns.
    pub fn target(&self, name: &str, task: TaskType) -> Result<TargetVector> {
        let column = self.column(name).ok_or_else(|| {
            EvalError::invalid_selection(format!("target column '{}' not found", name))
        })?;

        match task {
            TaskType::Classification => class_target(name, column.data()),
            TaskType::Regression => continuous_target(name, column.data()),
        }
    }
}

fn missing_cell(column: &str, row: RowIndex) -> EvalError {
    EvalError::training(format!("missing value in column '{}' at row {}", column, row))
}

fn class_target(name: &str, data: &ColumnData) -> Result<TargetVector> {
    match data {
        ColumnData::Categorical(values) => {
            let values = values
                .iter()
                .enumerate()
                .map(|(i, v)| v.clone().ok_or_else(|| missing_cell(name, i)))
                .collect::<Result<Vec<_>>>()?;
            let labels: Vec<String> = values
                .iter()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let indices = values
                .iter()
                .map(|v| labels.binary_search(v).unwrap_or_default())
                .collect();
            Ok(TargetVector::Classes { indices, labels })
        }
        ColumnData::Boolean(values) => {
            let values = values
                .iter()
                .enumerate()
                .map(|(i, v)| v.ok_or_else(|| missing_cell(name, i)))
                .collect::<Result<Vec<_>>>()?;
            let distinct: Vec<bool> = values
                .iter()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let indices = values
                .iter()
                .map(|v| distinct.binary_search(v).unwrap_or_default())
                .collect();
            let labels = distinct.iter().map(|b| b.to_string()).collect();
            Ok(TargetVector::Classes { indices, labels })
        }
        ColumnData::Numeric(values) => {
            let mut parsed = Vec::with_capacity(values.len());
            for (i, value) in values.iter().enumerate() {
                let value = value.ok_or_else(|| missing_cell(name, i))?;
                if !value.is_finite() || value.fract() != 0.0 {
                    return Err(EvalError::training(format!(
                        "target column '{}' holds continuous value {} at row {}; \
                         classifiers need discrete labels",
                        name, value, i
                    )));
                }
                parsed.push(value);
            }

            let mut distinct = parsed.clone();
            distinct.sort_by(f64::total_cmp);
            distinct.dedup();
            let indices = parsed
                .iter()
                .map(|v| distinct.binary_search_by(|d| d.total_cmp(v)).unwrap_or_default())
                .collect();
            let labels = distinct.iter().map(|v| v.to_string()).collect();
            Ok(TargetVector::Classes { indices, labels })
        }
    }
}

fn continuous_target(name: &str, data: &ColumnData) -> Result<TargetVector> {
    let values = match data {
        ColumnData::Numeric(values) => values
            .iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| missing_cell(name, i)))
            .collect::<Result<Array1<f64>>>()?,
        ColumnData::Boolean(values) => values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.map(|b| if b { 1.0 } else { 0.0 })
                    .ok_or_else(|| missing_cell(name, i))
            })
            .collect::<Result<Array1<f64>>>()?,
        ColumnData::Categorical(_) => {
            return Err(EvalError::training(format!(
                "target column '{}' is categorical; a regressor needs a numeric target",
                name
            )));
        }
    };
    Ok(TargetVector::Continuous(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::numeric("age", vec![Some(30.0), Some(42.0), Some(25.0)]),
            Column::categorical("city", vec![Some("Oslo"), Some("Bergen"), Some("Oslo")]),
            Column::numeric("label", vec![Some(1.0), Some(0.0), Some(1.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_dataset_shape_checks() {
        let err = Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0), Some(2.0)]),
            Column::numeric("b", vec![Some(1.0)]),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);

        let err = Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::numeric("a", vec![Some(1.0)]),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoading);

        let ds = sample();
        assert_eq!(ds.num_rows(), 3);
        assert_eq!(ds.column_names(), vec!["age", "city", "label"]);
    }

    #[test]
    fn test_selection_validation() {
        let ds = sample();
        assert!(ds.validate_selection("label", &["age".to_string()]).is_ok());
        assert!(ds.validate_selection("label", &["label".to_string()]).is_err());
        assert!(ds.validate_selection("missing", &["age".to_string()]).is_err());
        let err = ds.validate_selection("label", &["height".to_string()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSelection);
    }

    #[test]
    fn test_feature_matrix() {
        let ds = Dataset::new(vec![
            Column::numeric("x", vec![Some(1.5), Some(-2.0)]),
            Column::boolean("flag", vec![Some(true), Some(false)]),
        ])
        .unwrap();
        let m = ds
            .feature_matrix(&["flag".to_string(), "x".to_string()])
            .unwrap();
        assert_eq!(m.shape(), &[2, 2]);
        assert_eq!(m[[0, 0]], 1.0);
        assert_eq!(m[[1, 1]], -2.0);

        let err = sample().feature_matrix(&["city".to_string()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TrainingFailure);

        let ds = Dataset::new(vec![Column::numeric("x", vec![Some(1.0), None])]).unwrap();
        let err = ds.feature_matrix(&["x".to_string()]).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_class_target_labels_sorted() {
        let ds = sample();
        let target = ds.target("city", TaskType::Classification).unwrap();
        let (indices, labels) = target.classes().unwrap();
        assert_eq!(labels, &["Bergen".to_string(), "Oslo".to_string()]);
        assert_eq!(indices, &[1, 0, 1]);

        let target = ds.target("label", TaskType::Classification).unwrap();
        let (indices, labels) = target.classes().unwrap();
        assert_eq!(labels, &["0".to_string(), "1".to_string()]);
        assert_eq!(indices, &[1, 0, 1]);
    }

    #[test]
    fn test_target_kind_compatibility() {
        let ds = sample();
        let err = ds.target("city", TaskType::Regression).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TrainingFailure);

        let err = ds.target("age", TaskType::Classification);
        assert!(err.is_ok());

        let ds = Dataset::new(vec![Column::numeric("y", vec![Some(0.5), Some(1.0)])]).unwrap();
        let err = ds.target("y", TaskType::Classification).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TrainingFailure);

        let target = ds.target("y", TaskType::Regression).unwrap();
        assert_eq!(target.continuous().unwrap().len(), 2);
    }

    #[test]
    fn test_target_select() {
        let target = sample().target("city", TaskType::Classification).unwrap();
        let picked = target.select(&[2, 1]);
        let (indices, labels) = picked.classes().unwrap();
        assert_eq!(indices, &[1, 0]);
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn test_describe() {
        let ds = Dataset::new(vec![
            Column::numeric("x", vec![Some(1.0), None, Some(1.0)]),
            Column::categorical("c", vec![Some("a"), Some("b"), None::<&str>]),
        ])
        .unwrap();
        let summary = ds.describe();
        assert_eq!(summary[0].missing, 1);
        assert_eq!(summary[0].distinct, 1);
        assert_eq!(summary[1].column_type, ColumnType::Categorical);
        assert_eq!(summary[1].distinct, 2);
    }
}
