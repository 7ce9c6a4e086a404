//! CSV loader with per-column type inference.
//!
//! The first row holds column names. A column is boolean when every
//! non-missing cell reads `true`/`false`, numeric when every non-missing cell
//! parses as a float, and categorical otherwise. Empty cells and the usual
//! missing markers (`NA`, `N/A`, `NaN`, `null`, `None`) are read as missing.

use super::DataLoader;
use crate::core::constants::MISSING_VALUE_MARKERS;
use crate::core::error::{EvalError, Result};
use crate::dataset::dataset::{Column, ColumnData, Dataset};
use ::csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// CSV-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvConfig {
    /// Field delimiter
    pub delimiter: char,
    /// Quote character
    pub quote_char: char,
    /// Trim whitespace around fields
    pub trim: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        CsvConfig {
            delimiter: ',',
            quote_char: '"',
            trim: true,
        }
    }
}

/// CSV data loader
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    config: CsvConfig,
}

impl CsvLoader {
    /// Create a loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create CSV loader with custom configuration
    pub fn with_config(config: CsvConfig) -> Self {
        CsvLoader { config }
    }

    /// Set delimiter character
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Load a CSV file
    pub fn load_csv<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        log::info!("Loading CSV file: {}", path.display());

        if !path.is_file() {
            return Err(EvalError::data_loading(format!(
                "Path is not a readable file: {}",
                path.display()
            )));
        }

        let file = File::open(path).map_err(|e| {
            EvalError::data_loading(format!("Failed to open file {}: {}", path.display(), e))
        })?;
        self.load_from_reader(file)
    }

    /// Load CSV content from any reader
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter as u8)
            .quote(self.config.quote_char as u8)
            .has_headers(true)
            .flexible(false)
            .trim(if self.config.trim { Trim::All } else { Trim::None })
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.is_empty() {
            return Err(EvalError::data_loading("CSV input has no header row"));
        }

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        let mut record = StringRecord::new();
        loop {
            if !reader.read_record(&mut record)? {
                break;
            }
            for (column, field) in cells.iter_mut().zip(record.iter()) {
                column.push(parse_cell(field));
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::new(name, infer_column(values)))
            .collect();

        let dataset = Dataset::new(columns)?;
        log::info!(
            "Loaded {} rows x {} columns",
            dataset.num_rows(),
            dataset.num_columns()
        );
        Ok(dataset)
    }
}

impl DataLoader for CsvLoader {
    fn load<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        self.load_csv(path)
    }
}

fn parse_cell(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if MISSING_VALUE_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn infer_column(values: Vec<Option<String>>) -> ColumnData {
    let present = || values.iter().flatten();

    if present().next().is_some() && present().all(|v| parse_bool(v).is_some()) {
        return ColumnData::Boolean(
            values
                .iter()
                .map(|v| v.as_deref().and_then(parse_bool))
                .collect(),
        );
    }

    if present().all(|v| v.parse::<f64>().is_ok()) {
        return ColumnData::Numeric(
            values
                .iter()
                .map(|v| v.as_deref().and_then(|s| s.parse::<f64>().ok()))
                .collect(),
        );
    }

    ColumnData::Categorical(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::dataset::dataset::ColumnType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
age,city,member,score
31,Oslo,true,1.5
NA,Bergen,false,
45, Oslo ,TRUE,2
";

    #[test]
    fn test_type_inference() {
        let ds = CsvLoader::new().load_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.num_rows(), 3);
        let types: Vec<_> = ds.columns().iter().map(|c| c.column_type()).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Numeric,
                ColumnType::Categorical,
                ColumnType::Boolean,
                ColumnType::Numeric
            ]
        );
        assert_eq!(
            ds.column("age").unwrap().data(),
            &ColumnData::Numeric(vec![Some(31.0), None, Some(45.0)])
        );
        assert_eq!(
            ds.column("city").unwrap().data(),
            &ColumnData::Categorical(vec![
                Some("Oslo".to_string()),
                Some("Bergen".to_string()),
                Some("Oslo".to_string())
            ])
        );
        assert_eq!(ds.column("score").unwrap().data().missing_count(), 1);
    }

    #[test]
    fn test_missing_markers() {
        let input = "x,y\nnull,a\nN/A,None\nnan,b\n";
        let ds = CsvLoader::new().load_from_reader(input.as_bytes()).unwrap();
        assert_eq!(ds.column("x").unwrap().data().missing_count(), 3);
        assert_eq!(ds.column("x").unwrap().column_type(), ColumnType::Numeric);
        assert_eq!(ds.column("y").unwrap().data().missing_count(), 1);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let input = "a,b\n1,2\n3\n";
        let err = CsvLoader::new().load_from_reader(input.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoading);
        assert_eq!(err.category(), "csv");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a;b\n1;x\n2;y\n").unwrap();
        let ds = CsvLoader::new()
            .with_delimiter(';')
            .load(file.path())
            .unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b"]);

        let err = CsvLoader::new().load_csv("/nonexistent/data.csv").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoading);
    }
}
