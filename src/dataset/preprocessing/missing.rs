//! Missing value handling.
//!
//! Missing cells are filled with the next valid value of the same column
//! (backward fill). A trailing run of missing cells has no later value to
//! borrow and is left missing; callers decide what to do with it.

use crate::core::error::Result;
use crate::dataset::dataset::{Column, ColumnData, Dataset};

/// Fill each missing cell with the next valid value below it.
pub fn backward_fill_values<T: Clone>(values: &[Option<T>]) -> Vec<Option<T>> {
    let mut filled = values.to_vec();
    let mut next_valid: Option<T> = None;

    for cell in filled.iter_mut().rev() {
        match cell {
            Some(value) => next_valid = Some(value.clone()),
            None => *cell = next_valid.clone(),
        }
    }

    filled
}

/// Backward fill every cell of a column.
pub fn backward_fill_column(data: &ColumnData) -> ColumnData {
    match data {
        ColumnData::Numeric(values) => ColumnData::Numeric(backward_fill_values(values)),
        ColumnData::Categorical(values) => ColumnData::Categorical(backward_fill_values(values)),
        ColumnData::Boolean(values) => ColumnData::Boolean(backward_fill_values(values)),
    }
}

/// Backward fill every column of a dataset.
pub fn backward_fill(dataset: &Dataset) -> Result<Dataset> {
    let columns: Vec<Column> = dataset
        .columns()
        .iter()
        .map(|c| Column::new(c.name(), backward_fill_column(c.data())))
        .collect();

    Dataset::new(columns)
}

/// Names of the columns that still hold missing cells.
pub fn columns_with_missing(dataset: &Dataset) -> Vec<String> {
    dataset
        .columns()
        .iter()
        .filter(|c| c.data().missing_count() > 0)
        .map(|c| c.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backward_fill_values() {
        let values = vec![None, Some(1.0), None, None, Some(4.0)];
        assert_eq!(
            backward_fill_values(&values),
            vec![Some(1.0), Some(1.0), Some(4.0), Some(4.0), Some(4.0)]
        );
    }

    #[test]
    fn test_trailing_nulls_remain() {
        let values = vec![Some("a".to_string()), None, None];
        let filled = backward_fill_values(&values);
        assert_eq!(filled, vec![Some("a".to_string()), None, None]);
    }

    #[test]
    fn test_all_missing_column() {
        let values: Vec<Option<bool>> = vec![None, None];
        assert_eq!(backward_fill_values(&values), vec![None, None]);
    }

    #[test]
    fn test_backward_fill_dataset() {
        let ds = Dataset::new(vec![
            Column::numeric("x", vec![None, Some(2.0), None]),
            Column::categorical("c", vec![None, Some("b"), Some("c")]),
        ])
        .unwrap();

        let filled = backward_fill(&ds).unwrap();
        assert_eq!(columns_with_missing(&ds), vec!["x", "c"]);
        assert_eq!(columns_with_missing(&filled), vec!["x"]);
        assert_eq!(
            filled.column("c").unwrap().data(),
            &ColumnData::Categorical(vec![
                Some("b".to_string()),
                Some("b".to_string()),
                Some("c".to_string())
            ])
        );
    }
}
