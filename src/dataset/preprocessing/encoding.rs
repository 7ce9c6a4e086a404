//! One-hot encoding of categorical columns.

use crate::core::error::Result;
use crate::dataset::dataset::{Column, ColumnData, Dataset};
use std::collections::BTreeSet;

/// Replace every categorical column, in place, by one boolean indicator
/// column per distinct category.
///
/// Indicators are named `<column>_<category>` and ordered by category. A
/// missing cell sets every indicator of its row to false. Numeric and
/// boolean columns pass through unchanged.
pub fn one_hot(dataset: &Dataset) -> Result<Dataset> {
    let mut columns = Vec::with_capacity(dataset.num_columns());

    for column in dataset.columns() {
        match column.data() {
            ColumnData::Categorical(values) => {
                let categories: BTreeSet<&String> = values.iter().flatten().collect();
                log::debug!(
                    "One-hot encoding '{}' into {} indicator columns",
                    column.name(),
                    categories.len()
                );
                for category in categories {
                    let indicator = values
                        .iter()
                        .map(|v| Some(v.as_ref() == Some(category)))
                        .collect();
                    columns.push(Column::boolean(
                        format!("{}_{}", column.name(), category),
                        indicator,
                    ));
                }
            }
            _ => columns.push(column.clone()),
        }
    }

    Dataset::new(columns)
}
