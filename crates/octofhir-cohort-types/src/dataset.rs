//! Uploaded datasets and their column types

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::inference::{ColumnStatistics, TypeInferencer, column_statistics, sample_values};
use crate::value::Row;

/// Number of leading rows kept as the dataset preview
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

/// Inferred type of a dataset column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Continuous numeric values
    Number,
    /// Few distinct values relative to the row count
    Categorical,
    /// Calendar dates
    Date,
    /// Free text
    String,
}

impl ColumnType {
    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Number => "number",
            ColumnType::Categorical => "categorical",
            ColumnType::Date => "date",
            ColumnType::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded tabular dataset with inferred column metadata
///
/// Immutable once created; a re-upload produces a new dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset (master data) identifier
    pub id: String,
    /// Column types in upload order
    pub columns: IndexMap<String, ColumnType>,
    /// Number of rows in the upload
    pub row_count: usize,
    /// Column holding the patient identifier
    #[serde(default)]
    pub patient_id_column: Option<String>,
    /// Leading rows kept for previews
    #[serde(default, alias = "sample_data")]
    pub sample_rows: Vec<Row>,
    /// All rows, when materialized in memory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Create a dataset from rows using the default inferencer
    pub fn from_rows(id: impl Into<String>, rows: Vec<Row>) -> Self {
        Self::with_inferencer(id, rows, &TypeInferencer::default(), DEFAULT_SAMPLE_ROWS)
    }

    /// Create a dataset from rows with an explicit inferencer and preview size
    pub fn with_inferencer(
        id: impl Into<String>,
        rows: Vec<Row>,
        inferencer: &TypeInferencer,
        sample_rows: usize,
    ) -> Self {
        let columns = inferencer.infer(&rows);
        Self {
            id: id.into(),
            columns,
            row_count: rows.len(),
            patient_id_column: None,
            sample_rows: rows.iter().take(sample_rows).cloned().collect(),
            rows,
        }
    }

    /// Designate the patient identifier column
    pub fn with_patient_id_column(mut self, column: impl Into<String>) -> Self {
        self.patient_id_column = Some(column.into());
        self
    }

    /// Type of a column, if the dataset has it
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(name).copied()
    }

    /// Whether the schema contains a column
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in upload order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Whether every row is held in memory
    pub fn is_materialized(&self) -> bool {
        self.rows.len() == self.row_count
    }

    /// First `max_n` distinct non-empty values of a column
    ///
    /// Falls back to the preview rows when the dataset is not materialized.
    pub fn sample_values(&self, column: &str, max_n: usize) -> Vec<crate::CellValue> {
        sample_values(self.source_rows(), column, max_n)
    }

    /// Statistics of a column, or `None` when the schema lacks it
    pub fn statistics(&self, column: &str) -> Option<ColumnStatistics> {
        let column_type = self.column_type(column)?;
        Some(column_statistics(self.source_rows(), column, column_type))
    }

    fn source_rows(&self) -> &[Row] {
        if self.rows.is_empty() {
            &self.sample_rows
        } else {
            &self.rows
        }
    }
}
