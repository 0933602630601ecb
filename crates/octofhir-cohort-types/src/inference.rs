//! Column type inference
//!
//! Classifies every column of an uploaded dataset as `number`, `categorical`,
//! `date` or `string`, and answers the read-only preview queries (sample
//! values, column statistics) the upload screen needs.
//!
//! Per column:
//! 1. every non-empty value is a native date/time → `date`
//! 2. every non-empty value is numeric → `categorical` when the distinct ratio
//!    is below the categorical threshold, else `number`
//! 3. at least `date_threshold` of the non-empty values look like dates → `date`
//! 4. distinct ratio below the categorical threshold → `categorical`, else `string`
//!
//! The distinct ratio is `distinct non-empty values / row count`, and an empty
//! column is `string`.

use indexmap::{IndexMap, IndexSet};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use crate::dataset::ColumnType;
use crate::date::looks_like_date;
use crate::value::{CellValue, Row, cell};

/// Distinct ratio below which a column is categorical
pub const CATEGORICAL_THRESHOLD: f64 = 0.05;

/// Share of date-shaped values needed to call a text column a date
pub const DATE_THRESHOLD: f64 = 0.8;

/// Size of the categorical histogram
pub const TOP_VALUES_LIMIT: usize = 10;

/// Column type inferencer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeInferencer {
    categorical_threshold: f64,
    date_threshold: f64,
}

impl Default for TypeInferencer {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInferencer {
    /// Create an inferencer with the standard thresholds
    pub fn new() -> Self {
        Self {
            categorical_threshold: CATEGORICAL_THRESHOLD,
            date_threshold: DATE_THRESHOLD,
        }
    }

    /// Create an inferencer with custom thresholds
    pub fn with_thresholds(categorical_threshold: f64, date_threshold: f64) -> Self {
        Self {
            categorical_threshold,
            date_threshold,
        }
    }

    /// Infer the type of every column, in order of first appearance
    pub fn infer(&self, rows: &[Row]) -> IndexMap<String, ColumnType> {
        let mut names: IndexSet<&str> = IndexSet::new();
        for row in rows {
            names.extend(row.keys().map(String::as_str));
        }

        let columns: IndexMap<String, ColumnType> = names
            .into_iter()
            .map(|name| (name.to_string(), self.infer_column(rows, name)))
            .collect();
        log::debug!("Inferred {} column types over {} rows", columns.len(), rows.len());
        columns
    }

    /// Infer the type of one column
    pub fn infer_column(&self, rows: &[Row], column: &str) -> ColumnType {
        let values: Vec<&CellValue> = rows.iter().map(|row| cell(row, column)).collect();
        self.classify(&values)
    }

    /// Classify a column given all its cells (nulls included)
    pub fn classify(&self, values: &[&CellValue]) -> ColumnType {
        let row_count = values.len();
        let present: Vec<&CellValue> = values.iter().copied().filter(|v| !v.is_empty()).collect();
        if present.is_empty() {
            return ColumnType::String;
        }

        if present.iter().all(|v| v.is_temporal()) {
            return ColumnType::Date;
        }

        let numbers: Option<Vec<Decimal>> = present.iter().map(|v| v.as_decimal()).collect();
        if let Some(numbers) = numbers {
            let distinct: HashSet<Decimal> = numbers.into_iter().collect();
            return if ratio(distinct.len(), row_count) < self.categorical_threshold {
                ColumnType::Categorical
            } else {
                ColumnType::Number
            };
        }

        let texts: Vec<Cow<'_, str>> = present.iter().map(|v| v.to_text()).collect();
        let date_like = texts.iter().filter(|t| looks_like_date(t)).count();
        if ratio(date_like, texts.len()) >= self.date_threshold {
            return ColumnType::Date;
        }

        let distinct: HashSet<&str> = texts.iter().map(|t| t.as_ref()).collect();
        if ratio(distinct.len(), row_count) < self.categorical_threshold {
            ColumnType::Categorical
        } else {
            ColumnType::String
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// One bucket of a categorical histogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Summary statistics of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub column: String,
    pub column_type: ColumnType,
    /// Non-empty values
    pub count: usize,
    pub null_count: usize,
    pub distinct_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_values: Option<Vec<ValueCount>>,
}

/// First `max_n` distinct non-empty values of a column, in row order
pub fn sample_values(rows: &[Row], column: &str, max_n: usize) -> Vec<CellValue> {
    let mut seen: IndexSet<&CellValue> = IndexSet::new();
    for row in rows {
        if seen.len() >= max_n {
            break;
        }
        let value = cell(row, column);
        if !value.is_empty() {
            seen.insert(value);
        }
    }
    seen.into_iter().cloned().collect()
}

/// Statistics of a column: min/max/mean for numbers, a top-10 histogram for
/// categorical columns, counts only otherwise
pub fn column_statistics(rows: &[Row], column: &str, column_type: ColumnType) -> ColumnStatistics {
    let present: Vec<&CellValue> = rows
        .iter()
        .map(|row| cell(row, column))
        .filter(|v| !v.is_empty())
        .collect();
    let distinct: HashSet<Cow<'_, str>> = present.iter().map(|v| v.to_text()).collect();

    let mut stats = ColumnStatistics {
        column: column.to_string(),
        column_type,
        count: present.len(),
        null_count: rows.len() - present.len(),
        distinct_count: distinct.len(),
        min: None,
        max: None,
        mean: None,
        top_values: None,
    };

    match column_type {
        ColumnType::Number => {
            let numbers: Vec<Decimal> = present.iter().filter_map(|v| v.as_decimal()).collect();
            stats.min = numbers.iter().min().copied();
            stats.max = numbers.iter().max().copied();
            stats.mean = mean(&numbers);
        }
        ColumnType::Categorical => {
            let mut counts: HashMap<Cow<'_, str>, usize> = HashMap::new();
            for value in &present {
                *counts.entry(value.to_text()).or_insert(0) += 1;
            }
            let mut histogram: Vec<ValueCount> = counts
                .into_iter()
                .map(|(value, count)| ValueCount {
                    value: value.into_owned(),
                    count,
                })
                .collect();
            histogram.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
            histogram.truncate(TOP_VALUES_LIMIT);
            stats.top_values = Some(histogram);
        }
        ColumnType::Date | ColumnType::String => {}
    }

    stats
}

fn mean(numbers: &[Decimal]) -> Option<Decimal> {
    if numbers.is_empty() {
        return None;
    }
    let sum = numbers
        .iter()
        .try_fold(Decimal::ZERO, |acc, n| acc.checked_add(*n))?;
    sum.checked_div(Decimal::from(numbers.len()))
        .map(|m| m.round_dp(6).normalize())
}
