//! Comparison Operators for filter rules
//!
//! Implements: equals, not_equals, gt, gte, lt, lte, between
//! Null cells never match an ordering or range; `not_equals` is the exact
//! negation of `equals`.

use crate::engine::FilterEvaluator;
use octofhir_cohort_types::{CellValue, ColumnType};
use rust_decimal::Decimal;
use std::cmp::Ordering;

impl FilterEvaluator {
    /// Evaluate equals with the column type guiding coercion
    pub fn eval_equals(&self, cell: &CellValue, value: &CellValue, column_type: Option<ColumnType>) -> bool {
        values_equal(cell, value, column_type)
    }

    /// Evaluate not_equals
    pub fn eval_not_equals(&self, cell: &CellValue, value: &CellValue, column_type: Option<ColumnType>) -> bool {
        !values_equal(cell, value, column_type)
    }

    /// Evaluate gt/gte/lt/lte: numeric only, anything else is false
    pub fn eval_ordering(&self, cell: &CellValue, value: &CellValue, accept: fn(Ordering) -> bool) -> bool {
        numeric_compare(cell, value).is_some_and(accept)
    }

    /// Evaluate between: `value <= cell <= value2`, inclusive on both ends
    pub fn eval_between(&self, cell: &CellValue, low: &CellValue, high: &CellValue) -> bool {
        match (cell.as_decimal(), low.as_decimal(), high.as_decimal()) {
            (Some(x), Some(lo), Some(hi)) => lo <= x && x <= hi,
            _ => false,
        }
    }
}

/// Type-aware equality
///
/// Date columns (and native date cells) compare as calendar days when both
/// sides parse as dates. Otherwise both sides compare as numbers when both
/// are numeric, else as strings. A null cell equals nothing.
pub fn values_equal(cell: &CellValue, value: &CellValue, column_type: Option<ColumnType>) -> bool {
    if cell.is_null() || value.is_null() {
        return false;
    }

    if column_type == Some(ColumnType::Date) || cell.is_temporal() {
        if let (Some(a), Some(b)) = (cell.as_date(), value.as_date()) {
            return a == b;
        }
    }

    if let (Some(a), Some(b)) = (cell.as_decimal(), value.as_decimal()) {
        return a == b;
    }

    cell.to_text() == value.to_text()
}

/// Numeric ordering of two cells, `None` unless both are numeric
pub fn numeric_compare(cell: &CellValue, value: &CellValue) -> Option<Ordering> {
    let a: Decimal = cell.as_decimal()?;
    let b: Decimal = value.as_decimal()?;
    Some(a.cmp(&b))
}
