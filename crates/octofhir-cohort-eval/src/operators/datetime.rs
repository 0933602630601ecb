//! DateTime Operators for filter rules
//!
//! Implements: on_date, before, after, on_or_before, on_or_after, between_dates
//! Comparison is at calendar-day precision; a time of day on either side is
//! dropped. A cell that does not parse as a date never matches.

use crate::engine::FilterEvaluator;
use octofhir_cohort_types::CellValue;
use std::cmp::Ordering;

impl FilterEvaluator {
    /// Evaluate a single-date comparison
    pub fn eval_date_ordering(&self, cell: &CellValue, value: &CellValue, accept: fn(Ordering) -> bool) -> bool {
        date_compare(cell, value).is_some_and(accept)
    }

    /// Evaluate between_dates, inclusive on both ends
    pub fn eval_between_dates(&self, cell: &CellValue, start: &CellValue, end: &CellValue) -> bool {
        match (cell.as_date(), start.as_date(), end.as_date()) {
            (Some(d), Some(from), Some(to)) => from <= d && d <= to,
            _ => false,
        }
    }
}

/// Day-precision ordering of two cells, `None` unless both parse as dates
pub fn date_compare(cell: &CellValue, value: &CellValue) -> Option<Ordering> {
    Some(cell.as_date()?.cmp(&value.as_date()?))
}
