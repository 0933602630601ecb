//! String Operators for filter rules
//!
//! Implements: contains, is_empty, is_not_empty

use crate::engine::FilterEvaluator;
use octofhir_cohort_types::CellValue;

impl FilterEvaluator {
    /// Evaluate contains: case-sensitive substring of the cell's text
    pub fn eval_contains(&self, cell: &CellValue, value: &CellValue) -> bool {
        if cell.is_null() {
            return false;
        }
        cell.to_text().contains(value.to_text().as_ref())
    }

    /// Evaluate is_empty: null or whitespace-only text
    pub fn eval_is_empty(&self, cell: &CellValue) -> bool {
        cell.is_empty()
    }
}
