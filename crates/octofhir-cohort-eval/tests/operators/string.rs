//! String Operator Tests
//!
//! Tests for: contains, is_empty, is_not_empty

use octofhir_cohort_eval::{EvaluationContext, FilterEvaluator};
use octofhir_cohort_types::{CellValue, FilterRule, Operator, Row};
use rstest::rstest;

// ============================================================================
// Test Helpers
// ============================================================================

fn engine() -> FilterEvaluator {
    FilterEvaluator::new(EvaluationContext::new())
}

fn row_with(value: CellValue) -> Row {
    let mut row = Row::new();
    row.insert("note".to_string(), value);
    row
}

fn eval(row: &Row, rule: FilterRule) -> bool {
    engine().evaluate_rule(row, &rule).unwrap()
}

// ============================================================================
// contains
// ============================================================================

#[rstest]
#[case("Type 2 diabetes", "diabetes", true)]
#[case("Type 2 diabetes", "Diabetes", false)]
#[case("Type 2 diabetes", "", true)]
#[case("asthma", "diabetes", false)]
fn test_contains_is_case_sensitive(#[case] text: &str, #[case] needle: &str, #[case] expected: bool) {
    let rule = FilterRule::new("r", "note", Operator::Contains).with_value(needle);
    assert_eq!(eval(&row_with(CellValue::text(text)), rule), expected);
}

#[test]
fn test_contains_null_cell_is_false() {
    let rule = FilterRule::new("r", "note", Operator::Contains).with_value("x");
    assert!(!eval(&row_with(CellValue::Null), rule));
}

#[test]
fn test_contains_uses_number_text() {
    let rule = FilterRule::new("r", "note", Operator::Contains).with_value("12");
    assert!(eval(&row_with(CellValue::from(3125)), rule));
}

// ============================================================================
// is_empty / is_not_empty
// ============================================================================

#[rstest]
#[case(CellValue::Null, true)]
#[case(CellValue::text(""), true)]
#[case(CellValue::text("   "), true)]
#[case(CellValue::text("x"), false)]
#[case(CellValue::from(0), false)]
#[case(CellValue::from(false), false)]
fn test_emptiness(#[case] cell: CellValue, #[case] empty: bool) {
    let row = row_with(cell);
    assert_eq!(eval(&row, FilterRule::new("r", "note", Operator::IsEmpty)), empty);
    assert_eq!(eval(&row, FilterRule::new("r", "note", Operator::IsNotEmpty)), !empty);
}

#[test]
fn test_missing_field_is_empty() {
    let row = Row::new();
    assert!(eval(&row, FilterRule::new("r", "note", Operator::IsEmpty)));
}
