//! DateTime Operator Tests
//!
//! Tests for: on_date, before, after, on_or_before, on_or_after, between_dates

use chrono::NaiveDate;
use octofhir_cohort_eval::{EvaluationContext, FilterEvaluator};
use octofhir_cohort_types::{CellValue, ColumnType, FilterRule, Operator, Row};
use rstest::rstest;

// ============================================================================
// Test Helpers
// ============================================================================

fn engine() -> FilterEvaluator {
    FilterEvaluator::new(EvaluationContext::new().with_column_type("visit", ColumnType::Date))
}

fn visit(value: impl Into<CellValue>) -> Row {
    let mut row = Row::new();
    row.insert("visit".to_string(), value.into());
    row
}

fn eval(row: &Row, rule: FilterRule) -> bool {
    engine().evaluate_rule(row, &rule).unwrap()
}

fn rule(op: Operator, value: &str) -> FilterRule {
    FilterRule::new("r", "visit", op).with_value(value)
}

// ============================================================================
// Single-date comparisons
// ============================================================================

#[rstest]
#[case(Operator::OnDate, "2024-03-09", false)]
#[case(Operator::OnDate, "2024-03-10", true)]
#[case(Operator::Before, "2024-03-10", false)]
#[case(Operator::Before, "2024-03-11", true)]
#[case(Operator::After, "2024-03-10", false)]
#[case(Operator::After, "2024-03-09", true)]
#[case(Operator::OnOrBefore, "2024-03-10", true)]
#[case(Operator::OnOrBefore, "2024-03-09", false)]
#[case(Operator::OnOrAfter, "2024-03-10", true)]
#[case(Operator::OnOrAfter, "2024-03-11", false)]
fn test_date_comparisons(#[case] op: Operator, #[case] value: &str, #[case] expected: bool) {
    assert_eq!(eval(&visit("2024-03-10"), rule(op, value)), expected);
}

#[test]
fn test_time_of_day_is_ignored() {
    assert!(eval(&visit("2024-03-10T23:59:00"), rule(Operator::OnDate, "2024-03-10")));
    assert!(!eval(&visit("2024-03-10T00:00:01"), rule(Operator::After, "2024-03-10")));
}

#[test]
fn test_mixed_formats() {
    assert!(eval(&visit("March 10, 2024"), rule(Operator::OnDate, "2024-03-10")));
    assert!(eval(&visit("03/10/2024"), rule(Operator::Before, "2024-03-11")));
}

#[test]
fn test_native_date_cell() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    assert!(eval(&visit(date), rule(Operator::OnOrAfter, "2024-01-01")));
}

#[rstest]
#[case(CellValue::Null)]
#[case(CellValue::text("not a date"))]
#[case(CellValue::from(20240310))]
fn test_unparseable_cell_is_false(#[case] cell: CellValue) {
    let row = visit(cell);
    for op in [Operator::OnDate, Operator::Before, Operator::After, Operator::OnOrBefore, Operator::OnOrAfter] {
        assert!(!eval(&row, rule(op, "2024-03-10")));
    }
}

// ============================================================================
// between_dates
// ============================================================================

#[rstest]
#[case("2023-12-31", false)]
#[case("2024-01-01", true)]
#[case("2024-06-15", true)]
#[case("2024-12-31", true)]
#[case("2025-01-01", false)]
fn test_between_dates_is_inclusive(#[case] day: &str, #[case] expected: bool) {
    let between = FilterRule::new("r", "visit", Operator::BetweenDates)
        .with_value("2024-01-01")
        .with_value2("2024-12-31");
    assert_eq!(eval(&visit(day), between), expected);
}

#[test]
fn test_between_dates_without_end_is_validation_error() {
    let between = FilterRule::new("d1", "visit", Operator::BetweenDates).with_value("2024-01-01");
    let err = engine().evaluate_rule(&visit("2024-06-01"), &between).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.node_id(), Some("d1"));
}
