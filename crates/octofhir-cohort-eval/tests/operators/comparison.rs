//! Comparison Operator Tests
//!
//! Tests for: equals, not_equals, gt, gte, lt, lte, between

use octofhir_cohort_eval::{EvaluationContext, FilterEvaluator};
use octofhir_cohort_types::{CellValue, ColumnType, FilterRule, Operator, Row};
use rstest::rstest;

// ============================================================================
// Test Helpers
// ============================================================================

fn engine() -> FilterEvaluator {
    FilterEvaluator::new(
        EvaluationContext::new()
            .with_column_type("age", ColumnType::Number)
            .with_column_type("country", ColumnType::Categorical)
            .with_column_type("visit", ColumnType::Date),
    )
}

fn row(pairs: &[(&str, CellValue)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn eval(row: &Row, rule: FilterRule) -> bool {
    engine().evaluate_rule(row, &rule).unwrap()
}

fn rule(field: &str, op: Operator, value: impl Into<CellValue>) -> FilterRule {
    FilterRule::new("r", field, op).with_value(value)
}

// ============================================================================
// equals / not_equals
// ============================================================================

#[rstest]
#[case(CellValue::from(25), CellValue::from(25), true)]
#[case(CellValue::text("25"), CellValue::from(25), true)]
#[case(CellValue::text("25.0"), CellValue::text("25"), true)]
#[case(CellValue::from(25), CellValue::from(26), false)]
#[case(CellValue::text("US"), CellValue::text("US"), true)]
#[case(CellValue::text("US"), CellValue::text("us"), false)]
#[case(CellValue::Null, CellValue::text("US"), false)]
fn test_equals(#[case] cell: CellValue, #[case] value: CellValue, #[case] expected: bool) {
    let r = row(&[("x", cell)]);
    assert_eq!(eval(&r, rule("x", Operator::Equals, value.clone())), expected);
    assert_eq!(eval(&r, rule("x", Operator::NotEquals, value)), !expected);
}

#[test]
fn test_equals_missing_field_is_false() {
    let r = row(&[("age", 30.into())]);
    assert!(!eval(&r, rule("country", Operator::Equals, "US")));
    assert!(eval(&r, rule("country", Operator::NotEquals, "US")));
}

#[test]
fn test_equals_on_date_column_compares_days() {
    let r = row(&[("visit", CellValue::text("03/10/2024"))]);
    assert!(eval(&r, rule("visit", Operator::Equals, "2024-03-10")));
}

#[test]
fn test_equals_boolean_cells_compare_as_text() {
    let r = row(&[("smoker", true.into())]);
    assert!(eval(&r, rule("smoker", Operator::Equals, "true")));
    assert!(!eval(&r, rule("smoker", Operator::Equals, false)));
}

// ============================================================================
// Ordering
// ============================================================================

#[rstest]
#[case(Operator::Gt, 17, false)]
#[case(Operator::Gt, 18, false)]
#[case(Operator::Gt, 19, true)]
#[case(Operator::Gte, 18, true)]
#[case(Operator::Gte, 17, false)]
#[case(Operator::Lt, 17, true)]
#[case(Operator::Lt, 18, false)]
#[case(Operator::Lte, 18, true)]
#[case(Operator::Lte, 19, false)]
fn test_ordering_against_18(#[case] op: Operator, #[case] age: i64, #[case] expected: bool) {
    let r = row(&[("age", age.into())]);
    assert_eq!(eval(&r, rule("age", op, 18)), expected);
}

#[rstest]
#[case(CellValue::Null)]
#[case(CellValue::text("unknown"))]
#[case(CellValue::text(""))]
fn test_ordering_non_numeric_cell_is_false(#[case] cell: CellValue) {
    let r = row(&[("age", cell)]);
    for op in [Operator::Gt, Operator::Gte, Operator::Lt, Operator::Lte] {
        assert!(!eval(&r, rule("age", op, 18)));
    }
}

#[test]
fn test_ordering_non_numeric_value_is_false() {
    let r = row(&[("age", 30.into())]);
    assert!(!eval(&r, rule("age", Operator::Gt, "old")));
}

#[test]
fn test_ordering_numeric_text_cell() {
    let r = row(&[("age", CellValue::text("42.5"))]);
    assert!(eval(&r, rule("age", Operator::Gt, 42)));
}

// ============================================================================
// between
// ============================================================================

#[rstest]
#[case(17, false)]
#[case(18, true)]
#[case(40, true)]
#[case(65, true)]
#[case(66, false)]
fn test_between_is_inclusive(#[case] age: i64, #[case] expected: bool) {
    let r = row(&[("age", age.into())]);
    let between = FilterRule::new("r", "age", Operator::Between).with_value(18).with_value2(65);
    assert_eq!(eval(&r, between), expected);
}

#[test]
fn test_between_null_cell_is_false() {
    let r = row(&[("age", CellValue::Null)]);
    let between = FilterRule::new("r", "age", Operator::Between).with_value(18).with_value2(65);
    assert!(!eval(&r, between));
}

#[test]
fn test_between_without_upper_bound_is_validation_error() {
    let r = row(&[("age", 30.into())]);
    let between = FilterRule::new("b1", "age", Operator::Between).with_value(18);

    let err = engine().evaluate_rule(&r, &between).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.node_id(), Some("b1"));
}

#[test]
fn test_comparison_without_value_is_validation_error() {
    let r = row(&[("age", 30.into())]);
    let err = engine()
        .evaluate_rule(&r, &FilterRule::new("g1", "age", Operator::Gt))
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_unknown_operator_is_validation_error() {
    let r = row(&[("age", 30.into())]);
    let unknown = FilterRule::new("u1", "age", Operator::parse("approximately")).with_value(30);

    let err = engine().evaluate_rule(&r, &unknown).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("approximately"));
}
