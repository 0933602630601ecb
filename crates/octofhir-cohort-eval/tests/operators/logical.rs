//! Group Logic Tests
//!
//! Tests for: AND, OR, negate, empty groups and nesting

use octofhir_cohort_diagnostics::COH0103;
use octofhir_cohort_eval::{EvaluationContext, FilterEvaluator};
use octofhir_cohort_types::{CellValue, ColumnType, FilterGroup, FilterNode, FilterRule, Logic, Operator, Row};
use rstest::rstest;

// ============================================================================
// Test Helpers
// ============================================================================

fn engine() -> FilterEvaluator {
    FilterEvaluator::new(
        EvaluationContext::new()
            .with_column_type("age", ColumnType::Number)
            .with_column_type("country", ColumnType::Categorical),
    )
}

fn person(age: i64, country: &str) -> Row {
    let mut row = Row::new();
    row.insert("age".to_string(), CellValue::from(age));
    row.insert("country".to_string(), CellValue::text(country));
    row
}

fn adult() -> FilterNode {
    FilterRule::new("adult", "age", Operator::Gte).with_value(18).into()
}

fn in_us() -> FilterNode {
    FilterRule::new("us", "country", Operator::Equals).with_value("US").into()
}

fn eval(row: &Row, group: &FilterGroup) -> bool {
    engine().evaluate_group(row, group).unwrap()
}

// ============================================================================
// AND / OR
// ============================================================================

#[rstest]
#[case(25, "US", true, true)]
#[case(17, "US", false, true)]
#[case(30, "CA", false, true)]
#[case(10, "CA", false, false)]
fn test_and_or(#[case] age: i64, #[case] country: &str, #[case] and: bool, #[case] or: bool) {
    let row = person(age, country);
    assert_eq!(eval(&row, &FilterGroup::all("g", vec![adult(), in_us()])), and);
    assert_eq!(eval(&row, &FilterGroup::any("g", vec![adult(), in_us()])), or);
}

#[test]
fn test_negate_applies_after_combining() {
    let row = person(25, "CA");
    let group = FilterGroup::all("g", vec![adult(), in_us()]);
    assert!(!eval(&row, &group));
    assert!(eval(&row, &group.negated()));
}

#[test]
fn test_nested_groups() {
    // adult AND NOT (US OR age < 21)
    let inner = FilterGroup::any(
        "inner",
        vec![in_us(), FilterRule::new("young", "age", Operator::Lt).with_value(21).into()],
    )
    .negated();
    let group = FilterGroup::all("g", vec![adult(), inner.into()]);

    assert!(eval(&person(30, "CA"), &group));
    assert!(!eval(&person(30, "US"), &group));
    assert!(!eval(&person(19, "CA"), &group));
}

// ============================================================================
// Empty groups
// ============================================================================

#[rstest]
#[case(Logic::And, false, true)]
#[case(Logic::Or, false, false)]
#[case(Logic::And, true, false)]
#[case(Logic::Or, true, true)]
fn test_empty_group(#[case] logic: Logic, #[case] negate: bool, #[case] expected: bool) {
    let mut group = FilterGroup::new("empty", logic);
    group.negate = negate;
    assert_eq!(eval(&person(30, "US"), &group), expected);
}

// ============================================================================
// Single-child identity
// ============================================================================

#[rstest]
#[case(25, "US")]
#[case(17, "US")]
fn test_single_child_groups_equal_the_rule(#[case] age: i64, #[case] country: &str) {
    let row = person(age, country);
    let rule_result = engine().evaluate(&row, &adult()).unwrap();
    assert_eq!(eval(&row, &FilterGroup::all("g", vec![adult()])), rule_result);
    assert_eq!(eval(&row, &FilterGroup::any("g", vec![adult()])), rule_result);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_malformed_rule_aborts_group() {
    let bad: FilterNode = FilterRule::new("bad", "age", Operator::Between).with_value(1).into();
    let group = FilterGroup::all("g", vec![in_us(), bad]);

    let err = engine().evaluate_group(&person(30, "US"), &group).unwrap_err();
    assert_eq!(err.node_id(), Some("bad"));
}

#[rstest]
#[case(Logic::And, 25)]
#[case(Logic::Or, 25)]
#[case(Logic::Or, 10)]
fn test_malformed_rule_after_deciding_child(#[case] logic: Logic, #[case] age: i64) {
    let deciding: FilterNode = match logic {
        Logic::And => FilterRule::new("old", "age", Operator::Gt).with_value(100).into(),
        Logic::Or => in_us(),
    };
    let bad: FilterNode = FilterRule::new("bad", "age", Operator::Between).with_value(18).into();
    let mut group = FilterGroup::new("g", logic);
    group.rules = vec![deciding, bad];

    let err = engine()
        .evaluate(&person(age, "US"), &FilterNode::Group(group.clone()))
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.code(), COH0103);
    assert_eq!(err.node_id(), Some("bad"));

    let err = engine().matches(&person(age, "US"), &group).unwrap_err();
    assert_eq!(err.code(), COH0103);
}

#[test]
fn test_malformed_rule_in_nested_group_is_reported() {
    let bad: FilterNode = FilterRule::new("bad", "age", Operator::Lt).into();
    let group = FilterGroup::any(
        "g",
        vec![adult(), FilterGroup::all("inner", vec![in_us(), bad]).into()],
    );

    let err = engine().matches(&person(30, "US"), &group).unwrap_err();
    assert_eq!(err.node_id(), Some("bad"));
}

#[test]
fn test_parsed_filter_evaluates() {
    let json = r#"{
        "id": "root",
        "logic": "AND",
        "rules": [
            {"id": "r1", "field": "age", "operator": "gte", "value": 18},
            {"id": "r2", "field": "country", "operator": "equals", "value": "US"}
        ]
    }"#;
    let group: FilterGroup = serde_json::from_str(json).unwrap();
    assert!(eval(&person(25, "US"), &group));
    assert!(!eval(&person(17, "US"), &group));
}
