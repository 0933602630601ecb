//! Membership Operator Tests
//!
//! Tests for: in_cohort, not_in_cohort

use octofhir_cohort_eval::{EvaluationContext, FilterEvaluator};
use octofhir_cohort_types::{CellValue, FilterRule, Operator, Row};
use rstest::rstest;

// ============================================================================
// Test Helpers
// ============================================================================

fn engine() -> FilterEvaluator {
    FilterEvaluator::new(
        EvaluationContext::new()
            .with_patient_id_column("patient_id")
            .with_cohort("diabetics", ["P1", "P2", "42"]),
    )
}

fn patient(id: impl Into<CellValue>) -> Row {
    let mut row = Row::new();
    row.insert("patient_id".to_string(), id.into());
    row.insert("mrn".to_string(), CellValue::text("P2"));
    row
}

fn in_cohort(cohort: &str) -> FilterRule {
    FilterRule::new("m", "", Operator::InCohort).with_value(cohort)
}

fn not_in_cohort(cohort: &str) -> FilterRule {
    FilterRule::new("m", "", Operator::NotInCohort).with_value(cohort)
}

// ============================================================================
// in_cohort / not_in_cohort
// ============================================================================

#[rstest]
#[case("P1", true)]
#[case("P2", true)]
#[case("P9", false)]
fn test_membership(#[case] id: &str, #[case] member: bool) {
    let row = patient(id);
    assert_eq!(engine().evaluate_rule(&row, &in_cohort("diabetics")).unwrap(), member);
    assert_eq!(engine().evaluate_rule(&row, &not_in_cohort("diabetics")).unwrap(), !member);
}

#[test]
fn test_numeric_patient_id_uses_canonical_text() {
    let row = patient(42);
    assert!(engine().evaluate_rule(&row, &in_cohort("diabetics")).unwrap());
}

#[test]
fn test_explicit_field_overrides_patient_id_column() {
    let row = patient("P9");
    let rule = FilterRule::new("m", "mrn", Operator::InCohort).with_value("diabetics");
    assert!(engine().evaluate_rule(&row, &rule).unwrap());
}

#[test]
fn test_missing_patient_id_is_not_a_member() {
    let row = patient(CellValue::Null);
    assert!(!engine().evaluate_rule(&row, &in_cohort("diabetics")).unwrap());
    assert!(engine().evaluate_rule(&row, &not_in_cohort("diabetics")).unwrap());
}

#[test]
fn test_unknown_cohort_is_not_found() {
    let err = engine()
        .evaluate_rule(&patient("P1"), &in_cohort("smokers"))
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("smokers"));
}

#[test]
fn test_no_patient_id_column_is_data_integrity_error() {
    let evaluator = FilterEvaluator::new(EvaluationContext::new().with_cohort("diabetics", ["P1"]));
    let err = evaluator
        .evaluate_rule(&patient("P1"), &in_cohort("diabetics"))
        .unwrap_err();
    assert!(err.is_data_integrity());
}

#[test]
fn test_blank_cohort_reference_is_validation_error() {
    let err = engine()
        .evaluate_rule(&patient("P1"), &in_cohort("  "))
        .unwrap_err();
    assert!(err.is_validation());
}
