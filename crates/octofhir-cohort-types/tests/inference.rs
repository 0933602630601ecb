//! Column type inference tests
//!
//! Tests classification rules for:
//! - Date-shaped text columns and the 80% date threshold
//! - Numeric columns and the categorical distinct-ratio threshold
//! - Free text and empty columns
//! - Sample values and column statistics

use octofhir_cohort_types::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use rust_decimal::Decimal;

fn column(name: &str, values: Vec<CellValue>) -> Vec<Row> {
    values
        .into_iter()
        .map(|v| {
            let mut row = Row::new();
            row.insert(name.to_string(), v);
            row
        })
        .collect()
}

fn texts(values: &[&str]) -> Vec<CellValue> {
    values.iter().map(|v| CellValue::text(*v)).collect()
}

fn infer(values: Vec<CellValue>) -> ColumnType {
    TypeInferencer::new().infer_column(&column("c", values), "c")
}

// ============================================================================
// Date Columns
// ============================================================================

#[test]
fn test_iso_date_column() {
    let ty = infer(texts(&["2024-01-15", "2024-02-20", "2024-03-10"]));
    assert_eq!(ty, ColumnType::Date);
}

#[test]
fn test_textual_month_column() {
    let ty = infer(texts(&["January 15, 2024", "February 2, 2023", "March 30, 2022"]));
    assert_eq!(ty, ColumnType::Date);
}

#[rstest]
#[case(&["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "unknown"], ColumnType::Date)]
#[case(&["2024-01-01", "2024-01-02", "2024-01-03", "n/a", "unknown"], ColumnType::String)]
fn test_date_threshold(#[case] values: &[&str], #[case] expected: ColumnType) {
    assert_eq!(infer(texts(values)), expected);
}

#[test]
fn test_date_threshold_ignores_blanks() {
    let ty = infer(texts(&["2024-01-15", "", "2024-03-10", "  "]));
    assert_eq!(ty, ColumnType::Date);
}

// ============================================================================
// Numeric Columns
// ============================================================================

#[test]
fn test_continuous_numbers() {
    let values = (0..20).map(CellValue::from).collect();
    assert_eq!(infer(values), ColumnType::Number);
}

#[test]
fn test_numeric_text_counts_as_number() {
    let values = (0..20).map(|i| CellValue::text(format!("{}.5", i))).collect();
    assert_eq!(infer(values), ColumnType::Number);
}

#[rstest]
#[case(4, ColumnType::Categorical)]
#[case(5, ColumnType::Number)]
fn test_categorical_threshold_is_strict(#[case] distinct: i64, #[case] expected: ColumnType) {
    // 100 rows: 4 distinct -> 0.04 < 0.05, 5 distinct -> 0.05 is not below
    let values = (0..100).map(|i| CellValue::from(i % distinct)).collect();
    assert_eq!(infer(values), expected);
}

// ============================================================================
// Text Columns
// ============================================================================

#[test]
fn test_low_cardinality_small_column_is_string() {
    // 2 distinct values over 5 rows is a 0.4 ratio
    let ty = infer(texts(&["A", "B", "A", "A", "B"]));
    assert_eq!(ty, ColumnType::String);
}

#[test]
fn test_low_cardinality_large_column_is_categorical() {
    let values = (0..200)
        .map(|i| CellValue::text(if i % 3 == 0 { "US" } else { "CA" }))
        .collect();
    assert_eq!(infer(values), ColumnType::Categorical);
}

#[test]
fn test_mixed_text_and_numbers_is_text() {
    let mut values = texts(&["abc", "def", "ghi"]);
    values.push(CellValue::from(4));
    assert_eq!(infer(values), ColumnType::String);
}

#[test]
fn test_empty_column_defaults_to_string() {
    assert_eq!(TypeInferencer::new().infer_column(&[], "c"), ColumnType::String);
    assert_eq!(infer(vec![CellValue::Null, CellValue::Null]), ColumnType::String);
}

#[test]
fn test_custom_thresholds() {
    let inferencer = TypeInferencer::with_thresholds(0.5, 0.8);
    let rows = column("c", texts(&["A", "B", "A", "A", "B"]));
    assert_eq!(inferencer.infer_column(&rows, "c"), ColumnType::Categorical);
}

// ============================================================================
// Dataset Inference
// ============================================================================

#[test]
fn test_infer_dataset_columns() {
    let rows: Vec<Row> = serde_json::from_str(
        r#"[
            {"patient_id": "P1", "age": 25, "visit": "2024-01-15"},
            {"patient_id": "P2", "age": 17, "visit": "2024-02-20"},
            {"patient_id": "P3", "age": 30, "visit": "2024-03-10"}
        ]"#,
    )
    .unwrap();

    let columns = TypeInferencer::new().infer(&rows);
    assert_eq!(columns.get("patient_id"), Some(&ColumnType::String));
    assert_eq!(columns.get("age"), Some(&ColumnType::Number));
    assert_eq!(columns.get("visit"), Some(&ColumnType::Date));
}

// ============================================================================
// Samples and Statistics
// ============================================================================

#[test]
fn test_sample_values_distinct_in_order() {
    let rows = column("c", texts(&["b", "a", "b", "", "c", "d"]));
    let samples = sample_values(&rows, "c", 3);
    assert_eq!(samples, texts(&["b", "a", "c"]));
}

#[test]
fn test_number_statistics() {
    let mut values: Vec<CellValue> = [10, 20, 30, 40].into_iter().map(CellValue::from).collect();
    values.push(CellValue::Null);
    let rows = column("age", values);

    let stats = column_statistics(&rows, "age", ColumnType::Number);
    assert_eq!(stats.count, 4);
    assert_eq!(stats.null_count, 1);
    assert_eq!(stats.min, Some(Decimal::from(10)));
    assert_eq!(stats.max, Some(Decimal::from(40)));
    assert_eq!(stats.mean, Some(Decimal::from(25)));
    assert!(stats.top_values.is_none());
}

#[test]
fn test_categorical_histogram() {
    let rows = column("site", texts(&["b", "a", "b", "c", "b", "a"]));
    let stats = column_statistics(&rows, "site", ColumnType::Categorical);

    let top = stats.top_values.unwrap();
    assert_eq!(top[0], ValueCount { value: "b".into(), count: 3 });
    assert_eq!(top[1], ValueCount { value: "a".into(), count: 2 });
    assert_eq!(top[2], ValueCount { value: "c".into(), count: 1 });
    assert!(stats.min.is_none());
}

#[test]
fn test_histogram_capped_at_ten() {
    let values = (0..30).map(|i| CellValue::text(format!("v{}", i % 15))).collect();
    let rows = column("c", values);
    let stats = column_statistics(&rows, "c", ColumnType::Categorical);
    assert_eq!(stats.top_values.unwrap().len(), TOP_VALUES_LIMIT);
    assert_eq!(stats.distinct_count, 15);
}

#[test]
fn test_statistics_of_empty_column() {
    let stats = column_statistics(&[], "c", ColumnType::Number);
    assert_eq!(stats.count, 0);
    assert_eq!(stats.null_count, 0);
    assert_eq!(stats.mean, None);
}
