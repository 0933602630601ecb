//! Infer command implementation

use super::{loader, output};
use anyhow::Result;
use octofhir_cohort_eval::EngineConfig;
use octofhir_cohort_types::{ColumnStatistics, Dataset};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::path::PathBuf;
use tabled::{Table, Tabled};

/// Configuration for infer command
pub struct InferConfig {
    pub file: PathBuf,
    pub patient_id_column: Option<String>,
    pub engine: EngineConfig,
    pub verbose: bool,
    pub output_format: output::OutputFormat,
    pub output_file: Option<PathBuf>,
}

#[derive(Tabled)]
struct ColumnRow {
    #[tabled(rename = "Column")]
    name: String,
    #[tabled(rename = "Type")]
    column_type: String,
    #[tabled(rename = "Values")]
    count: usize,
    #[tabled(rename = "Nulls")]
    null_count: usize,
    #[tabled(rename = "Distinct")]
    distinct_count: usize,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Mean")]
    mean: String,
}

/// Infer column types of a data file
pub async fn infer(config: InferConfig) -> Result<()> {
    let dataset = loader::load_dataset(&config.file, &config.engine, config.patient_id_column.as_deref())?;
    if config.verbose {
        eprintln!("Inferred {} columns over {} rows", dataset.columns.len(), dataset.row_count);
    }

    let report = inference_report(&dataset);
    output::print_output(&report, config.output_format, config.output_file.as_deref(), || {
        columns_table(&dataset)
    })
}

/// Column types and statistics as JSON
pub fn inference_report(dataset: &Dataset) -> Value {
    let columns: Vec<Value> = dataset
        .columns
        .iter()
        .map(|(name, column_type)| {
            json!({
                "name": name,
                "type": column_type,
                "statistics": dataset.statistics(name),
            })
        })
        .collect();

    json!({
        "dataset": dataset.id,
        "row_count": dataset.row_count,
        "patient_id_column": dataset.patient_id_column,
        "columns": columns,
        "sample_data": dataset.sample_rows,
    })
}

fn columns_table(dataset: &Dataset) -> String {
    let rows: Vec<ColumnRow> = dataset
        .columns
        .keys()
        .filter_map(|name| dataset.statistics(name))
        .map(column_row)
        .collect();
    output::styled(Table::new(rows))
}

fn column_row(stats: ColumnStatistics) -> ColumnRow {
    ColumnRow {
        name: stats.column,
        column_type: stats.column_type.to_string(),
        count: stats.count,
        null_count: stats.null_count,
        distinct_count: stats.distinct_count,
        min: show(stats.min),
        max: show(stats.max),
        mean: show(stats.mean),
    }
}

fn show(value: Option<Decimal>) -> String {
    value.map(|d| d.round_dp(2).to_string()).unwrap_or_default()
}
