//! Stats command implementation

use super::{loader, output};
use anyhow::Result;
use octofhir_cohort_eval::EngineConfig;
use octofhir_cohort_types::{CellValue, Dataset};
use serde_json::{Value, json};
use std::path::PathBuf;

/// Configuration for stats command
pub struct StatsConfig {
    pub file: PathBuf,
    pub column: String,
    /// Number of sample values; the configured preview size when absent
    pub samples: Option<usize>,
    pub engine: EngineConfig,
    pub output_format: output::OutputFormat,
    pub output_file: Option<PathBuf>,
}

/// Print sample values and statistics of one column
pub async fn stats(config: StatsConfig) -> Result<()> {
    let dataset = loader::load_dataset(&config.file, &config.engine, None)?;
    let samples = config.samples.unwrap_or(config.engine.sample_rows);
    let report = column_report(&dataset, &config.column, samples)?;

    output::print_output(&report, config.output_format, config.output_file.as_deref(), || {
        output::key_value_table(&flatten(&report))
    })
}

/// Statistics and distinct sample values of a column
pub fn column_report(dataset: &Dataset, column: &str, samples: usize) -> Result<Value> {
    let Some(statistics) = dataset.statistics(column) else {
        let known: Vec<&str> = dataset.column_names().collect();
        anyhow::bail!("Column '{}' not found; available columns: {}", column, known.join(", "));
    };
    let sample_values: Vec<CellValue> = dataset.sample_values(column, samples);

    Ok(json!({
        "column": column,
        "type": statistics.column_type,
        "samples": sample_values,
        "statistics": statistics,
    }))
}

/// Lift the statistics fields next to the column name for the table view
fn flatten(report: &Value) -> Value {
    let mut flat = serde_json::Map::new();
    for key in ["column", "type", "samples"] {
        if let Some(value) = report.get(key) {
            flat.insert(key.to_string(), value.clone());
        }
    }
    if let Some(Value::Object(stats)) = report.get("statistics") {
        for (key, value) in stats {
            if !matches!(key.as_str(), "column" | "column_type") {
                flat.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(flat)
}
