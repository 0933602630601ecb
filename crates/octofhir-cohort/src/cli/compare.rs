//! Compare command implementation

use super::{loader, output};
use anyhow::{Context, Result};
use octofhir_cohort_eval::{ComparisonEngine, EngineConfig};
use octofhir_cohort_types::{Cohort, ComparisonResult};
use std::path::PathBuf;
use tabled::{Table, Tabled};

/// Configuration for compare command
pub struct CompareConfig {
    pub files: Vec<PathBuf>,
    pub engine: EngineConfig,
    pub verbose: bool,
    pub output_format: output::OutputFormat,
    pub output_file: Option<PathBuf>,
}

#[derive(Tabled)]
struct CohortRow {
    #[tabled(rename = "Cohort")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Patients")]
    patient_count: usize,
    #[tabled(rename = "Unique")]
    unique_patients: usize,
    #[tabled(rename = "Shared")]
    overlap_with_others: usize,
}

#[derive(Tabled)]
struct OverlapRow {
    #[tabled(rename = "Cohorts")]
    cohorts: String,
    #[tabled(rename = "Patients")]
    count: usize,
}

/// Compare cohort snapshot files
pub async fn compare(config: CompareConfig) -> Result<()> {
    let cohorts = config
        .files
        .iter()
        .map(|path| loader::load_cohort(path))
        .collect::<Result<Vec<Cohort>>>()?;
    if config.verbose {
        eprintln!("Comparing {} cohorts", cohorts.len());
    }

    let result = ComparisonEngine::new(&config.engine)
        .compare(&cohorts)
        .context("Failed to compare cohorts")?;

    let value = serde_json::to_value(&result).context("Failed to serialize comparison")?;
    output::print_output(&value, config.output_format, config.output_file.as_deref(), || {
        comparison_tables(&result)
    })
}

fn comparison_tables(result: &ComparisonResult) -> String {
    let cohorts: Vec<CohortRow> = result
        .data
        .cohorts
        .iter()
        .map(|c| CohortRow {
            id: c.id.clone(),
            name: c.name.clone(),
            patient_count: c.patient_count,
            unique_patients: c.unique_patients,
            overlap_with_others: c.overlap_with_others,
        })
        .collect();
    let overlaps: Vec<OverlapRow> = result
        .data
        .overlaps
        .iter()
        .map(|o| OverlapRow {
            cohorts: o.cohort_ids.join(" ∩ "),
            count: o.count,
        })
        .collect();

    let mut out = output::styled(Table::new(cohorts));
    out.push_str(&format!(
        "\nTotal unique patients: {}\nCommon to all: {}\n",
        result.data.total_unique_patients, result.data.common_to_all
    ));
    if !overlaps.is_empty() {
        out.push('\n');
        out.push_str(&output::styled(Table::new(overlaps)));
    }
    out
}
