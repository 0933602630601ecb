//! Build command implementation

use super::{loader, output};
use anyhow::{Context, Result};
use octofhir_cohort_eval::{CancellationToken, CohortService, CreateCohortRequest, EngineConfig};
use octofhir_cohort_model::{
    CohortRepository, InMemoryCohortRepository, InMemoryDatasetRepository, InMemoryFilterRepository, LogRecorder,
};
use octofhir_cohort_types::Cohort;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for build command
pub struct BuildConfig {
    pub data: PathBuf,
    pub filter: PathBuf,
    pub patient_id_column: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub study: String,
    /// Cohort snapshots the filter's membership rules refer to
    pub cohorts: Vec<PathBuf>,
    pub engine: EngineConfig,
    pub verbose: bool,
    pub output_format: output::OutputFormat,
    pub output_file: Option<PathBuf>,
}

/// Build a cohort from a data file and a filter file
pub async fn build(config: BuildConfig) -> Result<()> {
    let cohort = build_cohort(&config).await?;

    if config.verbose {
        eprintln!(
            "Matched {} rows, {} of {} patients",
            cohort.matched_row_count, cohort.patient_count, cohort.master_data_patient_count
        );
    }

    let value = serde_json::to_value(&cohort).context("Failed to serialize cohort")?;
    output::print_output(&value, config.output_format, config.output_file.as_deref(), || {
        summary_table(&cohort)
    })
}

/// Run the build through the cohort service over in-memory stores
///
/// Ctrl-C cancels the scan at the next chunk boundary.
pub async fn build_cohort(config: &BuildConfig) -> Result<Cohort> {
    let dataset = loader::load_dataset(&config.data, &config.engine, config.patient_id_column.as_deref())?;
    let filter = loader::load_filter(&config.filter)?;
    let dataset_id = dataset.id.clone();

    let datasets = InMemoryDatasetRepository::new();
    datasets.insert(dataset);
    let cohorts = InMemoryCohortRepository::new();
    for path in &config.cohorts {
        let cohort = loader::load_cohort(path)?;
        cohorts.save(cohort).await?;
    }

    let token = CancellationToken::new();
    let watcher = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, cancelling build");
                token.cancel();
            }
        })
    };

    let service = CohortService::new(
        Arc::new(datasets),
        Arc::new(InMemoryFilterRepository::new()),
        Arc::new(cohorts),
        Arc::new(LogRecorder),
        config.engine.clone(),
    )
    .with_cancellation(token);

    let name = config.name.clone().unwrap_or_else(|| {
        config
            .filter
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cohort".to_string())
    });
    let request = CreateCohortRequest {
        id: config.id.clone(),
        study_id: config.study.clone(),
        name,
        description: None,
        master_data_id: dataset_id,
        filter_id: None,
        filter: Some(filter),
    };

    let result = service
        .create_cohort(request)
        .await
        .with_context(|| format!("Failed to build cohort from {}", config.data.display()));
    watcher.abort();
    result
}

fn summary_table(cohort: &Cohort) -> String {
    let filter = cohort.filter.as_ref().map(ToString::to_string);
    output::key_value_table(&json!({
        "id": cohort.id,
        "name": cohort.name,
        "dataset": cohort.master_data_id,
        "filter": filter,
        "matched_rows": cohort.matched_row_count,
        "patients": cohort.patient_count,
        "dataset_rows": cohort.master_data_patient_count,
        "coverage": format!("{:.1}%", cohort.coverage() * 100.0),
        "patient_ids": cohort.filtered_patient_ids,
    }))
}
