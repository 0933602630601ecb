//! File loading for the CLI
//!
//! Data files hold either a JSON array of row objects or an object with a
//! `rows` array and an optional `patient_id_column`. Filter files hold a
//! filter group or a saved filter wrapping one.

use anyhow::{Context, Result};
use octofhir_cohort_eval::EngineConfig;
use octofhir_cohort_types::{Cohort, Dataset, FilterGroup, Row, SavedFilter};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum DataFile {
    Rows(Vec<Row>),
    Object {
        #[serde(default)]
        id: Option<String>,
        rows: Vec<Row>,
        #[serde(default)]
        patient_id_column: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilterFile {
    Saved(SavedFilter),
    Group(FilterGroup),
}

/// Read and parse a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {} file: {}", what, path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {} file: {}", what, path.display()))
}

/// Load a dataset and infer its column types
///
/// The dataset id is the file's `id`, or else the file stem. An explicit
/// `patient_id_column` overrides the one in the file.
pub fn load_dataset(path: &Path, config: &EngineConfig, patient_id_column: Option<&str>) -> Result<Dataset> {
    let (id, rows, file_column) = match read_json::<DataFile>(path, "data")? {
        DataFile::Rows(rows) => (None, rows, None),
        DataFile::Object {
            id,
            rows,
            patient_id_column,
        } => (id, rows, patient_id_column),
    };

    let id = id.unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string())
    });
    let mut dataset = Dataset::with_inferencer(id, rows, &config.inferencer(), config.sample_rows);
    if let Some(column) = patient_id_column.map(str::to_string).or(file_column) {
        dataset = dataset.with_patient_id_column(column);
    }

    log::debug!(
        "Loaded dataset {} from {}: {} rows, {} columns",
        dataset.id,
        path.display(),
        dataset.row_count,
        dataset.columns.len()
    );
    Ok(dataset)
}

/// Load a filter group, unwrapping a saved filter if needed
pub fn load_filter(path: &Path) -> Result<FilterGroup> {
    Ok(match read_json::<FilterFile>(path, "filter")? {
        FilterFile::Saved(saved) => saved.filter,
        FilterFile::Group(group) => group,
    })
}

/// Load a cohort snapshot
pub fn load_cohort(path: &Path) -> Result<Cohort> {
    read_json(path, "cohort")
}

/// Load the engine config, or the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}
