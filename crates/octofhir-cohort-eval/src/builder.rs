//! Cohort building
//!
//! Scans a dataset's rows with a filter and collects the patient ids of the
//! matching rows into a cohort snapshot. Rows are processed in chunks;
//! between chunks the scan checks for cancellation and for an exceeded
//! deadline. With `parallel` enabled the chunks run on the rayon pool and
//! their results are merged in chunk order, so the output is identical to a
//! sequential scan.

use chrono::Utc;
use indexmap::IndexSet;
use octofhir_cohort_diagnostics::{CohortError, Result};
use octofhir_cohort_types::{Cohort, Dataset, FilterGroup, Row, cell};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::context::EvaluationContext;
use crate::engine::FilterEvaluator;

/// Shared flag used to stop a running build
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; running scans stop at the next chunk boundary
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Identity of a cohort about to be built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortDraft {
    pub id: String,
    pub study_id: String,
    pub name: String,
    pub description: Option<String>,
    pub filter_id: Option<String>,
}

impl CohortDraft {
    pub fn new(id: impl Into<String>, study_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            study_id: study_id.into(),
            name: name.into(),
            description: None,
            filter_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_filter_id(mut self, filter_id: impl Into<String>) -> Self {
        self.filter_id = Some(filter_id.into());
        self
    }
}

/// Outcome of scanning a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Distinct matching patient ids in row order
    pub patient_ids: Vec<String>,
    /// Matching rows before deduplication
    pub matched_row_count: usize,
    /// Rows scanned
    pub row_count: usize,
}

/// Builds cohorts from datasets and filters
#[derive(Debug, Clone, Default)]
pub struct CohortBuilder {
    config: EngineConfig,
    cancel: CancellationToken,
}

impl CohortBuilder {
    /// Create a builder
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use a caller-owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Scan a dataset and collect the matching patient ids
    ///
    /// The patient id column comes from `ctx`. The filter and the patient id
    /// column are validated before any row is evaluated; when the dataset
    /// has a schema, every field the filter reads must be part of it.
    pub fn scan(&self, dataset: &Dataset, filter: &FilterGroup, ctx: EvaluationContext) -> Result<ScanResult> {
        if dataset.columns.is_empty() {
            filter.validate()?;
        } else {
            filter.validate_against(&dataset.columns)?;
        }
        let id_column = self.check_patient_id_column(dataset, &ctx)?;

        if !dataset.is_materialized() {
            log::warn!(
                "Dataset {} holds {} of {} rows in memory; scanning what is loaded",
                dataset.id,
                dataset.rows.len(),
                dataset.row_count
            );
        }

        let started = Instant::now();
        let evaluator = FilterEvaluator::new(ctx);
        let chunk_size = self.config.chunk_size.max(1);

        let chunks: Vec<Vec<String>> = if self.config.parallel {
            dataset
                .rows
                .par_chunks(chunk_size)
                .map(|chunk| self.scan_chunk(&evaluator, chunk, filter, &id_column, started))
                .collect::<Result<Vec<_>>>()?
        } else {
            dataset
                .rows
                .chunks(chunk_size)
                .map(|chunk| self.scan_chunk(&evaluator, chunk, filter, &id_column, started))
                .collect::<Result<Vec<_>>>()?
        };

        let matched_row_count = chunks.iter().map(Vec::len).sum();
        let distinct: IndexSet<String> = chunks.into_iter().flatten().collect();

        log::debug!(
            "Scanned {} rows of dataset {} in {:?}: {} matching rows, {} patients",
            dataset.rows.len(),
            dataset.id,
            started.elapsed(),
            matched_row_count,
            distinct.len()
        );

        Ok(ScanResult {
            patient_ids: distinct.into_iter().collect(),
            matched_row_count,
            row_count: dataset.rows.len(),
        })
    }

    /// Build a new cohort snapshot
    pub fn build(
        &self,
        draft: CohortDraft,
        dataset: &Dataset,
        filter: &FilterGroup,
        ctx: EvaluationContext,
    ) -> Result<Cohort> {
        let scan = self.scan(dataset, filter, ctx)?;
        let now = Utc::now();

        Ok(Cohort {
            id: draft.id,
            study_id: draft.study_id,
            name: draft.name,
            description: draft.description,
            master_data_id: dataset.id.clone(),
            filter_id: draft.filter_id,
            filter: Some(filter.clone()),
            patient_count: scan.patient_ids.len(),
            filtered_patient_ids: scan.patient_ids,
            matched_row_count: scan.matched_row_count,
            master_data_patient_count: dataset.row_count,
            created_at: now,
            updated_at: now,
        })
    }

    /// Re-evaluate a cohort with a (possibly new) filter
    ///
    /// The result keeps the identity and creation time of `previous` and
    /// replaces its patient ids wholesale; `previous` is left untouched.
    pub fn rebuild(
        &self,
        previous: &Cohort,
        dataset: &Dataset,
        filter: &FilterGroup,
        ctx: EvaluationContext,
    ) -> Result<Cohort> {
        let draft = CohortDraft {
            id: previous.id.clone(),
            study_id: previous.study_id.clone(),
            name: previous.name.clone(),
            description: previous.description.clone(),
            filter_id: previous.filter_id.clone(),
        };
        let mut cohort = self.build(draft, dataset, filter, ctx)?;
        cohort.created_at = previous.created_at;
        Ok(cohort)
    }

    fn check_patient_id_column(&self, dataset: &Dataset, ctx: &EvaluationContext) -> Result<String> {
        let column = ctx
            .patient_id_column()
            .ok_or_else(CohortError::patient_id_column_not_set)?;
        if !dataset.has_column(column) {
            return Err(CohortError::patient_id_column_absent(column));
        }
        if let Some(index) = dataset.rows.iter().position(|row| cell(row, column).is_empty()) {
            return Err(CohortError::missing_patient_id(column, index));
        }
        Ok(column.to_string())
    }

    fn scan_chunk(
        &self,
        evaluator: &FilterEvaluator,
        chunk: &[Row],
        filter: &FilterGroup,
        id_column: &str,
        started: Instant,
    ) -> Result<Vec<String>> {
        self.checkpoint(started)?;

        let mut ids = Vec::new();
        for row in chunk {
            if evaluator.matches_validated(row, filter)? {
                ids.push(cell(row, id_column).to_text().into_owned());
            }
        }
        Ok(ids)
    }

    fn checkpoint(&self, started: Instant) -> Result<()> {
        if self.cancel.is_cancelled() {
            log::warn!("Cohort build cancelled");
            return Err(CohortError::cancelled());
        }
        if let Some(deadline) = self.config.deadline() {
            if started.elapsed() >= deadline {
                log::warn!("Cohort build exceeded its {:?} deadline", deadline);
                return Err(CohortError::deadline_exceeded(self.config.deadline_ms.unwrap_or_default()));
            }
        }
        Ok(())
    }
}
