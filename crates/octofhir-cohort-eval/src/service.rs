//! Cohort service
//!
//! Orchestrates the repositories, the builder, the comparison engine and the
//! comparison cache: resolves datasets and filters, builds and persists
//! cohort snapshots, keeps saved filter usage counts, and records audit
//! events.
//!
//! Concurrent writes to the same cohort id are not coordinated here; the
//! cohort repository (or its caller) must serialize them.

use chrono::Utc;
use octofhir_cohort_diagnostics::{CohortError, Result};
use octofhir_cohort_model::{
    AnalyticsRecorder, AuditAction, AuditEvent, CohortRepository, DatasetRepository, EntityType, FilterRepository,
};
use octofhir_cohort_types::{Cohort, ComparisonResult, Dataset, FilterGroup, comparison_key};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::builder::{CancellationToken, CohortBuilder, CohortDraft};
use crate::cache::ComparisonCache;
use crate::compare::{ComparisonEngine, check_request};
use crate::config::EngineConfig;
use crate::context::EvaluationContext;

/// Request to create a cohort
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateCohortRequest {
    /// Id to assign; generated when absent
    #[serde(default)]
    pub id: Option<String>,
    pub study_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub master_data_id: String,
    #[serde(default)]
    pub filter_id: Option<String>,
    #[serde(default)]
    pub filter: Option<FilterGroup>,
}

/// Partial update of a cohort
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateCohortRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub filter: Option<FilterGroup>,
    #[serde(default)]
    pub filter_id: Option<String>,
}

impl UpdateCohortRequest {
    /// Whether the update changes the filter and so needs a rebuild
    pub fn changes_filter(&self) -> bool {
        self.filter.is_some() || self.filter_id.is_some()
    }
}

/// Filter resolved from a request
struct ResolvedFilter {
    filter: FilterGroup,
    /// Saved filter the definition came from
    saved_filter_id: Option<String>,
}

/// Cohort orchestration over pluggable repositories
pub struct CohortService {
    datasets: Arc<dyn DatasetRepository>,
    filters: Arc<dyn FilterRepository>,
    cohorts: Arc<dyn CohortRepository>,
    recorder: Arc<dyn AnalyticsRecorder>,
    builder: CohortBuilder,
    comparison: ComparisonEngine,
    cache: ComparisonCache,
    next_id: AtomicU64,
}

impl CohortService {
    /// Create a service
    pub fn new(
        datasets: Arc<dyn DatasetRepository>,
        filters: Arc<dyn FilterRepository>,
        cohorts: Arc<dyn CohortRepository>,
        recorder: Arc<dyn AnalyticsRecorder>,
        config: EngineConfig,
    ) -> Self {
        Self {
            datasets,
            filters,
            cohorts,
            recorder,
            comparison: ComparisonEngine::new(&config),
            builder: CohortBuilder::new(config),
            cache: ComparisonCache::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Share a caller-owned comparison cache
    pub fn with_cache(mut self, cache: ComparisonCache) -> Self {
        self.cache = cache;
        self
    }

    /// Use a caller-owned cancellation token for builds
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.builder = self.builder.with_cancellation(token);
        self
    }

    pub fn cache(&self) -> &ComparisonCache {
        &self.cache
    }

    /// Create and persist a cohort
    ///
    /// An inline filter is used when present, otherwise `filter_id` is
    /// resolved; a request with neither is a validation error. A requested
    /// id that is already taken is rejected, and generated ids skip taken
    /// ones.
    pub async fn create_cohort(&self, request: CreateCohortRequest) -> Result<Cohort> {
        let dataset = self.load_dataset(&request.master_data_id).await?;
        let resolved = self
            .resolve_filter(request.filter, request.filter_id.as_deref())
            .await?;
        let ctx = self.context_for(&dataset, &resolved.filter).await?;

        let id = match request.id {
            Some(id) => {
                if self.cohorts.get(&id).await?.is_some() {
                    return Err(CohortError::cohort_exists(&id));
                }
                id
            }
            None => self.generate_id().await?,
        };
        let mut draft = CohortDraft::new(id, request.study_id.clone(), request.name);
        draft.description = request.description;
        draft.filter_id = request.filter_id;

        let cohort = self.builder.build(draft, &dataset, &resolved.filter, ctx)?;
        self.cohorts.save(cohort.clone()).await?;
        self.cache.invalidate_cohort(&cohort.id);

        if let Some(filter_id) = &resolved.saved_filter_id {
            self.record_filter_use(&request.study_id, filter_id, &cohort.id).await?;
        }
        self.recorder
            .record(
                AuditEvent::new(&cohort.study_id, EntityType::Cohort, &cohort.id, AuditAction::Created).with_new(json!({
                    "name": cohort.name,
                    "patient_count": cohort.patient_count,
                    "master_data_id": cohort.master_data_id,
                })),
            )
            .await?;

        log::info!(
            "Created cohort {} ({}) with {} of {} patients",
            cohort.id,
            cohort.name,
            cohort.patient_count,
            cohort.master_data_patient_count
        );
        Ok(cohort)
    }

    /// Apply a partial update to a cohort
    ///
    /// Name and description edits keep the patient ids. A filter edit
    /// re-evaluates the cohort, replaces its patient ids, and evicts cached
    /// comparisons that cover it.
    pub async fn update_cohort(&self, id: &str, patch: UpdateCohortRequest) -> Result<Cohort> {
        let previous = self.load_cohort(id).await?;
        let refilter = patch.changes_filter();

        let mut updated = if refilter {
            let dataset = self.load_dataset(&previous.master_data_id).await?;
            let resolved = self
                .resolve_filter(patch.filter.clone(), patch.filter_id.as_deref())
                .await?;
            let ctx = self.context_for(&dataset, &resolved.filter).await?;

            let mut rebuilt = self.builder.rebuild(&previous, &dataset, &resolved.filter, ctx)?;
            rebuilt.filter_id = patch.filter_id.clone();
            if let Some(filter_id) = &resolved.saved_filter_id {
                self.record_filter_use(&previous.study_id, filter_id, &previous.id)
                    .await?;
            }
            rebuilt
        } else {
            let mut renamed = previous.clone();
            renamed.updated_at = Utc::now();
            renamed
        };

        if let Some(name) = patch.name {
            updated.name = name;
        }
        if let Some(description) = patch.description {
            updated.description = Some(description);
        }

        self.cohorts.save(updated.clone()).await?;
        if refilter {
            self.cache.invalidate_cohort(&updated.id);
        }

        self.recorder
            .record(
                AuditEvent::new(&updated.study_id, EntityType::Cohort, &updated.id, AuditAction::Updated)
                    .with_previous(json!({
                        "name": previous.name,
                        "patient_count": previous.patient_count,
                    }))
                    .with_new(json!({
                        "name": updated.name,
                        "patient_count": updated.patient_count,
                    })),
            )
            .await?;

        log::info!(
            "Updated cohort {}: {} -> {} patients",
            updated.id,
            previous.patient_count,
            updated.patient_count
        );
        Ok(updated)
    }

    /// Compare cohorts of a study, serving a fresh cached result when possible
    ///
    /// Cohorts that do not exist, or belong to another study, are not-found
    /// errors.
    pub async fn compare_cohorts(&self, study_id: &str, cohort_ids: &[String]) -> Result<ComparisonResult> {
        check_request(cohort_ids)?;

        let mut cohorts = Vec::with_capacity(cohort_ids.len());
        for id in cohort_ids {
            let cohort = self.load_cohort(id).await?;
            if cohort.study_id != study_id {
                return Err(CohortError::cohort_not_found(id));
            }
            cohorts.push(cohort);
        }

        let now = Utc::now();
        if let Some(cached) = self.cache.get_fresh(cohort_ids, now) {
            log::debug!("Serving cached comparison of {}", comparison_key(cohort_ids));
            return Ok(cached);
        }

        let result = self.comparison.compare_at(&cohorts, now)?;
        self.cache.insert(result.clone());

        self.recorder
            .record(
                AuditEvent::new(study_id, EntityType::Comparison, comparison_key(cohort_ids), AuditAction::Compared)
                    .with_new(json!({
                        "cohort_ids": result.cohort_ids,
                        "total_unique_patients": result.data.total_unique_patients,
                        "common_to_all": result.data.common_to_all,
                    })),
            )
            .await?;

        log::info!(
            "Compared cohorts {}: {} unique patients",
            comparison_key(cohort_ids),
            result.data.total_unique_patients
        );
        Ok(result)
    }

    async fn load_dataset(&self, id: &str) -> Result<Dataset> {
        self.datasets
            .get(id)
            .await?
            .ok_or_else(|| CohortError::dataset_not_found(id))
    }

    async fn load_cohort(&self, id: &str) -> Result<Cohort> {
        self.cohorts
            .get(id)
            .await?
            .ok_or_else(|| CohortError::cohort_not_found(id))
    }

    async fn resolve_filter(&self, inline: Option<FilterGroup>, filter_id: Option<&str>) -> Result<ResolvedFilter> {
        if let Some(filter) = inline {
            return Ok(ResolvedFilter {
                filter,
                saved_filter_id: None,
            });
        }
        let Some(filter_id) = filter_id else {
            return Err(CohortError::missing_filter());
        };
        let saved = self
            .filters
            .get(filter_id)
            .await?
            .ok_or_else(|| CohortError::filter_not_found(filter_id))?;
        Ok(ResolvedFilter {
            filter: saved.filter,
            saved_filter_id: Some(saved.id),
        })
    }

    /// Evaluation context with the dataset schema and every cohort the filter references
    async fn context_for(&self, dataset: &Dataset, filter: &FilterGroup) -> Result<EvaluationContext> {
        let mut ctx = EvaluationContext::for_dataset(dataset);
        for cohort_id in filter.referenced_cohorts() {
            let cohort = self.load_cohort(&cohort_id).await?;
            ctx.add_cohort_snapshot(&cohort);
        }
        Ok(ctx)
    }

    async fn record_filter_use(&self, study_id: &str, filter_id: &str, cohort_id: &str) -> Result<()> {
        let usage_count = self.filters.increment_usage(filter_id).await?;
        self.recorder
            .record(
                AuditEvent::new(study_id, EntityType::SavedFilter, filter_id, AuditAction::Used).with_new(json!({
                    "cohort_id": cohort_id,
                    "usage_count": usage_count,
                })),
            )
            .await
    }

    /// Next `cohort-{n}` id not yet present in the repository
    async fn generate_id(&self) -> Result<String> {
        loop {
            let id = format!("cohort-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
            if self.cohorts.get(&id).await?.is_none() {
                return Ok(id);
            }
        }
    }
}
