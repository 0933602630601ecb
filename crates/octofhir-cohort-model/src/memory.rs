//! In-memory repositories
//!
//! Cloning a store shares the underlying map, so a test can keep a handle to
//! inspect what the service wrote.

use async_trait::async_trait;
use octofhir_cohort_diagnostics::{CohortError, Result};
use octofhir_cohort_types::{Cohort, Dataset, SavedFilter};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::audit::AuditEvent;
use crate::repository::{AnalyticsRecorder, CohortRepository, DatasetRepository, FilterRepository};

/// Dataset store backed by a hash map
#[derive(Clone, Default)]
pub struct InMemoryDatasetRepository {
    datasets: Arc<RwLock<HashMap<String, Dataset>>>,
}

impl InMemoryDatasetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a dataset
    pub fn insert(&self, dataset: Dataset) {
        self.datasets.write().insert(dataset.id.clone(), dataset);
    }

    pub fn len(&self) -> usize {
        self.datasets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.read().is_empty()
    }
}

#[async_trait]
impl DatasetRepository for InMemoryDatasetRepository {
    async fn get(&self, id: &str) -> Result<Option<Dataset>> {
        Ok(self.datasets.read().get(id).cloned())
    }
}

/// Saved filter store backed by a hash map
#[derive(Clone, Default)]
pub struct InMemoryFilterRepository {
    filters: Arc<RwLock<HashMap<String, SavedFilter>>>,
}

impl InMemoryFilterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All filters of a study, sorted by name
    pub fn by_study(&self, study_id: &str) -> Vec<SavedFilter> {
        let mut filters: Vec<SavedFilter> = self
            .filters
            .read()
            .values()
            .filter(|f| f.study_id == study_id)
            .cloned()
            .collect();
        filters.sort_by(|a, b| a.name.cmp(&b.name));
        filters
    }
}

#[async_trait]
impl FilterRepository for InMemoryFilterRepository {
    async fn get(&self, id: &str) -> Result<Option<SavedFilter>> {
        Ok(self.filters.read().get(id).cloned())
    }

    async fn save(&self, filter: SavedFilter) -> Result<()> {
        self.filters.write().insert(filter.id.clone(), filter);
        Ok(())
    }

    async fn increment_usage(&self, id: &str) -> Result<u64> {
        let mut filters = self.filters.write();
        let filter = filters
            .get_mut(id)
            .ok_or_else(|| CohortError::filter_not_found(id))?;
        filter.usage_count += 1;
        Ok(filter.usage_count)
    }
}

/// Cohort store backed by a hash map
///
/// `save` takes the write lock, so concurrent writes to one id are
/// serialized and the last write wins.
#[derive(Clone, Default)]
pub struct InMemoryCohortRepository {
    cohorts: Arc<RwLock<HashMap<String, Cohort>>>,
}

impl InMemoryCohortRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cohorts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cohorts.read().is_empty()
    }
}

#[async_trait]
impl CohortRepository for InMemoryCohortRepository {
    async fn get(&self, id: &str) -> Result<Option<Cohort>> {
        Ok(self.cohorts.read().get(id).cloned())
    }

    async fn save(&self, cohort: Cohort) -> Result<()> {
        self.cohorts.write().insert(cohort.id.clone(), cohort);
        Ok(())
    }
}

/// Recorder that keeps every event in memory
#[derive(Clone, Default)]
pub struct MemoryRecorder {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl AnalyticsRecorder for MemoryRecorder {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        self.events.write().push(event);
        Ok(())
    }
}

/// Recorder that writes events to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRecorder;

#[async_trait]
impl AnalyticsRecorder for LogRecorder {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        log::info!("audit: {}", event);
        Ok(())
    }
}
