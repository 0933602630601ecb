//! Storage contracts used by the cohort service

use async_trait::async_trait;
use octofhir_cohort_diagnostics::Result;
use octofhir_cohort_types::{Cohort, Dataset, SavedFilter};

use crate::audit::AuditEvent;

/// Read access to uploaded datasets
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Look up a dataset by its master data id
    async fn get(&self, id: &str) -> Result<Option<Dataset>>;
}

/// Saved filter storage
#[async_trait]
pub trait FilterRepository: Send + Sync {
    /// Look up a saved filter
    async fn get(&self, id: &str) -> Result<Option<SavedFilter>>;

    /// Insert or replace a saved filter
    async fn save(&self, filter: SavedFilter) -> Result<()>;

    /// Bump the usage counter, returning the new count
    ///
    /// Fails with a not-found error when the filter does not exist.
    async fn increment_usage(&self, id: &str) -> Result<u64>;
}

/// Cohort snapshot storage
///
/// Writes to the same cohort id must be serialized by the implementation or
/// its caller; the service does not lock across calls.
#[async_trait]
pub trait CohortRepository: Send + Sync {
    /// Look up a cohort
    async fn get(&self, id: &str) -> Result<Option<Cohort>>;

    /// Insert or replace a cohort snapshot
    async fn save(&self, cohort: Cohort) -> Result<()>;
}

/// Sink for analytics and audit events
#[async_trait]
pub trait AnalyticsRecorder: Send + Sync {
    /// Record one event
    async fn record(&self, event: AuditEvent) -> Result<()>;
}
