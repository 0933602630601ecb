//! Comparison result cache
//!
//! Keyed by the sorted cohort ids of a comparison. An entry is served only
//! while it is fresh; rebuilding any cohort it covers evicts it.

use chrono::{DateTime, Utc};
use octofhir_cohort_types::{ComparisonResult, comparison_key, sorted_cohort_ids};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Cache of computed comparisons
///
/// Owned by the caller; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct ComparisonCache {
    entries: Arc<RwLock<HashMap<Vec<String>, ComparisonResult>>>,
}

impl ComparisonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh entry for a set of cohorts, if any
    pub fn get_fresh<S: AsRef<str>>(&self, cohort_ids: &[S], now: DateTime<Utc>) -> Option<ComparisonResult> {
        let key = sorted_cohort_ids(cohort_ids);
        let entries = self.entries.read();
        let entry = entries.get(&key)?;
        if entry.is_fresh_at(now) {
            Some(entry.clone())
        } else {
            log::debug!("Cached comparison {} expired at {}", comparison_key(&key), entry.expires_at);
            None
        }
    }

    /// Store a result, replacing any previous entry for the same cohorts
    pub fn insert(&self, result: ComparisonResult) {
        let key = sorted_cohort_ids(&result.cohort_ids);
        self.entries.write().insert(key, result);
    }

    /// Evict every entry that covers a cohort, returning how many were removed
    pub fn invalidate_cohort(&self, cohort_id: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, result| !result.cohort_ids.iter().any(|id| id == cohort_id));
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("Invalidated {} cached comparisons covering cohort {}", removed, cohort_id);
        }
        removed
    }

    /// Drop expired entries
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, result| result.is_fresh_at(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
