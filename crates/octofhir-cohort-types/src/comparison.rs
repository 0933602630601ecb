//! Cohort comparison request and result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Cohort ids of one overlap or Venn region; comparisons rarely exceed three
pub type CohortIds = SmallVec<[String; 3]>;

/// Request to compare cohorts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareRequest {
    pub cohort_ids: Vec<String>,
}

/// Per-cohort figures of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortSummary {
    pub id: String,
    pub name: String,
    pub patient_count: usize,
    /// Patients in no other compared cohort
    pub unique_patients: usize,
    pub overlap_with_others: usize,
}

/// Patients shared by a specific set of cohorts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapDetail {
    pub cohort_ids: CohortIds,
    /// Sorted
    pub patient_ids: Vec<String>,
    pub count: usize,
}

/// One region size of a Venn diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VennSet {
    pub sets: CohortIds,
    pub size: usize,
}

/// Presentation payload for a Venn diagram of two or three cohorts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VennData {
    pub sets: Vec<VennSet>,
}

/// Comparison figures, independent of when they were computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonData {
    pub cohorts: Vec<CohortSummary>,
    pub total_unique_patients: usize,
    pub common_to_all: usize,
    pub overlaps: Vec<OverlapDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venn_data: Option<VennData>,
}

/// A computed comparison with its cache lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub cohort_ids: Vec<String>,
    #[serde(flatten)]
    pub data: ComparisonData,
    pub computed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ComparisonResult {
    /// Whether the result may still be served at `now`
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Summary of one compared cohort
    pub fn cohort(&self, id: &str) -> Option<&CohortSummary> {
        self.data.cohorts.iter().find(|c| c.id == id)
    }
}

/// Order-independent identity of a set of cohort ids
pub fn sorted_cohort_ids<S: AsRef<str>>(cohort_ids: &[S]) -> Vec<String> {
    let mut ids: Vec<String> = cohort_ids.iter().map(|id| id.as_ref().to_string()).collect();
    ids.sort_unstable();
    ids
}

/// Printable form of [`sorted_cohort_ids`], used in logs and audit events
pub fn comparison_key<S: AsRef<str>>(cohort_ids: &[S]) -> String {
    sorted_cohort_ids(cohort_ids).join(",")
}
