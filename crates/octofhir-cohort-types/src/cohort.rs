//! Cohort snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::filter::FilterGroup;

/// Patient ids matching a filter against one dataset, with counts
///
/// A cohort is an immutable snapshot: editing its filter produces a new
/// snapshot with the id list replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: String,
    pub study_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub master_data_id: String,
    #[serde(default)]
    pub filter_id: Option<String>,
    #[serde(default)]
    pub filter: Option<FilterGroup>,
    /// Distinct matching patient ids in dataset row order
    pub filtered_patient_ids: Vec<String>,
    pub patient_count: usize,
    /// Matching rows before patient id deduplication
    #[serde(default)]
    pub matched_row_count: usize,
    pub master_data_patient_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cohort {
    /// Patient ids as a set
    pub fn patient_set(&self) -> HashSet<&str> {
        self.filtered_patient_ids.iter().map(String::as_str).collect()
    }

    /// Share of the dataset's rows that made it into the cohort
    pub fn coverage(&self) -> f64 {
        if self.master_data_patient_count == 0 {
            0.0
        } else {
            self.patient_count as f64 / self.master_data_patient_count as f64
        }
    }
}
