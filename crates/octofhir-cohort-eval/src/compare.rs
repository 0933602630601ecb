//! Cohort comparison
//!
//! Set algebra over the patient ids of two or more cohorts: union,
//! intersection, per-cohort unique counts, pairwise and all-way overlaps, and
//! Venn diagram region sizes. Every id list in the output is sorted, so the
//! same cohorts always produce the same comparison data.

use chrono::{DateTime, Utc};
use octofhir_cohort_diagnostics::{CohortError, Result};
use octofhir_cohort_types::{
    Cohort, CohortIds, CohortSummary, ComparisonData, ComparisonResult, OverlapDetail, VennData, VennSet,
};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::config::EngineConfig;

/// Computes comparisons between cohorts
#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    ttl: chrono::Duration,
    deadline: Option<Duration>,
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ComparisonEngine {
    /// Create an engine using the configured TTL and deadline
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            ttl: config.comparison_ttl(),
            deadline: config.deadline(),
        }
    }

    /// Override the result lifetime
    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Compare cohorts, stamping the result with the current time
    pub fn compare(&self, cohorts: &[Cohort]) -> Result<ComparisonResult> {
        self.compare_at(cohorts, Utc::now())
    }

    /// Compare cohorts as of `now`
    pub fn compare_at(&self, cohorts: &[Cohort], now: DateTime<Utc>) -> Result<ComparisonResult> {
        let data = self.compute(cohorts)?;
        Ok(ComparisonResult {
            cohort_ids: cohorts.iter().map(|c| c.id.clone()).collect(),
            data,
            computed_at: now,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        })
    }

    /// Compute the comparison figures
    ///
    /// Fails with a validation error for an empty request or a cohort listed
    /// twice, and with a computation error if a derived count is inconsistent.
    pub fn compute(&self, cohorts: &[Cohort]) -> Result<ComparisonData> {
        let ids: Vec<&str> = cohorts.iter().map(|c| c.id.as_str()).collect();
        check_request(&ids)?;

        let started = Instant::now();
        let sets: Vec<HashSet<&str>> = cohorts.iter().map(Cohort::patient_set).collect();

        // Number of compared cohorts each patient belongs to
        let mut membership: HashMap<&str, usize> = HashMap::new();
        for set in &sets {
            for id in set {
                *membership.entry(*id).or_insert(0) += 1;
            }
        }
        let total_unique_patients = membership.len();
        let common_to_all = membership.values().filter(|&&n| n == sets.len()).count();

        let summaries: Vec<CohortSummary> = cohorts
            .iter()
            .zip(&sets)
            .map(|(cohort, set)| {
                let unique_patients = set.iter().filter(|id| membership.get(*id) == Some(&1)).count();
                CohortSummary {
                    id: cohort.id.clone(),
                    name: cohort.name.clone(),
                    patient_count: set.len(),
                    unique_patients,
                    overlap_with_others: set.len().saturating_sub(unique_patients),
                }
            })
            .collect();

        self.checkpoint(started, cohorts.len())?;
        let mut overlaps = Vec::new();
        for i in 0..sets.len() {
            for j in (i + 1)..sets.len() {
                self.checkpoint(started, cohorts.len())?;
                overlaps.push(overlap(cohorts, &sets, &[i, j]));
            }
        }
        if sets.len() >= 3 {
            self.checkpoint(started, cohorts.len())?;
            let all: Vec<usize> = (0..sets.len()).collect();
            overlaps.push(overlap(cohorts, &sets, &all));
        }

        let venn_data = matches!(sets.len(), 2 | 3).then(|| venn(cohorts, &sets));

        let data = ComparisonData {
            cohorts: summaries,
            total_unique_patients,
            common_to_all,
            overlaps,
            venn_data,
        };
        check_invariants(&data, &sets)?;

        log::debug!(
            "Compared {} cohorts: {} unique patients, {} common to all",
            cohorts.len(),
            data.total_unique_patients,
            data.common_to_all
        );
        Ok(data)
    }

    fn checkpoint(&self, started: Instant, cohort_count: usize) -> Result<()> {
        if let Some(deadline) = self.deadline {
            if started.elapsed() >= deadline {
                log::warn!("Comparison of {} cohorts exceeded its {:?} deadline", cohort_count, deadline);
                return Err(CohortError::deadline_exceeded(deadline.as_millis() as u64));
            }
        }
        Ok(())
    }
}

/// Reject an empty request or one that lists a cohort twice
pub fn check_request<S: AsRef<str>>(cohort_ids: &[S]) -> Result<()> {
    if cohort_ids.is_empty() {
        return Err(CohortError::empty_comparison());
    }
    let mut seen = HashSet::new();
    for id in cohort_ids {
        if !seen.insert(id.as_ref()) {
            return Err(CohortError::duplicate_cohort(id.as_ref()));
        }
    }
    Ok(())
}

fn ids_of(cohorts: &[Cohort], members: &[usize]) -> CohortIds {
    members.iter().map(|&i| cohorts[i].id.clone()).collect()
}

fn intersect<'a>(sets: &[HashSet<&'a str>], members: &[usize]) -> BTreeSet<&'a str> {
    let Some((&first, rest)) = members.split_first() else {
        return BTreeSet::new();
    };
    sets[first]
        .iter()
        .filter(|id| rest.iter().all(|&i| sets[i].contains(*id)))
        .copied()
        .collect()
}

fn overlap(cohorts: &[Cohort], sets: &[HashSet<&str>], members: &[usize]) -> OverlapDetail {
    let shared = intersect(sets, members);
    OverlapDetail {
        cohort_ids: ids_of(cohorts, members),
        count: shared.len(),
        patient_ids: shared.into_iter().map(str::to_string).collect(),
    }
}

/// Single-set sizes followed by every intersection size
fn venn(cohorts: &[Cohort], sets: &[HashSet<&str>]) -> VennData {
    let n = sets.len();
    let mut regions: Vec<SmallVec<[usize; 3]>> = (0..n).map(|i| SmallVec::from_slice(&[i])).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            regions.push(SmallVec::from_slice(&[i, j]));
        }
    }
    if n == 3 {
        regions.push(SmallVec::from_slice(&[0, 1, 2]));
    }

    VennData {
        sets: regions
            .iter()
            .map(|members| VennSet {
                sets: ids_of(cohorts, members),
                size: intersect(sets, members).len(),
            })
            .collect(),
    }
}

fn check_invariants(data: &ComparisonData, sets: &[HashSet<&str>]) -> Result<()> {
    let largest = sets.iter().map(HashSet::len).max().unwrap_or(0);
    let smallest = sets.iter().map(HashSet::len).min().unwrap_or(0);
    let sum: usize = sets.iter().map(HashSet::len).sum();

    if data.total_unique_patients < largest || data.total_unique_patients > sum {
        return Err(CohortError::invariant(format!(
            "total_unique_patients {} outside [{}, {}]",
            data.total_unique_patients, largest, sum
        )));
    }
    if data.common_to_all > smallest {
        return Err(CohortError::invariant(format!(
            "common_to_all {} exceeds smallest cohort size {}",
            data.common_to_all, smallest
        )));
    }
    for summary in &data.cohorts {
        if summary.unique_patients > summary.patient_count {
            return Err(CohortError::invariant(format!(
                "cohort {} has {} unique patients but only {} patients",
                summary.id, summary.unique_patients, summary.patient_count
            )));
        }
    }
    for detail in &data.overlaps {
        if detail.count != detail.patient_ids.len() {
            return Err(CohortError::invariant(format!(
                "overlap {:?} count {} disagrees with {} listed patients",
                detail.cohort_ids,
                detail.count,
                detail.patient_ids.len()
            )));
        }
    }
    Ok(())
}
