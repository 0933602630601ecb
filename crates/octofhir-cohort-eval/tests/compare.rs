//! Cohort comparison tests
//!
//! Covers the set algebra, degenerate requests, overlap and Venn shapes,
//! idempotence, TTL stamping, deadlines and the comparison cache.

use chrono::{Duration, TimeZone, Utc};
use octofhir_cohort_diagnostics::COH0400;
use octofhir_cohort_eval::{ComparisonCache, ComparisonEngine, EngineConfig};
use octofhir_cohort_types::{Cohort, VennSet};
use pretty_assertions::assert_eq;
use smallvec::smallvec;

// ===== Test Helpers =====

fn cohort(id: &str, ids: &[&str]) -> Cohort {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Cohort {
        id: id.to_string(),
        study_id: "study-1".to_string(),
        name: format!("Cohort {}", id),
        description: None,
        master_data_id: "ds".to_string(),
        filter_id: Some("f".to_string()),
        filter: None,
        filtered_patient_ids: ids.iter().map(|s| s.to_string()).collect(),
        patient_count: ids.len(),
        matched_row_count: ids.len(),
        master_data_patient_count: 10,
        created_at: at,
        updated_at: at,
    }
}

fn engine() -> ComparisonEngine {
    ComparisonEngine::default()
}

// ===== Set Algebra =====

#[test]
fn test_scenario_b() {
    let a = cohort("A", &["P1", "P2", "P3"]);
    let b = cohort("B", &["P2", "P3", "P4"]);

    let data = engine().compute(&[a, b]).unwrap();
    assert_eq!(data.total_unique_patients, 4);
    assert_eq!(data.common_to_all, 2);
    assert_eq!(data.cohorts[0].unique_patients, 1);
    assert_eq!(data.cohorts[1].unique_patients, 1);
    assert_eq!(data.cohorts[0].overlap_with_others, 2);
    assert_eq!(data.cohorts[1].overlap_with_others, 2);

    assert_eq!(data.overlaps.len(), 1);
    assert_eq!(data.overlaps[0].patient_ids, vec!["P2", "P3"]);
    assert_eq!(data.overlaps[0].count, 2);
}

#[test]
fn test_three_way_overlaps() {
    let a = cohort("A", &["P1", "P2", "P3", "P5"]);
    let b = cohort("B", &["P2", "P3", "P4"]);
    let c = cohort("C", &["P3", "P5", "P6"]);

    let data = engine().compute(&[a, b, c]).unwrap();
    assert_eq!(data.total_unique_patients, 6);
    assert_eq!(data.common_to_all, 1);

    let pairs: Vec<(Vec<String>, usize)> = data
        .overlaps
        .iter()
        .map(|o| (o.cohort_ids.to_vec(), o.count))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (vec!["A".to_string(), "B".to_string()], 2),
            (vec!["A".to_string(), "C".to_string()], 2),
            (vec!["B".to_string(), "C".to_string()], 1),
            (vec!["A".to_string(), "B".to_string(), "C".to_string()], 1),
        ]
    );

    // P1 only in A, P4 only in B, P6 only in C
    let unique: Vec<usize> = data.cohorts.iter().map(|c| c.unique_patients).collect();
    assert_eq!(unique, vec![1, 1, 1]);
}

#[test]
fn test_single_cohort() {
    let data = engine().compute(&[cohort("A", &["P1", "P2"])]).unwrap();
    assert_eq!(data.total_unique_patients, 2);
    assert_eq!(data.common_to_all, 2);
    assert_eq!(data.cohorts[0].unique_patients, 2);
    assert!(data.overlaps.is_empty());
    assert!(data.venn_data.is_none());
}

#[test]
fn test_disjoint_and_empty_cohorts() {
    let data = engine()
        .compute(&[cohort("A", &["P1"]), cohort("B", &[]), cohort("C", &["P2"])])
        .unwrap();
    assert_eq!(data.total_unique_patients, 2);
    assert_eq!(data.common_to_all, 0);
    assert!(data.overlaps.iter().all(|o| o.count == 0));
}

#[test]
fn test_duplicate_ids_within_a_cohort_count_once() {
    let data = engine()
        .compute(&[cohort("A", &["P1", "P1", "P2"]), cohort("B", &["P2"])])
        .unwrap();
    assert_eq!(data.cohorts[0].patient_count, 2);
    assert_eq!(data.total_unique_patients, 2);
}

// ===== Degenerate Requests =====

#[test]
fn test_scenario_d_empty_comparison() {
    let err = engine().compute(&[]).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_duplicate_cohort_in_request() {
    let a = cohort("A", &["P1"]);
    let err = engine().compute(&[a.clone(), a]).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("A"));
}

// ===== Venn Data =====

#[test]
fn test_venn_for_two_cohorts() {
    let data = engine()
        .compute(&[cohort("A", &["P1", "P2", "P3"]), cohort("B", &["P2", "P3", "P4"])])
        .unwrap();
    let venn = data.venn_data.unwrap();
    assert_eq!(
        venn.sets,
        vec![
            VennSet { sets: smallvec!["A".to_string()], size: 3 },
            VennSet { sets: smallvec!["B".to_string()], size: 3 },
            VennSet { sets: smallvec!["A".to_string(), "B".to_string()], size: 2 },
        ]
    );
}

#[test]
fn test_venn_for_three_cohorts_has_seven_regions() {
    let data = engine()
        .compute(&[cohort("A", &["P1"]), cohort("B", &["P1"]), cohort("C", &["P1"])])
        .unwrap();
    let venn = data.venn_data.unwrap();
    assert_eq!(venn.sets.len(), 7);
    assert!(venn.sets.iter().all(|s| s.size == 1));
}

#[test]
fn test_no_venn_for_four_cohorts() {
    let cohorts: Vec<Cohort> = ["A", "B", "C", "D"].iter().map(|id| cohort(id, &["P1"])).collect();
    assert!(engine().compute(&cohorts).unwrap().venn_data.is_none());
}

// ===== Idempotence and TTL =====

#[test]
fn test_compare_is_idempotent() {
    let cohorts = [
        cohort("A", &["P9", "P1", "P5", "P3"]),
        cohort("B", &["P3", "P9", "P2"]),
        cohort("C", &["P5", "P3", "P7"]),
    ];
    let first = engine().compute(&cohorts).unwrap();
    let second = engine().compute(&cohorts).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_expiry_follows_ttl() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let result = engine()
        .with_ttl(Duration::minutes(5))
        .compare_at(&[cohort("A", &["P1"])], now)
        .unwrap();

    assert_eq!(result.computed_at, now);
    assert_eq!(result.expires_at, now + Duration::minutes(5));
    assert!(result.is_fresh_at(now + Duration::minutes(4)));
    assert!(!result.is_fresh_at(now + Duration::minutes(5)));
}

#[test]
fn test_default_ttl_is_one_hour() {
    assert_eq!(engine().ttl(), Duration::seconds(3600));
}

// ===== Deadline =====

#[test]
fn test_expired_deadline_stops_comparison() {
    let engine = ComparisonEngine::new(&EngineConfig::default().with_deadline_ms(Some(0)));
    let err = engine
        .compare(&[cohort("A", &["P1", "P2"]), cohort("B", &["P2", "P3"])])
        .unwrap_err();
    assert!(err.is_computation());
    assert_eq!(err.code(), COH0400);
}

#[test]
fn test_generous_deadline_allows_comparison() {
    let engine = ComparisonEngine::new(&EngineConfig::default().with_deadline_ms(Some(60_000)));
    let result = engine
        .compare(&[cohort("A", &["P1", "P2"]), cohort("B", &["P2", "P3"])])
        .unwrap();
    assert_eq!(result.data.common_to_all, 1);
}

// ===== Cache =====

#[test]
fn test_cache_serves_fresh_entry_regardless_of_order() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let cache = ComparisonCache::new();
    let result = engine()
        .compare_at(&[cohort("A", &["P1"]), cohort("B", &["P1", "P2"])], now)
        .unwrap();
    cache.insert(result.clone());

    let hit = cache.get_fresh(&["B", "A"], now + Duration::minutes(10));
    assert_eq!(hit, Some(result));
}

#[test]
fn test_cache_skips_expired_entry() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let cache = ComparisonCache::new();
    cache.insert(engine().compare_at(&[cohort("A", &["P1"])], now).unwrap());

    assert!(cache.get_fresh(&["A"], now + Duration::hours(2)).is_none());
    assert_eq!(cache.purge_expired(now + Duration::hours(2)), 1);
    assert!(cache.is_empty());
}

#[test]
fn test_cache_invalidated_by_cohort() {
    let now = Utc::now();
    let cache = ComparisonCache::new();
    cache.insert(engine().compare_at(&[cohort("A", &["P1"]), cohort("B", &["P2"])], now).unwrap());
    cache.insert(engine().compare_at(&[cohort("B", &["P2"]), cohort("C", &["P3"])], now).unwrap());
    cache.insert(engine().compare_at(&[cohort("C", &["P3"])], now).unwrap());

    assert_eq!(cache.invalidate_cohort("B"), 2);
    assert_eq!(cache.len(), 1);
    assert!(cache.get_fresh(&["C"], now).is_some());
}

#[test]
fn test_cache_keeps_ids_with_commas_apart() {
    let now = Utc::now();
    let cache = ComparisonCache::new();
    cache.insert(engine().compare_at(&[cohort("a,b", &["P1"]), cohort("c", &["P1"])], now).unwrap());

    assert!(cache.get_fresh(&["a", "b,c"], now).is_none());
    assert!(cache.get_fresh(&["c", "a,b"], now).is_some());
}
