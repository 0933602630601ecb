//! Patient screening filters and cohort comparison for Rust
//!
//! This crate bundles the cohort engine:
//! - Column type inference over uploaded datasets
//! - Recursive AND/OR/NOT screening filters over dataset rows
//! - Chunked, optionally parallel cohort builds with deadlines
//! - Set comparison of cohorts with a TTL-bound result cache
//! - Repository contracts and in-memory stores
//!
//! # Example
//!
//! ```ignore
//! use octofhir_cohort::{CohortBuilder, CohortDraft, Dataset, EvaluationContext, FilterGroup};
//!
//! let dataset = Dataset::from_rows("visits", rows).with_patient_id_column("patient_id");
//! let filter: FilterGroup = serde_json::from_str(filter_json)?;
//! let ctx = EvaluationContext::for_dataset(&dataset);
//! let cohort = CohortBuilder::default().build(CohortDraft::new("c1", "study", "Adults"), &dataset, &filter, ctx)?;
//! ```

// Re-export all public APIs from internal crates
pub use octofhir_cohort_diagnostics as diagnostics;
pub use octofhir_cohort_eval as eval;
pub use octofhir_cohort_model as model;
pub use octofhir_cohort_types as types;

// Convenience re-exports
pub use octofhir_cohort_diagnostics::{CohortError, Result};
pub use octofhir_cohort_eval::{
    CohortBuilder, CohortDraft, CohortService, ComparisonCache, ComparisonEngine, EngineConfig, EvaluationContext,
    FilterEvaluator,
};
pub use octofhir_cohort_types::{Cohort, ComparisonResult, Dataset, FilterGroup, FilterNode, FilterRule, Operator};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
