//! Cohort Evaluation Engine
//!
//! This crate turns filter definitions into patient cohorts and compares
//! cohorts with each other:
//!
//! - **Filter evaluation**: every rule operator (comparison, string, date,
//!   cohort membership) and AND/OR/negate group logic
//! - **Cohort building**: chunked, optionally parallel dataset scans with
//!   cancellation and deadlines
//! - **Comparison**: union, intersection, unique and overlap counts, Venn data
//! - **Caching**: TTL-bound comparison cache invalidated on rebuild
//! - **Orchestration**: `CohortService` over pluggable repositories
//!
//! # Example
//!
//! ```ignore
//! use octofhir_cohort_eval::{CohortBuilder, CohortDraft, EngineConfig, EvaluationContext};
//!
//! let builder = CohortBuilder::new(EngineConfig::default());
//! let ctx = EvaluationContext::for_dataset(&dataset);
//! let cohort = builder.build(CohortDraft::new("c1", "study", "Adults"), &dataset, &filter, ctx)?;
//! ```
//!
//! # Empty groups
//!
//! An empty AND group matches every row and an empty OR group matches none;
//! `negate` is applied after combining.

pub mod builder;
pub mod cache;
pub mod compare;
pub mod config;
pub mod context;
pub mod engine;
pub mod operators;
pub mod service;

pub use builder::{CancellationToken, CohortBuilder, CohortDraft, ScanResult};
pub use cache::ComparisonCache;
pub use compare::{ComparisonEngine, check_request};
pub use config::{ConfigError, DEFAULT_CHUNK_SIZE, DEFAULT_COMPARISON_TTL_SECS, EngineConfig};
pub use context::EvaluationContext;
pub use engine::FilterEvaluator;
pub use service::{CohortService, CreateCohortRequest, UpdateCohortRequest};

pub use operators::comparison::{numeric_compare, values_equal};
pub use operators::datetime::date_compare;
