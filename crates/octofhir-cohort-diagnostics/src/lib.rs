//! Cohort engine diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by the filter
//! evaluator, cohort builder and comparison engine: structured error codes,
//! the `CohortError` taxonomy and diagnostic reporting.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for cohort engine operations
pub type Result<T> = std::result::Result<T, CohortError>;
