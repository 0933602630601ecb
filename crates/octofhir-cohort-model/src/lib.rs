//! Cohort engine storage abstraction
//!
//! This crate provides:
//! - Repository traits for datasets, saved filters and cohorts
//! - The analytics recorder trait and audit event type
//! - In-memory implementations used by tests and the CLI

pub mod audit;
pub mod memory;
pub mod repository;

pub use audit::*;
pub use memory::*;
pub use repository::*;
