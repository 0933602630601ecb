//! Cohort engine type system
//!
//! This crate defines the data model shared by every other crate:
//! - Cell values and rows of an uploaded dataset
//! - Column types and the type inferencer that assigns them
//! - Filter rules and recursive filter groups (the wire grammar)
//! - Cohort snapshots and comparison results

pub mod cohort;
pub mod comparison;
pub mod dataset;
pub mod date;
pub mod filter;
pub mod inference;
pub mod value;

pub use cohort::*;
pub use comparison::*;
pub use dataset::*;
pub use date::{looks_like_date, parse_date};
pub use filter::*;
pub use inference::*;
pub use value::*;
