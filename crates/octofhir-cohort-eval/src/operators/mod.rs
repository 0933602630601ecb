//! Filter Operator Implementations
//!
//! This module contains implementations for all filter operators organized by category:
//! - Comparison operators (equals, gt, between, etc.)
//! - String operators (contains, is_empty, is_not_empty)
//! - DateTime operators (on_date, before, between_dates, etc.)
//! - Membership operators (in_cohort, not_in_cohort)
//! - Logical combination of groups (AND, OR, negate)

pub mod comparison;
pub mod datetime;
pub mod logical;
pub mod membership;
pub mod string;

pub use comparison::*;
pub use datetime::*;
pub use logical::*;
