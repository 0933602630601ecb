//! Operator integration tests for filter evaluation
//!
//! These tests verify operator behavior including:
//! - Type-aware coercion driven by inferred column types
//! - Null and missing-field handling
//! - Inclusive range bounds
//! - Group logic, empty groups and negation

mod comparison;
mod datetime;
mod logical;
mod membership;
mod string;
