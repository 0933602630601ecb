//! Filter Evaluation Engine
//!
//! This module provides the FilterEvaluator which decides whether a dataset
//! row satisfies a filter tree.

use crate::context::EvaluationContext;
use octofhir_cohort_diagnostics::{CohortError, Result};
use octofhir_cohort_types::{FilterGroup, FilterNode, FilterRule, Operator, Row, cell};
use std::cmp::Ordering;

/// Evaluates filter trees against rows
///
/// Evaluation is pure: the same row, node and context always give the same
/// answer, and nothing is mutated. The evaluator is `Sync` so one instance
/// can serve every worker of a parallel scan.
#[derive(Debug, Clone, Default)]
pub struct FilterEvaluator {
    ctx: EvaluationContext,
}

impl FilterEvaluator {
    /// Create an evaluator over a context
    pub fn new(ctx: EvaluationContext) -> Self {
        Self { ctx }
    }

    /// Get the evaluation context
    pub fn context(&self) -> &EvaluationContext {
        &self.ctx
    }

    /// Evaluate any filter node against a row
    ///
    /// The whole node is validated first, so a malformed rule is reported
    /// even when an earlier sibling already decides the outcome.
    pub fn evaluate(&self, row: &Row, node: &FilterNode) -> Result<bool> {
        match node {
            FilterNode::Rule(rule) => self.evaluate_rule(row, rule),
            FilterNode::Group(group) => self.evaluate_group(row, group),
        }
    }

    /// Evaluate a single rule against a row
    ///
    /// Malformed rules (unknown operator, missing bound, empty field) are
    /// validation errors. A cell that cannot be coerced to what the operator
    /// needs makes the rule false.
    pub fn evaluate_rule(&self, row: &Row, rule: &FilterRule) -> Result<bool> {
        rule.validate()?;
        self.apply_rule(row, rule)
    }

    /// Check a row against a top-level filter
    pub fn matches(&self, row: &Row, filter: &FilterGroup) -> Result<bool> {
        self.evaluate_group(row, filter)
    }

    /// Check a row against a filter that has already passed validation
    pub(crate) fn matches_validated(&self, row: &Row, filter: &FilterGroup) -> Result<bool> {
        self.combine_group(row, filter)
    }

    pub(crate) fn evaluate_node(&self, row: &Row, node: &FilterNode) -> Result<bool> {
        match node {
            FilterNode::Rule(rule) => self.apply_rule(row, rule),
            FilterNode::Group(group) => self.combine_group(row, group),
        }
    }

    fn apply_rule(&self, row: &Row, rule: &FilterRule) -> Result<bool> {
        let value = cell(row, &rule.field);
        let column_type = self.ctx.column_type(&rule.field);

        let matched = match &rule.operator {
            Operator::Equals => self.eval_equals(value, &rule.value, column_type),
            Operator::NotEquals => self.eval_not_equals(value, &rule.value, column_type),
            Operator::Contains => self.eval_contains(value, &rule.value),
            Operator::Gt => self.eval_ordering(value, &rule.value, Ordering::is_gt),
            Operator::Gte => self.eval_ordering(value, &rule.value, Ordering::is_ge),
            Operator::Lt => self.eval_ordering(value, &rule.value, Ordering::is_lt),
            Operator::Lte => self.eval_ordering(value, &rule.value, Ordering::is_le),
            Operator::Between => self.eval_between(value, &rule.value, &rule.value2),
            Operator::IsEmpty => self.eval_is_empty(value),
            Operator::IsNotEmpty => !self.eval_is_empty(value),
            Operator::InCohort => self.eval_in_cohort(row, rule)?,
            Operator::NotInCohort => !self.eval_in_cohort(row, rule)?,
            Operator::OnDate => self.eval_date_ordering(value, &rule.value, Ordering::is_eq),
            Operator::Before => self.eval_date_ordering(value, &rule.value, Ordering::is_lt),
            Operator::After => self.eval_date_ordering(value, &rule.value, Ordering::is_gt),
            Operator::OnOrBefore => self.eval_date_ordering(value, &rule.value, Ordering::is_le),
            Operator::OnOrAfter => self.eval_date_ordering(value, &rule.value, Ordering::is_ge),
            Operator::BetweenDates => self.eval_between_dates(value, &rule.value, &rule.value2),
            Operator::Unknown(name) => {
                return Err(CohortError::unknown_operator(&rule.id, &rule.field, name));
            }
        };

        Ok(matched)
    }
}
