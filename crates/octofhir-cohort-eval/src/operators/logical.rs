//! Logical combination of filter groups
//!
//! AND is true when every child is true, OR when any child is. An empty AND
//! group is vacuously true and an empty OR group is false. `negate` flips the
//! combined result afterwards.

use crate::engine::FilterEvaluator;
use octofhir_cohort_diagnostics::Result;
use octofhir_cohort_types::{FilterGroup, Logic, Row};

impl FilterEvaluator {
    /// Evaluate a group against a row
    ///
    /// Every rule of the group is validated before any is evaluated. Children
    /// are then evaluated in order; once a child has settled the outcome the
    /// remaining children are skipped.
    pub fn evaluate_group(&self, row: &Row, group: &FilterGroup) -> Result<bool> {
        group.validate()?;
        self.combine_group(row, group)
    }

    pub(crate) fn combine_group(&self, row: &Row, group: &FilterGroup) -> Result<bool> {
        let combined = match group.logic {
            Logic::And => {
                let mut all = true;
                for child in &group.rules {
                    if !self.evaluate_node(row, child)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            Logic::Or => {
                let mut any = false;
                for child in &group.rules {
                    if self.evaluate_node(row, child)? {
                        any = true;
                        break;
                    }
                }
                any
            }
        };

        Ok(apply_negate(combined, group.negate))
    }
}

/// Apply a group's `negate` flag to its combined result
pub fn apply_negate(value: bool, negate: bool) -> bool {
    value != negate
}
