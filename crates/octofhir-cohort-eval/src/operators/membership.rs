//! Membership Operators for filter rules
//!
//! Implements: in_cohort, not_in_cohort
//! The rule's `value` names the cohort. The patient id is read from the
//! rule's field when one is given, else from the context's patient id column.

use crate::engine::FilterEvaluator;
use octofhir_cohort_diagnostics::{CohortError, Result};
use octofhir_cohort_types::{FilterRule, Row, cell};

impl FilterEvaluator {
    /// Evaluate in_cohort; not_in_cohort is its negation
    ///
    /// A row without a patient id is not a member of any cohort. A cohort
    /// the context does not know is a not-found error.
    pub fn eval_in_cohort(&self, row: &Row, rule: &FilterRule) -> Result<bool> {
        let cohort_id = rule.value.to_text();
        let members = self
            .context()
            .cohort_members(&cohort_id)
            .ok_or_else(|| CohortError::cohort_not_found(&cohort_id))?;

        let id_column = if rule.field.trim().is_empty() {
            self.context()
                .patient_id_column()
                .ok_or_else(CohortError::patient_id_column_not_set)?
        } else {
            rule.field.as_str()
        };

        let patient_id = cell(row, id_column);
        if patient_id.is_empty() {
            return Ok(false);
        }
        Ok(members.contains(patient_id.to_text().as_ref()))
    }
}
