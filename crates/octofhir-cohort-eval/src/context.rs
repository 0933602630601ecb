//! Evaluation context for filter execution

use indexmap::IndexMap;
use octofhir_cohort_types::{Cohort, ColumnType, Dataset};
use std::collections::{HashMap, HashSet};

/// What a filter needs to know besides the row itself
///
/// Holds the column types used for coercion, the patient id column used by
/// membership rules, and the patient id sets of cohorts those rules may
/// reference. The context is read-only during evaluation and can be shared
/// across threads.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    column_types: IndexMap<String, ColumnType>,
    patient_id_column: Option<String>,
    cohorts: HashMap<String, HashSet<String>>,
}

impl EvaluationContext {
    /// Create an untyped context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from a dataset's schema and patient id column
    pub fn for_dataset(dataset: &Dataset) -> Self {
        Self {
            column_types: dataset.columns.clone(),
            patient_id_column: dataset.patient_id_column.clone(),
            cohorts: HashMap::new(),
        }
    }

    /// Replace the column type map
    pub fn with_column_types(mut self, column_types: IndexMap<String, ColumnType>) -> Self {
        self.column_types = column_types;
        self
    }

    /// Set one column type
    pub fn with_column_type(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.column_types.insert(column.into(), column_type);
        self
    }

    /// Set the patient id column
    pub fn with_patient_id_column(mut self, column: impl Into<String>) -> Self {
        self.patient_id_column = Some(column.into());
        self
    }

    /// Register the members of a cohort for membership rules
    pub fn with_cohort<I, S>(mut self, cohort_id: impl Into<String>, patient_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_cohort(cohort_id, patient_ids);
        self
    }

    /// Register the members of a cohort for membership rules
    pub fn add_cohort<I, S>(&mut self, cohort_id: impl Into<String>, patient_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cohorts
            .insert(cohort_id.into(), patient_ids.into_iter().map(Into::into).collect());
    }

    /// Register a built cohort for membership rules
    pub fn add_cohort_snapshot(&mut self, cohort: &Cohort) {
        self.add_cohort(cohort.id.clone(), cohort.filtered_patient_ids.iter().cloned());
    }

    /// Inferred type of a column; `None` for untyped columns
    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.column_types.get(column).copied()
    }

    pub fn column_types(&self) -> &IndexMap<String, ColumnType> {
        &self.column_types
    }

    pub fn patient_id_column(&self) -> Option<&str> {
        self.patient_id_column.as_deref()
    }

    /// Members of a registered cohort
    pub fn cohort_members(&self, cohort_id: &str) -> Option<&HashSet<String>> {
        self.cohorts.get(cohort_id)
    }

    pub fn has_cohort(&self, cohort_id: &str) -> bool {
        self.cohorts.contains_key(cohort_id)
    }
}
