//! Cohort engine error types

use crate::{
    COH0101, COH0102, COH0103, COH0104, COH0105, COH0106, COH0107, COH0108, COH0109, COH0200, COH0201,
    COH0202, COH0203, COH0300, COH0301, COH0302, COH0400, COH0401, COH0402, ErrorCode,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - the filter or request cannot be used
    Error,
    /// Warning - potential issue but evaluation can continue
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with the offending filter node and help
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Id of the filter node the diagnostic refers to
    pub node: Option<String>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            node: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            node: None,
            help: None,
        }
    }

    /// Set the filter node
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render with terminal colors
    #[cfg(feature = "colored")]
    pub fn render_colored(&self) -> String {
        use colored::Colorize;

        let severity = match self.severity {
            Severity::Error => self.severity.to_string().red().bold(),
            Severity::Warning => self.severity.to_string().yellow().bold(),
        };
        let mut out = format!("{}[{}]: {}", severity, self.code, self.message);
        if let Some(node) = &self.node {
            out.push_str(&format!("\n  {} node {}", "-->".blue().bold(), node.cyan()));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  {} {}", "help:".green().bold(), help));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(node) = &self.node {
            write!(f, " at node {}", node)?;
        }
        Ok(())
    }
}

/// Main cohort engine error type
#[derive(Debug, Clone, Error)]
pub enum CohortError {
    /// Malformed filter definition or comparison request
    #[error("{code}: {message}")]
    Validation {
        code: ErrorCode,
        message: String,
        node_id: Option<String>,
        field: Option<String>,
        operator: Option<String>,
    },

    /// Dataset does not satisfy the schema a cohort needs
    #[error("{code}: {message}")]
    DataIntegrity {
        code: ErrorCode,
        message: String,
        column: Option<String>,
        row: Option<usize>,
    },

    /// Referenced entity does not resolve
    #[error("{code}: {entity} '{id}' not found")]
    NotFound {
        code: ErrorCode,
        entity: String,
        id: String,
    },

    /// Deadline, cancellation or invariant failure during computation
    #[error("{code}: {message}")]
    Computation { code: ErrorCode, message: String },

    /// Multiple errors collected
    #[error("Multiple errors: {}", .0.len())]
    Multiple(Vec<CohortError>),
}

impl CohortError {
    /// Create a validation error
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        ErrorBuilder::new(code, message).validation()
    }

    /// Create a data integrity error
    pub fn data_integrity(code: ErrorCode, message: impl Into<String>) -> Self {
        ErrorBuilder::new(code, message).data_integrity()
    }

    /// Create a not-found error
    pub fn not_found(code: ErrorCode, entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a computation error
    pub fn computation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Computation {
            code,
            message: message.into(),
        }
    }

    /// Collapse a list of errors: a single error stays as is
    pub fn from_errors(mut errors: Vec<CohortError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Operator name that is not supported
    pub fn unknown_operator(node_id: &str, field: &str, operator: &str) -> Self {
        ErrorBuilder::new(
            COH0101,
            format!("Unknown operator '{}' in rule '{}' on field '{}'", operator, node_id, field),
        )
        .node(node_id)
        .field(field)
        .operator(operator)
        .validation()
    }

    /// Comparison operator without `value`
    pub fn missing_value(node_id: &str, field: &str, operator: &str) -> Self {
        ErrorBuilder::new(
            COH0102,
            format!("Operator '{}' in rule '{}' on field '{}' requires a value", operator, node_id, field),
        )
        .node(node_id)
        .field(field)
        .operator(operator)
        .validation()
    }

    /// Range operator without `value2`
    pub fn missing_upper_bound(node_id: &str, field: &str, operator: &str) -> Self {
        ErrorBuilder::new(
            COH0103,
            format!("Operator '{}' in rule '{}' on field '{}' requires value2", operator, node_id, field),
        )
        .node(node_id)
        .field(field)
        .operator(operator)
        .validation()
    }

    /// Rule with an empty field name
    pub fn empty_field(node_id: &str, operator: &str) -> Self {
        ErrorBuilder::new(COH0104, format!("Rule '{}' has an empty field name", node_id))
            .node(node_id)
            .operator(operator)
            .validation()
    }

    /// Cohort membership rule whose value is not a cohort id
    pub fn invalid_cohort_reference(node_id: &str, field: &str, operator: &str) -> Self {
        ErrorBuilder::new(
            COH0108,
            format!("Operator '{}' in rule '{}' requires a cohort id as its value", operator, node_id),
        )
        .node(node_id)
        .field(field)
        .operator(operator)
        .validation()
    }

    /// Comparison requested with no cohorts
    pub fn empty_comparison() -> Self {
        Self::validation(COH0105, "At least one cohort is required for comparison")
    }

    /// Same cohort requested twice in a comparison
    pub fn duplicate_cohort(cohort_id: &str) -> Self {
        Self::validation(
            COH0106,
            format!("Cohort '{}' appears more than once in the comparison", cohort_id),
        )
    }

    /// Cohort created under an id that is already taken
    pub fn cohort_exists(cohort_id: &str) -> Self {
        Self::validation(COH0109, format!("Cohort '{}' already exists", cohort_id))
    }

    /// Cohort request carrying neither a filter id nor an inline filter
    pub fn missing_filter() -> Self {
        Self::validation(COH0107, "Cohort requires either filter_id or an inline filter")
    }

    /// Dataset has no designated patient id column
    pub fn patient_id_column_not_set() -> Self {
        Self::data_integrity(COH0200, "Dataset has no patient id column")
    }

    /// Designated patient id column is not part of the dataset schema
    pub fn patient_id_column_absent(column: &str) -> Self {
        ErrorBuilder::new(
            COH0201,
            format!("Patient id column '{}' is not present in the dataset", column),
        )
        .field(column)
        .data_integrity()
    }

    /// Row without a value in the patient id column
    pub fn missing_patient_id(column: &str, row: usize) -> Self {
        ErrorBuilder::new(
            COH0202,
            format!("Row {} has no value in patient id column '{}'", row, column),
        )
        .field(column)
        .row(row)
        .data_integrity()
    }

    /// Filter references a column the dataset does not have
    pub fn unknown_column(column: &str, node_id: &str) -> Self {
        ErrorBuilder::new(
            COH0203,
            format!("Rule '{}' references column '{}' which is not in the dataset", node_id, column),
        )
        .field(column)
        .data_integrity()
    }

    /// Dataset lookup failed
    pub fn dataset_not_found(id: &str) -> Self {
        Self::not_found(COH0300, "Dataset", id)
    }

    /// Saved filter lookup failed
    pub fn filter_not_found(id: &str) -> Self {
        Self::not_found(COH0301, "Filter", id)
    }

    /// Cohort lookup failed
    pub fn cohort_not_found(id: &str) -> Self {
        Self::not_found(COH0302, "Cohort", id)
    }

    /// Work ran past its deadline
    pub fn deadline_exceeded(deadline_ms: u64) -> Self {
        Self::computation(COH0400, format!("Deadline of {} ms exceeded", deadline_ms))
    }

    /// Work was cancelled by the caller
    pub fn cancelled() -> Self {
        Self::computation(COH0401, "Computation cancelled")
    }

    /// An internal invariant did not hold
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::computation(COH0402, message)
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::DataIntegrity { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Computation { code, .. } => *code,
            Self::Multiple(errors) => errors.first().map(|e| e.code()).unwrap_or(ErrorCode::new(0)),
        }
    }

    /// Check if this is (or starts with) a validation error
    pub fn is_validation(&self) -> bool {
        self.code().is_validation_error()
    }

    /// Check if this is (or starts with) a data integrity error
    pub fn is_data_integrity(&self) -> bool {
        self.code().is_data_integrity_error()
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        self.code().is_not_found_error()
    }

    /// Check if this is a computation error
    pub fn is_computation(&self) -> bool {
        self.code().is_computation_error()
    }

    /// Filter node the error refers to, if any
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::Validation { node_id, .. } => node_id.as_deref(),
            _ => None,
        }
    }

    /// All leaf errors, with `Multiple` flattened
    pub fn errors(&self) -> Vec<&CohortError> {
        match self {
            Self::Multiple(errors) => errors.iter().flat_map(|e| e.errors()).collect(),
            other => vec![other],
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = match self {
            Self::Multiple(errors) => {
                return match errors.first() {
                    Some(first) => first.to_diagnostic(),
                    None => Diagnostic::error(ErrorCode::new(0), "Unknown error"),
                };
            }
            Self::Validation { message, .. }
            | Self::DataIntegrity { message, .. }
            | Self::Computation { message, .. } => message.clone(),
            Self::NotFound { entity, id, .. } => format!("{} '{}' not found", entity, id),
        };

        let mut diag = Diagnostic::error(self.code(), message);
        if let Some(node) = self.node_id() {
            diag = diag.with_node(node);
        }
        if let Some(help) = self.code().info().help {
            diag = diag.with_help(help);
        }
        diag
    }

    /// Convert every leaf error to a diagnostic
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        self.errors().into_iter().map(|e| e.to_diagnostic()).collect()
    }
}

/// Builder for creating cohort errors with fluent API
pub struct ErrorBuilder {
    code: ErrorCode,
    message: String,
    node_id: Option<String>,
    field: Option<String>,
    operator: Option<String>,
    row: Option<usize>,
}

impl ErrorBuilder {
    /// Create a new error builder
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            node_id: None,
            field: None,
            operator: None,
            row: None,
        }
    }

    /// Set the filter node id
    pub fn node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Set the field (or column) name
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the operator name
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Set the dataset row index
    pub fn row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    /// Build a validation error
    pub fn validation(self) -> CohortError {
        CohortError::Validation {
            code: self.code,
            message: self.message,
            node_id: self.node_id,
            field: self.field,
            operator: self.operator,
        }
    }

    /// Build a data integrity error
    pub fn data_integrity(self) -> CohortError {
        CohortError::DataIntegrity {
            code: self.code,
            message: self.message,
            column: self.field,
            row: self.row,
        }
    }
}
