//! Cohort engine error codes following a structured numbering system
//!
//! Error code ranges:
//! - COH0100-COH0199: Validation errors (malformed filters, bad requests)
//! - COH0200-COH0299: Data integrity errors (dataset schema, patient ids)
//! - COH0300-COH0399: Not found errors (repository lookups)
//! - COH0400-COH0499: Computation errors (deadlines, invariants)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a validation error (0100-0199)
    pub const fn is_validation_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a data integrity error (0200-0299)
    pub const fn is_data_integrity_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a not-found error (0300-0399)
    pub const fn is_not_found_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Check if this is a computation error (0400-0499)
    pub const fn is_computation_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "COH{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Validation errors (0100-0199)
    map.insert(100, ErrorInfo::new("Malformed filter"));
    map.insert(
        101,
        ErrorInfo::new("Unknown operator").with_help(
            "Supported operators: equals, not_equals, contains, gt, gte, lt, lte, between, \
             is_empty, is_not_empty, in_cohort, not_in_cohort, on_date, before, after, \
             on_or_before, on_or_after, between_dates",
        ),
    );
    map.insert(102, ErrorInfo::new("Missing rule value"));
    map.insert(
        103,
        ErrorInfo::new("Missing upper bound").with_help("Range operators require both value and value2"),
    );
    map.insert(104, ErrorInfo::new("Empty field name"));
    map.insert(
        105,
        ErrorInfo::new("Empty comparison request").with_help("Select at least one cohort to compare"),
    );
    map.insert(106, ErrorInfo::new("Duplicate cohort in comparison"));
    map.insert(
        107,
        ErrorInfo::new("Missing filter definition")
            .with_help("Provide either an inline filter or a saved filter id"),
    );
    map.insert(108, ErrorInfo::new("Invalid cohort reference"));
    map.insert(
        109,
        ErrorInfo::new("Cohort id already exists").with_help("Choose another id or update the existing cohort"),
    );

    // Data integrity errors (0200-0299)
    map.insert(
        200,
        ErrorInfo::new("Patient id column not set")
            .with_help("Designate the dataset's patient identifier column before building cohorts"),
    );
    map.insert(201, ErrorInfo::new("Patient id column absent from dataset"));
    map.insert(202, ErrorInfo::new("Missing patient id in row"));
    map.insert(203, ErrorInfo::new("Unknown column"));

    // Not found errors (0300-0399)
    map.insert(300, ErrorInfo::new("Dataset not found"));
    map.insert(301, ErrorInfo::new("Saved filter not found"));
    map.insert(302, ErrorInfo::new("Cohort not found"));

    // Computation errors (0400-0499)
    map.insert(400, ErrorInfo::new("Deadline exceeded"));
    map.insert(401, ErrorInfo::new("Computation cancelled"));
    map.insert(402, ErrorInfo::new("Internal invariant violated"));

    map
});

// Validation errors
pub const COH0100: ErrorCode = ErrorCode::new(100);
pub const COH0101: ErrorCode = ErrorCode::new(101);
pub const COH0102: ErrorCode = ErrorCode::new(102);
pub const COH0103: ErrorCode = ErrorCode::new(103);
pub const COH0104: ErrorCode = ErrorCode::new(104);
pub const COH0105: ErrorCode = ErrorCode::new(105);
pub const COH0106: ErrorCode = ErrorCode::new(106);
pub const COH0107: ErrorCode = ErrorCode::new(107);
pub const COH0108: ErrorCode = ErrorCode::new(108);
pub const COH0109: ErrorCode = ErrorCode::new(109);

// Data integrity errors
pub const COH0200: ErrorCode = ErrorCode::new(200);
pub const COH0201: ErrorCode = ErrorCode::new(201);
pub const COH0202: ErrorCode = ErrorCode::new(202);
pub const COH0203: ErrorCode = ErrorCode::new(203);

// Not found errors
pub const COH0300: ErrorCode = ErrorCode::new(300);
pub const COH0301: ErrorCode = ErrorCode::new(301);
pub const COH0302: ErrorCode = ErrorCode::new(302);

// Computation errors
pub const COH0400: ErrorCode = ErrorCode::new(400);
pub const COH0401: ErrorCode = ErrorCode::new(401);
pub const COH0402: ErrorCode = ErrorCode::new(402);
