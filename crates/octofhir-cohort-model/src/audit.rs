//! Audit events emitted by cohort operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of entity an audit event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Cohort,
    Comparison,
    SavedFilter,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Cohort => write!(f, "cohort"),
            EntityType::Comparison => write!(f, "comparison"),
            EntityType::SavedFilter => write!(f, "saved_filter"),
        }
    }
}

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Compared,
    Used,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Created => write!(f, "created"),
            AuditAction::Updated => write!(f, "updated"),
            AuditAction::Compared => write!(f, "compared"),
            AuditAction::Used => write!(f, "used"),
        }
    }
}

/// One analytics/audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub study_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub action: AuditAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Create an event stamped with the current time
    pub fn new(
        study_id: impl Into<String>,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        action: AuditAction,
    ) -> Self {
        Self {
            study_id: study_id.into(),
            entity_type,
            entity_id: entity_id.into(),
            action,
            previous_value: None,
            new_value: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the state before the change
    pub fn with_previous(mut self, value: Value) -> Self {
        self.previous_value = Some(value);
        self
    }

    /// Attach the state after the change
    pub fn with_new(mut self, value: Value) -> Self {
        self.new_value = Some(value);
        self
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {}",
            self.study_id, self.entity_type, self.entity_id, self.action
        )
    }
}
