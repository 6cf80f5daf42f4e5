//! Change log domain model (append-only audit trail).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrgError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeAction {
    Created,
    Updated,
    Deactivated,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Created => "CREATED",
            ChangeAction::Updated => "UPDATED",
            ChangeAction::Deactivated => "DEACTIVATED",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeAction {
    type Err = OrgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(ChangeAction::Created),
            "UPDATED" => Ok(ChangeAction::Updated),
            "DEACTIVATED" => Ok(ChangeAction::Deactivated),
            other => Err(OrgError::validation(format!("unknown change action: {other}"))),
        }
    }
}

/// Tag naming the kind of entity a change-log entry refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AuditEntityType {
    Department,
    Position,
    StructureChangeRequest,
    StructureApproval,
}

impl AuditEntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEntityType::Department => "Department",
            AuditEntityType::Position => "Position",
            AuditEntityType::StructureChangeRequest => "StructureChangeRequest",
            AuditEntityType::StructureApproval => "StructureApproval",
        }
    }
}

impl fmt::Display for AuditEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditEntityType {
    type Err = OrgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Department" => Ok(AuditEntityType::Department),
            "Position" => Ok(AuditEntityType::Position),
            "StructureChangeRequest" => Ok(AuditEntityType::StructureChangeRequest),
            "StructureApproval" => Ok(AuditEntityType::StructureApproval),
            other => Err(OrgError::validation(format!("unknown entity type: {other}"))),
        }
    }
}

/// An immutable record of one mutation.
///
/// Snapshots are plain JSON copies of the entity taken at call time, so
/// later writes to the live entity never alter history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeLogEntry {
    /// Time-ordered (UUIDv7); sorts in insertion order.
    pub id: Uuid,
    pub action: ChangeAction,
    pub entity_type: AuditEntityType,
    pub entity_id: Uuid,
    pub performed_by_employee_id: Option<Uuid>,
    pub before_snapshot: Option<serde_json::Value>,
    pub after_snapshot: Option<serde_json::Value>,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChangeLogEntry {
    pub action: ChangeAction,
    pub entity_type: AuditEntityType,
    pub entity_id: Uuid,
    pub performed_by_employee_id: Option<Uuid>,
    pub before_snapshot: Option<serde_json::Value>,
    pub after_snapshot: Option<serde_json::Value>,
    pub summary: String,
}
