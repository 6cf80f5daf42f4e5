//! Department domain model.
//!
//! Departments are never physically deleted. Deactivation flips
//! `is_active` and cascades to the department's positions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: Uuid,
    /// Human-assigned code (e.g., `ENG`). Uniqueness is enforced by storage.
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Position acting as head of the department.
    pub head_position_id: Option<Uuid>,
    pub is_active: bool,
    /// Incremented on every write; used for compare-and-swap updates.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDepartment {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub head_position_id: Option<Uuid>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub description: Option<String>,
    pub head_position_id: Option<Uuid>,
}
