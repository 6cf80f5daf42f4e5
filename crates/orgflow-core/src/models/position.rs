//! Position domain model.
//!
//! Positions belong to exactly one department and may report to another
//! position, forming a reporting tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    /// Owning department. Always resolves at write time.
    pub department_id: Uuid,
    pub reports_to_position_id: Option<Uuid>,
    pub is_active: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePosition {
    pub code: String,
    pub title: String,
    pub department_id: Uuid,
    pub description: Option<String>,
    pub reports_to_position_id: Option<Uuid>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePosition {
    pub title: Option<String>,
    pub description: Option<String>,
    pub department_id: Option<Uuid>,
    pub reports_to_position_id: Option<Uuid>,
    pub is_active: Option<bool>,
}
