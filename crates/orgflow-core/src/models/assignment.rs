//! Position assignment domain model.
//!
//! Assignments are created by collaborators (hiring, transfers); this
//! core only closes them when their position is deactivated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionAssignment {
    pub id: Uuid,
    pub position_id: Uuid,
    pub employee_id: Uuid,
    pub start_date: DateTime<Utc>,
    /// `None` while the assignment is open.
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PositionAssignment {
    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePositionAssignment {
    pub position_id: Uuid,
    pub employee_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}
