//! Structure change request domain model.
//!
//! A change request proposes a modification of the organization
//! structure and moves through a fixed review lifecycle. See
//! [`crate::transition`] for the legal moves.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrgError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeRequestStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Canceled,
    Implemented,
}

impl ChangeRequestStatus {
    pub const ALL: [ChangeRequestStatus; 7] = [
        ChangeRequestStatus::Draft,
        ChangeRequestStatus::Submitted,
        ChangeRequestStatus::UnderReview,
        ChangeRequestStatus::Approved,
        ChangeRequestStatus::Rejected,
        ChangeRequestStatus::Canceled,
        ChangeRequestStatus::Implemented,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeRequestStatus::Draft => "DRAFT",
            ChangeRequestStatus::Submitted => "SUBMITTED",
            ChangeRequestStatus::UnderReview => "UNDER_REVIEW",
            ChangeRequestStatus::Approved => "APPROVED",
            ChangeRequestStatus::Rejected => "REJECTED",
            ChangeRequestStatus::Canceled => "CANCELED",
            ChangeRequestStatus::Implemented => "IMPLEMENTED",
        }
    }
}

impl fmt::Display for ChangeRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeRequestStatus {
    type Err = OrgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChangeRequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrgError::validation(format!("unknown change request status: {s}")))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeRequestType {
    CreateDepartment,
    UpdateDepartment,
    DeactivateDepartment,
    CreatePosition,
    UpdatePosition,
    MovePosition,
    DeactivatePosition,
    Other,
}

impl ChangeRequestType {
    pub const ALL: [ChangeRequestType; 8] = [
        ChangeRequestType::CreateDepartment,
        ChangeRequestType::UpdateDepartment,
        ChangeRequestType::DeactivateDepartment,
        ChangeRequestType::CreatePosition,
        ChangeRequestType::UpdatePosition,
        ChangeRequestType::MovePosition,
        ChangeRequestType::DeactivatePosition,
        ChangeRequestType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeRequestType::CreateDepartment => "CREATE_DEPARTMENT",
            ChangeRequestType::UpdateDepartment => "UPDATE_DEPARTMENT",
            ChangeRequestType::DeactivateDepartment => "DEACTIVATE_DEPARTMENT",
            ChangeRequestType::CreatePosition => "CREATE_POSITION",
            ChangeRequestType::UpdatePosition => "UPDATE_POSITION",
            ChangeRequestType::MovePosition => "MOVE_POSITION",
            ChangeRequestType::DeactivatePosition => "DEACTIVATE_POSITION",
            ChangeRequestType::Other => "OTHER",
        }
    }
}

impl fmt::Display for ChangeRequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeRequestType {
    type Err = OrgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChangeRequestType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| OrgError::validation(format!("unknown change request type: {s}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureChangeRequest {
    pub id: Uuid,
    /// Caller-supplied, expected to be unique (e.g., `CR-2024-001`).
    pub request_number: String,
    pub requested_by_employee_id: Uuid,
    pub request_type: ChangeRequestType,
    pub target_department_id: Option<Uuid>,
    pub target_position_id: Option<Uuid>,
    pub details: Option<String>,
    pub reason: Option<String>,
    pub status: ChangeRequestStatus,
    /// Populated on submission only.
    pub submitted_by_employee_id: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChangeRequest {
    pub request_number: String,
    pub requested_by_employee_id: Uuid,
    pub request_type: ChangeRequestType,
    pub target_department_id: Option<Uuid>,
    pub target_position_id: Option<Uuid>,
    pub details: Option<String>,
    pub reason: Option<String>,
}

/// Status write applied by the repository in a single statement.
///
/// Submission stamps the submitter fields together with the status;
/// every other transition leaves them untouched (`None`).
#[derive(Debug, Clone)]
pub struct ChangeRequestStatusUpdate {
    pub status: ChangeRequestStatus,
    pub submitted_by_employee_id: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ChangeRequestStatusUpdate {
    pub fn to(status: ChangeRequestStatus) -> Self {
        Self {
            status,
            submitted_by_employee_id: None,
            submitted_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in ChangeRequestStatus::ALL {
            assert_eq!(status.as_str().parse::<ChangeRequestStatus>().unwrap(), status);
        }
    }

    #[test]
    fn status_serializes_screaming_snake_case() {
        let json = serde_json::to_value(ChangeRequestStatus::UnderReview).unwrap();
        assert_eq!(json, serde_json::json!("UNDER_REVIEW"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!("RENAME_COMPANY".parse::<ChangeRequestType>().is_err());
        assert_eq!(
            "MOVE_POSITION".parse::<ChangeRequestType>().unwrap(),
            ChangeRequestType::MovePosition
        );
    }
}
