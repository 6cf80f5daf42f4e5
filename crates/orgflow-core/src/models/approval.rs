//! Structure approval domain model.
//!
//! One decision per (change request, approver). A repeated decision by
//! the same approver replaces the earlier one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrgError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalDecision {
    Approve,
    Reject,
    Abstain,
}

impl ApprovalDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalDecision::Approve => "APPROVE",
            ApprovalDecision::Reject => "REJECT",
            ApprovalDecision::Abstain => "ABSTAIN",
        }
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalDecision {
    type Err = OrgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVE" => Ok(ApprovalDecision::Approve),
            "REJECT" => Ok(ApprovalDecision::Reject),
            "ABSTAIN" => Ok(ApprovalDecision::Abstain),
            other => Err(OrgError::validation(format!(
                "unknown approval decision: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureApproval {
    pub id: Uuid,
    pub change_request_id: Uuid,
    pub approver_employee_id: Uuid,
    pub decision: ApprovalDecision,
    pub decided_at: DateTime<Utc>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert input keyed on `(change_request_id, approver_employee_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDecision {
    pub change_request_id: Uuid,
    pub approver_employee_id: Uuid,
    pub decision: ApprovalDecision,
    pub decided_at: DateTime<Utc>,
    pub comments: Option<String>,
}

/// Read-only count of current decisions on one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTally {
    pub approve: u64,
    pub reject: u64,
    pub abstain: u64,
}

impl DecisionTally {
    pub fn from_approvals<'a>(approvals: impl IntoIterator<Item = &'a StructureApproval>) -> Self {
        approvals
            .into_iter()
            .fold(Self::default(), |mut tally, approval| {
                match approval.decision {
                    ApprovalDecision::Approve => tally.approve += 1,
                    ApprovalDecision::Reject => tally.reject += 1,
                    ApprovalDecision::Abstain => tally.abstain += 1,
                }
                tally
            })
    }

    pub fn total(&self) -> u64 {
        self.approve + self.reject + self.abstain
    }
}
