//! Workflow error types.

use orgflow_core::error::OrgError;
use orgflow_core::models::change_request::ChangeRequestStatus;
use thiserror::Error;
use uuid::Uuid;

const CHANGE_REQUEST: &str = "StructureChangeRequest";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("change request cannot move from {from} to {to}")]
    IllegalTransition {
        from: ChangeRequestStatus,
        to: ChangeRequestStatus,
    },

    #[error("only DRAFT change requests can be submitted (current status: {status})")]
    NotDraft { status: ChangeRequestStatus },

    #[error("position {position_id} cannot report to itself")]
    SelfReporting { position_id: Uuid },

    #[error("position {position_id} reporting to {manager_id} would create a cycle")]
    ReportingCycle { position_id: Uuid, manager_id: Uuid },

    #[error("reporting chain above position {position_id} exceeds {max_depth} levels")]
    ReportingTooDeep { position_id: Uuid, max_depth: usize },
}

impl From<WorkflowError> for OrgError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::IllegalTransition { from, to } => OrgError::IllegalTransition {
                entity: CHANGE_REQUEST.into(),
                from: from.to_string(),
                to: to.to_string(),
            },
            WorkflowError::NotDraft { status } => OrgError::IllegalTransition {
                entity: CHANGE_REQUEST.into(),
                from: status.to_string(),
                to: ChangeRequestStatus::Submitted.to_string(),
            },
            WorkflowError::SelfReporting { .. }
            | WorkflowError::ReportingCycle { .. }
            | WorkflowError::ReportingTooDeep { .. } => OrgError::Validation {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_draft_maps_to_illegal_transition_into_submitted() {
        let err: OrgError = WorkflowError::NotDraft {
            status: ChangeRequestStatus::Submitted,
        }
        .into();
        match err {
            OrgError::IllegalTransition { from, to, .. } => {
                assert_eq!(from, "SUBMITTED");
                assert_eq!(to, "SUBMITTED");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reporting_cycle_is_a_validation_failure() {
        let err: OrgError = WorkflowError::ReportingCycle {
            position_id: Uuid::new_v4(),
            manager_id: Uuid::new_v4(),
        }
        .into();
        assert!(matches!(err, OrgError::Validation { .. }));
    }
}
