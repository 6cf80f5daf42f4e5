//! Change-request state machine.

use chrono::{DateTime, Utc};
use orgflow_core::error::{OrgError, OrgResult};
use orgflow_core::models::change_log::{AuditEntityType, CreateChangeLogEntry};
use orgflow_core::models::change_request::{
    ChangeRequestStatus, ChangeRequestStatusUpdate, CreateChangeRequest, StructureChangeRequest,
};
use orgflow_core::repository::{
    ChangeLogRepository, ChangeRequestRepository, PaginatedResult, Pagination,
};
use orgflow_core::transition::TransitionTable;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditContext, AuditTrail};
use crate::error::WorkflowError;

/// Drives structure change requests through their lifecycle.
///
/// Transition legality is the only gate: no business checks (such as
/// recorded approvals) are made before a move.
pub struct ChangeRequestService<R: ChangeRequestRepository, L: ChangeLogRepository> {
    requests: R,
    audit: AuditTrail<L>,
    transitions: TransitionTable,
}

impl<R: ChangeRequestRepository, L: ChangeLogRepository> ChangeRequestService<R, L> {
    pub fn new(requests: R, change_log: L) -> Self {
        Self::with_transitions(requests, change_log, TransitionTable::default())
    }

    pub fn with_transitions(requests: R, change_log: L, transitions: TransitionTable) -> Self {
        Self {
            requests,
            audit: AuditTrail::new(change_log),
            transitions,
        }
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn audit(&self) -> &AuditTrail<L> {
        &self.audit
    }

    /// Create a request in `DRAFT`. The requester is recorded as the
    /// performer of the creation.
    pub async fn create(&self, input: CreateChangeRequest) -> OrgResult<StructureChangeRequest> {
        let performed_by = input.requested_by_employee_id;
        let request = self
            .requests
            .create(input, |after| {
                let summary = format!("Change request {} created", after.request_number);
                self.audit.created(
                    AuditContext {
                        entity_type: AuditEntityType::StructureChangeRequest,
                        entity_id: after.id,
                        performed_by: Some(performed_by),
                        summary: &summary,
                    },
                    after,
                )
            })
            .await?;

        info!(
            change_request_id = %request.id,
            request_number = %request.request_number,
            request_type = %request.request_type,
            "Change request created"
        );
        Ok(request)
    }

    /// Submit a draft. Stamps the submitter and submission time together
    /// with the status change.
    pub async fn submit(
        &self,
        id: Uuid,
        submitted_by: Uuid,
        submitted_at: Option<DateTime<Utc>>,
    ) -> OrgResult<StructureChangeRequest> {
        let before = self.requests.get_by_id(id).await?;
        if before.status != ChangeRequestStatus::Draft {
            warn!(change_request_id = %id, status = %before.status, "Submit rejected");
            return Err(WorkflowError::NotDraft {
                status: before.status,
            }
            .into());
        }

        let update = ChangeRequestStatusUpdate {
            status: ChangeRequestStatus::Submitted,
            submitted_by_employee_id: Some(submitted_by),
            submitted_at: Some(submitted_at.unwrap_or_else(Utc::now)),
        };
        let after = self
            .requests
            .update_status(id, before.version, update, |after| {
                let summary = format!("Change request {} submitted", after.request_number);
                self.status_entry(&before, after, Some(submitted_by), &summary)
            })
            .await?;

        info!(change_request_id = %id, submitted_by = %submitted_by, "Change request submitted");
        Ok(after)
    }

    /// Move a request to `new_status` if the transition table allows it.
    ///
    /// Moving to `SUBMITTED` stamps the submitter, so `performed_by` is
    /// required for that target.
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: ChangeRequestStatus,
        performed_by: Option<Uuid>,
        summary: Option<&str>,
    ) -> OrgResult<StructureChangeRequest> {
        let before = self.requests.get_by_id(id).await?;
        if !self.transitions.can_transition(before.status, new_status) {
            warn!(
                change_request_id = %id,
                from = %before.status,
                to = %new_status,
                "Illegal status transition"
            );
            return Err(WorkflowError::IllegalTransition {
                from: before.status,
                to: new_status,
            }
            .into());
        }

        let mut update = ChangeRequestStatusUpdate::to(new_status);
        if new_status == ChangeRequestStatus::Submitted {
            let Some(submitter) = performed_by else {
                return Err(OrgError::validation(
                    "submitting a change request requires the submitting employee",
                ));
            };
            update.submitted_by_employee_id = Some(submitter);
            update.submitted_at = Some(Utc::now());
        }
        let after = self
            .requests
            .update_status(id, before.version, update, |after| {
                let summary = match summary {
                    Some(s) => s.to_string(),
                    None => format!(
                        "Change request {} moved from {} to {}",
                        after.request_number, before.status, after.status
                    ),
                };
                self.status_entry(&before, after, performed_by, &summary)
            })
            .await?;

        info!(
            change_request_id = %id,
            from = %before.status,
            to = %after.status,
            "Change request status updated"
        );
        Ok(after)
    }

    pub async fn get(&self, id: Uuid) -> OrgResult<StructureChangeRequest> {
        self.requests.get_by_id(id).await
    }

    pub async fn get_by_number(&self, request_number: &str) -> OrgResult<StructureChangeRequest> {
        self.requests.get_by_request_number(request_number).await
    }

    pub async fn list(
        &self,
        status: Option<ChangeRequestStatus>,
        pagination: Pagination,
    ) -> OrgResult<PaginatedResult<StructureChangeRequest>> {
        self.requests.list(status, pagination).await
    }

    /// Statuses the request may move to next.
    pub async fn allowed_transitions(&self, id: Uuid) -> OrgResult<Vec<ChangeRequestStatus>> {
        let request = self.requests.get_by_id(id).await?;
        Ok(self.transitions.allowed_from(request.status))
    }

    fn status_entry(
        &self,
        before: &StructureChangeRequest,
        after: &StructureChangeRequest,
        performed_by: Option<Uuid>,
        summary: &str,
    ) -> OrgResult<CreateChangeLogEntry> {
        self.audit.updated(
            AuditContext {
                entity_type: AuditEntityType::StructureChangeRequest,
                entity_id: after.id,
                performed_by,
                summary,
            },
            Some(before),
            after,
        )
    }
}
