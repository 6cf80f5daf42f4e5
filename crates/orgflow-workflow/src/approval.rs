//! Approval ledger.
//!
//! Decisions are recorded independently of the request's status. Nothing
//! here moves a request; collaborators read [`ApprovalLedger::tally`] and
//! call the state machine themselves.

use chrono::{DateTime, Utc};
use orgflow_core::error::OrgResult;
use orgflow_core::models::approval::{
    ApprovalDecision, DecisionTally, RecordDecision, StructureApproval,
};
use orgflow_core::models::change_log::AuditEntityType;
use orgflow_core::repository::{ApprovalRepository, ChangeLogRepository, ChangeRequestRepository};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::audit::{AuditContext, AuditTrail};

/// Input for [`ApprovalLedger::record_decision`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionInput {
    pub change_request_id: Uuid,
    pub approver_employee_id: Uuid,
    pub decision: ApprovalDecision,
    /// Defaults to now.
    pub decided_at: Option<DateTime<Utc>>,
    pub comments: Option<String>,
}

pub struct ApprovalLedger<R, A, L>
where
    R: ChangeRequestRepository,
    A: ApprovalRepository,
    L: ChangeLogRepository,
{
    requests: R,
    approvals: A,
    audit: AuditTrail<L>,
}

impl<R, A, L> ApprovalLedger<R, A, L>
where
    R: ChangeRequestRepository,
    A: ApprovalRepository,
    L: ChangeLogRepository,
{
    pub fn new(requests: R, approvals: A, change_log: L) -> Self {
        Self {
            requests,
            approvals,
            audit: AuditTrail::new(change_log),
        }
    }

    /// Record or replace an approver's decision on a request.
    ///
    /// One record exists per (request, approver); a second call
    /// overwrites the first.
    pub async fn record_decision(&self, input: DecisionInput) -> OrgResult<StructureApproval> {
        let request = self.requests.get_by_id(input.change_request_id).await?;

        let mut replaced = false;
        let decision = RecordDecision {
            change_request_id: input.change_request_id,
            approver_employee_id: input.approver_employee_id,
            decision: input.decision,
            decided_at: input.decided_at.unwrap_or_else(Utc::now),
            comments: input.comments,
        };
        let approval = self
            .approvals
            .upsert(decision, |before, after| {
                replaced = before.is_some();
                let summary = format!(
                    "Decision {} recorded on change request {}",
                    after.decision, request.request_number
                );
                self.audit.updated(
                    AuditContext {
                        entity_type: AuditEntityType::StructureApproval,
                        entity_id: after.id,
                        performed_by: Some(after.approver_employee_id),
                        summary: &summary,
                    },
                    before,
                    after,
                )
            })
            .await?;

        info!(
            approval_id = %approval.id,
            change_request_id = %approval.change_request_id,
            decision = %approval.decision,
            replaced,
            "Approval decision recorded"
        );
        Ok(approval)
    }

    /// Current decisions on a request, ordered by `decided_at`.
    pub async fn decisions(&self, change_request_id: Uuid) -> OrgResult<Vec<StructureApproval>> {
        self.requests.get_by_id(change_request_id).await?;
        self.approvals.list_by_request(change_request_id).await
    }

    pub async fn tally(&self, change_request_id: Uuid) -> OrgResult<DecisionTally> {
        let decisions = self.decisions(change_request_id).await?;
        Ok(DecisionTally::from_approvals(&decisions))
    }
}
