//! Integration tests for change-request and approval repositories.

use chrono::{Duration, Utc};
use orgflow_core::error::{OrgError, OrgResult};
use orgflow_core::models::approval::{ApprovalDecision, RecordDecision, StructureApproval};
use orgflow_core::models::change_log::{AuditEntityType, ChangeAction, CreateChangeLogEntry};
use orgflow_core::models::change_request::{
    ChangeRequestStatus, ChangeRequestStatusUpdate, ChangeRequestType, CreateChangeRequest,
    StructureChangeRequest,
};
use orgflow_core::repository::{ApprovalRepository, ChangeRequestRepository, Pagination};
use orgflow_db::repository::{SurrealApprovalRepository, SurrealChangeRequestRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgflow_db::run_migrations(&db).await.unwrap();
    db
}

fn logged(cr: &StructureChangeRequest) -> OrgResult<CreateChangeLogEntry> {
    Ok(CreateChangeLogEntry {
        action: ChangeAction::Updated,
        entity_type: AuditEntityType::StructureChangeRequest,
        entity_id: cr.id,
        performed_by_employee_id: None,
        before_snapshot: None,
        after_snapshot: None,
        summary: format!("{} is {}", cr.request_number, cr.status),
    })
}

fn decision_logged(
    before: Option<&StructureApproval>,
    after: &StructureApproval,
) -> OrgResult<CreateChangeLogEntry> {
    Ok(CreateChangeLogEntry {
        action: ChangeAction::Updated,
        entity_type: AuditEntityType::StructureApproval,
        entity_id: after.id,
        performed_by_employee_id: Some(after.approver_employee_id),
        before_snapshot: None,
        after_snapshot: None,
        summary: format!("replaced={}", before.is_some()),
    })
}

fn new_request(number: &str) -> CreateChangeRequest {
    CreateChangeRequest {
        request_number: number.into(),
        requested_by_employee_id: Uuid::new_v4(),
        request_type: ChangeRequestType::DeactivatePosition,
        target_department_id: None,
        target_position_id: Some(Uuid::new_v4()),
        details: Some("Retire legacy role".into()),
        reason: None,
    }
}

#[tokio::test]
async fn create_persists_draft_with_all_fields() {
    let repo = SurrealChangeRequestRepository::new(setup().await);
    let input = new_request("CR-7");
    let target = input.target_position_id;

    let cr = repo.create(input, logged).await.unwrap();
    assert_eq!(cr.status, ChangeRequestStatus::Draft);
    assert_eq!(cr.request_type, ChangeRequestType::DeactivatePosition);
    assert_eq!(cr.target_position_id, target);
    assert_eq!(cr.version, 1);

    let fetched = repo.get_by_request_number("CR-7").await.unwrap();
    assert_eq!(fetched, cr);
}

#[tokio::test]
async fn update_status_stamps_submission_fields() {
    let repo = SurrealChangeRequestRepository::new(setup().await);
    let cr = repo.create(new_request("CR-1"), logged).await.unwrap();
    let submitter = Uuid::new_v4();
    let at = Utc::now() - Duration::hours(1);

    let submitted = repo
        .update_status(
            cr.id,
            cr.version,
            ChangeRequestStatusUpdate {
                status: ChangeRequestStatus::Submitted,
                submitted_by_employee_id: Some(submitter),
                submitted_at: Some(at),
            },
            logged,
        )
        .await
        .unwrap();
    assert_eq!(submitted.status, ChangeRequestStatus::Submitted);
    assert_eq!(submitted.submitted_by_employee_id, Some(submitter));
    assert_eq!(submitted.submitted_at, Some(at));
    assert_eq!(submitted.version, 2);

    // Later transitions leave the submission stamp alone.
    let reviewing = repo
        .update_status(
            cr.id,
            submitted.version,
            ChangeRequestStatusUpdate::to(ChangeRequestStatus::UnderReview),
            logged,
        )
        .await
        .unwrap();
    assert_eq!(reviewing.submitted_by_employee_id, Some(submitter));
    assert_eq!(reviewing.submitted_at, Some(at));
}

#[tokio::test]
async fn stale_status_update_conflicts() {
    let repo = SurrealChangeRequestRepository::new(setup().await);
    let cr = repo.create(new_request("CR-1"), logged).await.unwrap();

    repo.update_status(
        cr.id,
        cr.version,
        ChangeRequestStatusUpdate::to(ChangeRequestStatus::Canceled),
        logged,
    )
    .await
    .unwrap();
    let err = repo
        .update_status(
            cr.id,
            cr.version,
            ChangeRequestStatusUpdate::to(ChangeRequestStatus::Submitted),
            logged,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::Conflict { .. }));
}

#[tokio::test]
async fn list_filters_by_status() {
    let repo = SurrealChangeRequestRepository::new(setup().await);
    let a = repo.create(new_request("CR-1"), logged).await.unwrap();
    repo.create(new_request("CR-2"), logged).await.unwrap();
    repo.update_status(
        a.id,
        a.version,
        ChangeRequestStatusUpdate::to(ChangeRequestStatus::Canceled),
        logged,
    )
    .await
    .unwrap();

    let drafts = repo
        .list(Some(ChangeRequestStatus::Draft), Pagination::default())
        .await
        .unwrap();
    assert_eq!(drafts.total, 1);
    assert_eq!(drafts.items[0].request_number, "CR-2");
}

#[tokio::test]
async fn approval_upsert_keeps_one_row_per_approver() {
    let db = setup().await;
    let requests = SurrealChangeRequestRepository::new(db.clone());
    let approvals = SurrealApprovalRepository::new(db);
    let cr = requests.create(new_request("CR-1"), logged).await.unwrap();
    let approver = Uuid::new_v4();

    assert!(approvals.find(cr.id, approver).await.unwrap().is_none());

    let first = approvals
        .upsert(
            RecordDecision {
                change_request_id: cr.id,
                approver_employee_id: approver,
                decision: ApprovalDecision::Approve,
                decided_at: Utc::now(),
                comments: None,
            },
            decision_logged,
        )
        .await
        .unwrap();
    let second = approvals
        .upsert(
            RecordDecision {
                change_request_id: cr.id,
                approver_employee_id: approver,
                decision: ApprovalDecision::Reject,
                decided_at: Utc::now(),
                comments: Some("Changed my mind".into()),
            },
            decision_logged,
        )
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let stored = approvals.find(cr.id, approver).await.unwrap().unwrap();
    assert_eq!(stored.decision, ApprovalDecision::Reject);
    assert_eq!(approvals.list_by_request(cr.id).await.unwrap().len(), 1);
}
