//! Integration tests for the approval ledger.

use chrono::{TimeZone, Utc};
use orgflow_core::error::OrgError;
use orgflow_core::models::approval::{ApprovalDecision, DecisionTally};
use orgflow_core::models::change_log::{AuditEntityType, ChangeAction};
use orgflow_core::models::change_request::{
    ChangeRequestStatus, ChangeRequestType, CreateChangeRequest, StructureChangeRequest,
};
use orgflow_db::repository::{
    SurrealApprovalRepository, SurrealChangeLogRepository, SurrealChangeRequestRepository,
};
use orgflow_workflow::{ApprovalLedger, ChangeRequestService, DecisionInput};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Ledger = ApprovalLedger<
    SurrealChangeRequestRepository<Db>,
    SurrealApprovalRepository<Db>,
    SurrealChangeLogRepository<Db>,
>;
type Requests =
    ChangeRequestService<SurrealChangeRequestRepository<Db>, SurrealChangeLogRepository<Db>>;

async fn setup() -> (Ledger, Requests, StructureChangeRequest) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgflow_db::run_migrations(&db).await.unwrap();

    let requests = ChangeRequestService::new(
        SurrealChangeRequestRepository::new(db.clone()),
        SurrealChangeLogRepository::new(db.clone()),
    );
    let ledger = ApprovalLedger::new(
        SurrealChangeRequestRepository::new(db.clone()),
        SurrealApprovalRepository::new(db.clone()),
        SurrealChangeLogRepository::new(db),
    );

    let cr = requests
        .create(CreateChangeRequest {
            request_number: "CR-1".into(),
            requested_by_employee_id: Uuid::new_v4(),
            request_type: ChangeRequestType::MovePosition,
            target_department_id: None,
            target_position_id: Some(Uuid::new_v4()),
            details: None,
            reason: None,
        })
        .await
        .unwrap();

    (ledger, requests, cr)
}

fn decision(request_id: Uuid, approver: Uuid, decision: ApprovalDecision) -> DecisionInput {
    DecisionInput {
        change_request_id: request_id,
        approver_employee_id: approver,
        decision,
        decided_at: None,
        comments: None,
    }
}

#[tokio::test]
async fn record_decision_requires_existing_request() {
    let (ledger, _, _) = setup().await;
    let err = ledger
        .record_decision(decision(
            Uuid::new_v4(),
            Uuid::new_v4(),
            ApprovalDecision::Approve,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::NotFound { .. }));
}

#[tokio::test]
async fn second_decision_overwrites_the_first() {
    let (ledger, _, cr) = setup().await;
    let approver = Uuid::new_v4();

    let first = ledger
        .record_decision(decision(cr.id, approver, ApprovalDecision::Approve))
        .await
        .unwrap();
    let second = ledger
        .record_decision(DecisionInput {
            comments: Some("Budget not confirmed".into()),
            ..decision(cr.id, approver, ApprovalDecision::Reject)
        })
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.decision, ApprovalDecision::Reject);
    assert_eq!(second.comments.as_deref(), Some("Budget not confirmed"));

    let decisions = ledger.decisions(cr.id).await.unwrap();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].decision, ApprovalDecision::Reject);
}

#[tokio::test]
async fn each_decision_is_audited_against_the_approval() {
    let (ledger, requests, cr) = setup().await;
    let approver = Uuid::new_v4();

    let first = ledger
        .record_decision(decision(cr.id, approver, ApprovalDecision::Approve))
        .await
        .unwrap();
    ledger
        .record_decision(decision(cr.id, approver, ApprovalDecision::Abstain))
        .await
        .unwrap();

    let history = requests
        .audit()
        .history_of(AuditEntityType::StructureApproval, first.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|e| e.action == ChangeAction::Updated));
    assert!(history.iter().all(|e| e.performed_by_employee_id == Some(approver)));

    assert!(history[0].before_snapshot.is_none());
    assert_eq!(history[0].after_snapshot.as_ref().unwrap()["decision"], "APPROVE");
    assert_eq!(history[1].before_snapshot.as_ref().unwrap()["decision"], "APPROVE");
    assert_eq!(history[1].after_snapshot.as_ref().unwrap()["decision"], "ABSTAIN");
}

#[tokio::test]
async fn decisions_never_move_the_request() {
    let (ledger, requests, cr) = setup().await;
    for _ in 0..3 {
        ledger
            .record_decision(decision(cr.id, Uuid::new_v4(), ApprovalDecision::Approve))
            .await
            .unwrap();
    }

    let stored = requests.get(cr.id).await.unwrap();
    assert_eq!(stored.status, ChangeRequestStatus::Draft);
    assert_eq!(stored.version, cr.version);
}

#[tokio::test]
async fn tally_counts_current_decisions() {
    let (ledger, _, cr) = setup().await;
    let changed_mind = Uuid::new_v4();

    ledger
        .record_decision(decision(cr.id, changed_mind, ApprovalDecision::Reject))
        .await
        .unwrap();
    ledger
        .record_decision(decision(cr.id, changed_mind, ApprovalDecision::Approve))
        .await
        .unwrap();
    ledger
        .record_decision(decision(cr.id, Uuid::new_v4(), ApprovalDecision::Approve))
        .await
        .unwrap();
    ledger
        .record_decision(decision(cr.id, Uuid::new_v4(), ApprovalDecision::Abstain))
        .await
        .unwrap();

    let tally = ledger.tally(cr.id).await.unwrap();
    assert_eq!(
        tally,
        DecisionTally {
            approve: 2,
            reject: 0,
            abstain: 1,
        }
    );
    assert_eq!(tally.total(), 3);
}

#[tokio::test]
async fn decisions_are_ordered_by_decision_time() {
    let (ledger, _, cr) = setup().await;
    let late = Utc.with_ymd_and_hms(2025, 5, 2, 12, 0, 0).unwrap();
    let early = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();

    ledger
        .record_decision(DecisionInput {
            decided_at: Some(late),
            ..decision(cr.id, Uuid::new_v4(), ApprovalDecision::Reject)
        })
        .await
        .unwrap();
    ledger
        .record_decision(DecisionInput {
            decided_at: Some(early),
            ..decision(cr.id, Uuid::new_v4(), ApprovalDecision::Approve)
        })
        .await
        .unwrap();

    let decided: Vec<_> = ledger
        .decisions(cr.id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.decided_at)
        .collect();
    assert_eq!(decided, vec![early, late]);
}
