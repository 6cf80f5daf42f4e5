//! Wiring test: every service in [`Services`] shares one database.

use orgflow_core::TransitionTable;
use orgflow_core::models::approval::ApprovalDecision;
use orgflow_core::models::change_log::AuditEntityType;
use orgflow_core::models::change_request::{
    ChangeRequestStatus, ChangeRequestType, CreateChangeRequest,
};
use orgflow_core::models::department::CreateDepartment;
use orgflow_core::repository::{ChangeLogFilter, Pagination};
use orgflow_server::Services;
use orgflow_workflow::{DecisionInput, WorkflowConfig};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Services<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgflow_db::run_migrations(&db).await.unwrap();
    Services::new(db, WorkflowConfig::default(), TransitionTable::default())
}

#[tokio::test]
async fn services_share_one_change_log() {
    let services = setup().await;
    let requester = Uuid::new_v4();

    let cr = services
        .change_requests
        .create(CreateChangeRequest {
            request_number: "CR-1".into(),
            requested_by_employee_id: requester,
            request_type: ChangeRequestType::CreateDepartment,
            target_department_id: None,
            target_position_id: None,
            details: Some("Create Platform".into()),
            reason: None,
        })
        .await
        .unwrap();
    let cr = services.change_requests.submit(cr.id, requester, None).await.unwrap();
    assert_eq!(cr.status, ChangeRequestStatus::Submitted);

    services
        .approvals
        .record_decision(DecisionInput {
            change_request_id: cr.id,
            approver_employee_id: Uuid::new_v4(),
            decision: ApprovalDecision::Approve,
            decided_at: None,
            comments: None,
        })
        .await
        .unwrap();
    assert_eq!(services.approvals.tally(cr.id).await.unwrap().approve, 1);

    let platform = services
        .structure
        .create_department(
            CreateDepartment {
                code: "PLT".into(),
                name: "Platform".into(),
                description: None,
                head_position_id: None,
            },
            Some(requester),
        )
        .await
        .unwrap();

    // All three services append to the same trail.
    let trail = services
        .structure
        .audit()
        .list(ChangeLogFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(trail.total, 4);
    let department_entries = services
        .change_requests
        .audit()
        .history_of(AuditEntityType::Department, platform.id)
        .await
        .unwrap();
    assert_eq!(department_entries.len(), 1);
}
