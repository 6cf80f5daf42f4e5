//! orgflow server wiring.
//!
//! [`Services`] builds the workflow services over one SurrealDB client.
//! The binary holds it for the lifetime of the process; an embedding
//! application hands its fields to its own request handlers.

use orgflow_core::TransitionTable;
use orgflow_db::repository::{
    SurrealApprovalRepository, SurrealChangeLogRepository, SurrealChangeRequestRepository,
    SurrealDepartmentRepository, SurrealPositionAssignmentRepository, SurrealPositionRepository,
};
use orgflow_workflow::{
    ApprovalLedger, ChangeRequestService, OrgStructureService, WorkflowConfig,
};
use surrealdb::{Connection, Surreal};

pub type StructureService<C> = OrgStructureService<
    SurrealDepartmentRepository<C>,
    SurrealPositionRepository<C>,
    SurrealPositionAssignmentRepository<C>,
    SurrealChangeLogRepository<C>,
>;

pub type ChangeRequests<C> =
    ChangeRequestService<SurrealChangeRequestRepository<C>, SurrealChangeLogRepository<C>>;

pub type Approvals<C> = ApprovalLedger<
    SurrealChangeRequestRepository<C>,
    SurrealApprovalRepository<C>,
    SurrealChangeLogRepository<C>,
>;

/// Every workflow service, backed by the same database.
pub struct Services<C: Connection> {
    pub structure: StructureService<C>,
    pub change_requests: ChangeRequests<C>,
    pub approvals: Approvals<C>,
}

impl<C: Connection> Services<C> {
    /// `db` must already be migrated.
    pub fn new(db: Surreal<C>, config: WorkflowConfig, transitions: TransitionTable) -> Self {
        Self {
            structure: OrgStructureService::new(
                SurrealDepartmentRepository::new(db.clone()),
                SurrealPositionRepository::new(db.clone()),
                SurrealPositionAssignmentRepository::new(db.clone()),
                SurrealChangeLogRepository::new(db.clone()),
                config,
            ),
            change_requests: ChangeRequestService::with_transitions(
                SurrealChangeRequestRepository::new(db.clone()),
                SurrealChangeLogRepository::new(db.clone()),
                transitions,
            ),
            approvals: ApprovalLedger::new(
                SurrealChangeRequestRepository::new(db.clone()),
                SurrealApprovalRepository::new(db.clone()),
                SurrealChangeLogRepository::new(db),
            ),
        }
    }
}
