//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Updates of versioned entities
//! take the version the caller last observed and fail with
//! [`OrgError::Conflict`](crate::error::OrgError::Conflict) if the stored
//! record has moved on.
//!
//! Mutating operations take an `audit` callback. It is handed the record
//! as written and returns the change-log entry to store with it; the
//! write, its cascade and the entry commit or fail together.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::OrgResult;
use crate::models::{
    approval::{RecordDecision, StructureApproval},
    assignment::{CreatePositionAssignment, PositionAssignment},
    change_log::{AuditEntityType, ChangeAction, ChangeLogEntry, CreateChangeLogEntry},
    change_request::{
        ChangeRequestStatus, ChangeRequestStatusUpdate, CreateChangeRequest,
        StructureChangeRequest,
    },
    department::{CreateDepartment, Department, UpdateDepartment},
    position::{CreatePosition, Position, UpdatePosition},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Organization structure
// ---------------------------------------------------------------------------

pub trait DepartmentRepository: Send + Sync {
    /// Insert a department. `audit` receives the stored record and its
    /// entry is appended in the same transaction.
    fn create<F>(
        &self,
        input: CreateDepartment,
        audit: F,
    ) -> impl Future<Output = OrgResult<Department>> + Send
    where
        F: FnOnce(&Department) -> OrgResult<CreateChangeLogEntry> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = OrgResult<Department>> + Send;
    fn get_by_code(&self, code: &str) -> impl Future<Output = OrgResult<Department>> + Send;
    fn update<F>(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdateDepartment,
        audit: F,
    ) -> impl Future<Output = OrgResult<Department>> + Send
    where
        F: FnOnce(&Department) -> OrgResult<CreateChangeLogEntry> + Send;
    /// Set `is_active = false` on the department and every active
    /// position in it. Never deletes. `audit` receives the stored
    /// department and the number of positions deactivated.
    fn deactivate<F>(
        &self,
        id: Uuid,
        expected_version: u64,
        audit: F,
    ) -> impl Future<Output = OrgResult<(Department, u64)>> + Send
    where
        F: FnOnce(&Department, u64) -> OrgResult<CreateChangeLogEntry> + Send;
    fn list(
        &self,
        include_inactive: bool,
        pagination: Pagination,
    ) -> impl Future<Output = OrgResult<PaginatedResult<Department>>> + Send;
}

pub trait PositionRepository: Send + Sync {
    fn create<F>(
        &self,
        input: CreatePosition,
        audit: F,
    ) -> impl Future<Output = OrgResult<Position>> + Send
    where
        F: FnOnce(&Position) -> OrgResult<CreateChangeLogEntry> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = OrgResult<Position>> + Send;
    fn update<F>(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdatePosition,
        audit: F,
    ) -> impl Future<Output = OrgResult<Position>> + Send
    where
        F: FnOnce(&Position) -> OrgResult<CreateChangeLogEntry> + Send;
    /// Set `is_active = false` and stamp `end_date` on every open
    /// assignment of the position. `audit` receives the stored position
    /// and the number of assignments closed.
    fn deactivate<F>(
        &self,
        id: Uuid,
        expected_version: u64,
        end_date: DateTime<Utc>,
        audit: F,
    ) -> impl Future<Output = OrgResult<(Position, u64)>> + Send
    where
        F: FnOnce(&Position, u64) -> OrgResult<CreateChangeLogEntry> + Send;
    fn list_by_department(
        &self,
        department_id: Uuid,
    ) -> impl Future<Output = OrgResult<Vec<Position>>> + Send;
    /// Positions whose `reports_to_position_id` is `manager_id`.
    fn list_direct_reports(
        &self,
        manager_id: Uuid,
    ) -> impl Future<Output = OrgResult<Vec<Position>>> + Send;
}

pub trait PositionAssignmentRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePositionAssignment,
    ) -> impl Future<Output = OrgResult<PositionAssignment>> + Send;
    fn list_by_position(
        &self,
        position_id: Uuid,
    ) -> impl Future<Output = OrgResult<Vec<PositionAssignment>>> + Send;
    /// Stamp `end_date` on every open assignment of a position. Returns
    /// the number closed; already-closed assignments are untouched.
    fn close_open_for_position(
        &self,
        position_id: Uuid,
        end_date: DateTime<Utc>,
    ) -> impl Future<Output = OrgResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Change requests and approvals
// ---------------------------------------------------------------------------

pub trait ChangeRequestRepository: Send + Sync {
    /// Always persists the request in `DRAFT`.
    fn create<F>(
        &self,
        input: CreateChangeRequest,
        audit: F,
    ) -> impl Future<Output = OrgResult<StructureChangeRequest>> + Send
    where
        F: FnOnce(&StructureChangeRequest) -> OrgResult<CreateChangeLogEntry> + Send;
    fn get_by_id(&self, id: Uuid)
    -> impl Future<Output = OrgResult<StructureChangeRequest>> + Send;
    fn get_by_request_number(
        &self,
        request_number: &str,
    ) -> impl Future<Output = OrgResult<StructureChangeRequest>> + Send;
    fn update_status<F>(
        &self,
        id: Uuid,
        expected_version: u64,
        input: ChangeRequestStatusUpdate,
        audit: F,
    ) -> impl Future<Output = OrgResult<StructureChangeRequest>> + Send
    where
        F: FnOnce(&StructureChangeRequest) -> OrgResult<CreateChangeLogEntry> + Send;
    fn list(
        &self,
        status: Option<ChangeRequestStatus>,
        pagination: Pagination,
    ) -> impl Future<Output = OrgResult<PaginatedResult<StructureChangeRequest>>> + Send;
}

pub trait ApprovalRepository: Send + Sync {
    fn find(
        &self,
        change_request_id: Uuid,
        approver_employee_id: Uuid,
    ) -> impl Future<Output = OrgResult<Option<StructureApproval>>> + Send;
    /// Insert or overwrite the decision keyed on
    /// `(change_request_id, approver_employee_id)`. `audit` receives the
    /// previous decision, if any, and the stored one.
    fn upsert<F>(
        &self,
        input: RecordDecision,
        audit: F,
    ) -> impl Future<Output = OrgResult<StructureApproval>> + Send
    where
        F: FnOnce(Option<&StructureApproval>, &StructureApproval) -> OrgResult<CreateChangeLogEntry>
            + Send;
    fn list_by_request(
        &self,
        change_request_id: Uuid,
    ) -> impl Future<Output = OrgResult<Vec<StructureApproval>>> + Send;
}

// ---------------------------------------------------------------------------
// Change log (append-only)
// ---------------------------------------------------------------------------

/// Query filters for change-log entries.
#[derive(Debug, Clone, Default)]
pub struct ChangeLogFilter {
    pub entity_type: Option<AuditEntityType>,
    pub entity_id: Option<Uuid>,
    pub action: Option<ChangeAction>,
    pub performed_by_employee_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub trait ChangeLogRepository: Send + Sync {
    /// Append a new entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateChangeLogEntry,
    ) -> impl Future<Output = OrgResult<ChangeLogEntry>> + Send;
    /// Entries matching `filter`, oldest first.
    fn list(
        &self,
        filter: ChangeLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = OrgResult<PaginatedResult<ChangeLogEntry>>> + Send;
}
