//! Organizational entity store: departments, positions and the
//! cascades between them.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use orgflow_core::error::{OrgError, OrgResult};
use orgflow_core::models::assignment::{CreatePositionAssignment, PositionAssignment};
use orgflow_core::models::change_log::AuditEntityType;
use orgflow_core::models::department::{CreateDepartment, Department, UpdateDepartment};
use orgflow_core::models::position::{CreatePosition, Position, UpdatePosition};
use orgflow_core::repository::{
    ChangeLogRepository, DepartmentRepository, PaginatedResult, Pagination,
    PositionAssignmentRepository, PositionRepository,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::{AuditContext, AuditTrail};
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;

/// Owns the Department and Position lifecycle.
///
/// Generic over repository implementations so that the workflow layer
/// has no dependency on the database crate.
pub struct OrgStructureService<D, P, A, L>
where
    D: DepartmentRepository,
    P: PositionRepository,
    A: PositionAssignmentRepository,
    L: ChangeLogRepository,
{
    departments: D,
    positions: P,
    assignments: A,
    audit: AuditTrail<L>,
    config: WorkflowConfig,
}

impl<D, P, A, L> OrgStructureService<D, P, A, L>
where
    D: DepartmentRepository,
    P: PositionRepository,
    A: PositionAssignmentRepository,
    L: ChangeLogRepository,
{
    pub fn new(
        departments: D,
        positions: P,
        assignments: A,
        change_log: L,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            departments,
            positions,
            assignments,
            audit: AuditTrail::new(change_log),
            config,
        }
    }

    pub fn audit(&self) -> &AuditTrail<L> {
        &self.audit
    }

    // -----------------------------------------------------------------
    // Departments
    // -----------------------------------------------------------------

    pub async fn create_department(
        &self,
        input: CreateDepartment,
        performed_by: Option<Uuid>,
    ) -> OrgResult<Department> {
        if let Some(head) = input.head_position_id {
            self.positions.get_by_id(head).await?;
        }

        let department = self
            .departments
            .create(input, |after| {
                let summary = format!("Department {} created", after.code);
                self.audit.created(
                    AuditContext {
                        entity_type: AuditEntityType::Department,
                        entity_id: after.id,
                        performed_by,
                        summary: &summary,
                    },
                    after,
                )
            })
            .await?;

        info!(department_id = %department.id, code = %department.code, "Department created");
        Ok(department)
    }

    pub async fn update_department(
        &self,
        id: Uuid,
        patch: UpdateDepartment,
        performed_by: Option<Uuid>,
    ) -> OrgResult<Department> {
        let before = self.departments.get_by_id(id).await?;
        if let Some(head) = patch.head_position_id {
            self.positions.get_by_id(head).await?;
        }

        let after = self
            .departments
            .update(id, before.version, patch, |after| {
                let summary = format!("Department {} updated", after.code);
                self.audit.updated(
                    AuditContext {
                        entity_type: AuditEntityType::Department,
                        entity_id: id,
                        performed_by,
                        summary: &summary,
                    },
                    Some(&before),
                    after,
                )
            })
            .await?;

        info!(department_id = %id, version = after.version, "Department updated");
        Ok(after)
    }

    /// Deactivate a department and every active position inside it.
    ///
    /// The department, its positions and the change-log entry are written
    /// in one transaction. Re-deactivating returns the stored record and
    /// writes nothing.
    pub async fn deactivate_department(
        &self,
        id: Uuid,
        performed_by: Option<Uuid>,
        reason: Option<&str>,
    ) -> OrgResult<Department> {
        let before = self.departments.get_by_id(id).await?;
        if !before.is_active {
            debug!(department_id = %id, "Department already inactive");
            return Ok(before);
        }

        let (after, cascaded) = self
            .departments
            .deactivate(id, before.version, |after, cascaded| {
                let mut summary = format!(
                    "Department {} deactivated; {cascaded} position(s) deactivated",
                    after.code
                );
                if let Some(reason) = reason {
                    summary.push_str(&format!("; reason: {reason}"));
                }
                self.audit.deactivated(
                    AuditContext {
                        entity_type: AuditEntityType::Department,
                        entity_id: id,
                        performed_by,
                        summary: &summary,
                    },
                    &before,
                    after,
                )
            })
            .await?;

        info!(department_id = %id, cascaded, "Department deactivated");
        Ok(after)
    }

    pub async fn get_department(&self, id: Uuid) -> OrgResult<Department> {
        self.departments.get_by_id(id).await
    }

    pub async fn get_department_by_code(&self, code: &str) -> OrgResult<Department> {
        self.departments.get_by_code(code).await
    }

    pub async fn list_departments(
        &self,
        include_inactive: bool,
        pagination: Pagination,
    ) -> OrgResult<PaginatedResult<Department>> {
        self.departments.list(include_inactive, pagination).await
    }

    // -----------------------------------------------------------------
    // Positions
    // -----------------------------------------------------------------

    pub async fn create_position(
        &self,
        input: CreatePosition,
        performed_by: Option<Uuid>,
    ) -> OrgResult<Position> {
        self.departments.get_by_id(input.department_id).await?;
        if let Some(manager_id) = input.reports_to_position_id {
            self.validate_reports_to(None, manager_id).await?;
        }

        let position = self
            .positions
            .create(input, |after| {
                let summary = format!("Position {} created", after.code);
                self.audit.created(
                    AuditContext {
                        entity_type: AuditEntityType::Position,
                        entity_id: after.id,
                        performed_by,
                        summary: &summary,
                    },
                    after,
                )
            })
            .await?;

        info!(
            position_id = %position.id,
            code = %position.code,
            department_id = %position.department_id,
            "Position created"
        );
        Ok(position)
    }

    pub async fn update_position(
        &self,
        id: Uuid,
        patch: UpdatePosition,
        performed_by: Option<Uuid>,
    ) -> OrgResult<Position> {
        let before = self.positions.get_by_id(id).await?;

        if let Some(department_id) = patch.department_id {
            if department_id != before.department_id {
                self.departments.get_by_id(department_id).await?;
            }
        }
        if let Some(manager_id) = patch.reports_to_position_id {
            if Some(manager_id) != before.reports_to_position_id {
                self.validate_reports_to(Some(id), manager_id).await?;
            }
        }

        let after = self
            .positions
            .update(id, before.version, patch, |after| {
                let summary = format!("Position {} updated", after.code);
                self.audit.updated(
                    AuditContext {
                        entity_type: AuditEntityType::Position,
                        entity_id: id,
                        performed_by,
                        summary: &summary,
                    },
                    Some(&before),
                    after,
                )
            })
            .await?;

        info!(position_id = %id, version = after.version, "Position updated");
        Ok(after)
    }

    /// Deactivate a position and close its open assignments.
    ///
    /// Every open assignment is stamped with the same `end_date`
    /// (`now` when omitted), in the transaction that deactivates the
    /// position. Re-deactivating writes nothing.
    pub async fn deactivate_position(
        &self,
        id: Uuid,
        performed_by: Option<Uuid>,
        end_date: Option<DateTime<Utc>>,
        reason: Option<&str>,
    ) -> OrgResult<Position> {
        let before = self.positions.get_by_id(id).await?;
        if !before.is_active {
            debug!(position_id = %id, "Position already inactive");
            return Ok(before);
        }

        let end_date = end_date.unwrap_or_else(Utc::now);
        let (after, closed) = self
            .positions
            .deactivate(id, before.version, end_date, |after, _closed| {
                let mut summary = format!("Position {} deactivated", after.code);
                if let Some(reason) = reason {
                    summary.push_str(&format!("; reason: {reason}"));
                }
                self.audit.deactivated(
                    AuditContext {
                        entity_type: AuditEntityType::Position,
                        entity_id: id,
                        performed_by,
                        summary: &summary,
                    },
                    &before,
                    after,
                )
            })
            .await?;

        info!(position_id = %id, closed_assignments = closed, "Position deactivated");
        Ok(after)
    }

    pub async fn get_position(&self, id: Uuid) -> OrgResult<Position> {
        self.positions.get_by_id(id).await
    }

    pub async fn positions_in_department(&self, department_id: Uuid) -> OrgResult<Vec<Position>> {
        self.positions.list_by_department(department_id).await
    }

    pub async fn direct_reports(&self, position_id: Uuid) -> OrgResult<Vec<Position>> {
        self.positions.list_direct_reports(position_id).await
    }

    /// Ancestors of a position, nearest manager first.
    ///
    /// Stops at the top of the hierarchy, at a dangling reference, on a
    /// revisited position, or after `max_reporting_depth` hops.
    pub async fn reporting_chain(&self, position_id: Uuid) -> OrgResult<Vec<Position>> {
        let start = self.positions.get_by_id(position_id).await?;
        let mut visited = HashSet::from([start.id]);
        let mut chain = Vec::new();
        let mut next = start.reports_to_position_id;

        while let Some(manager_id) = next {
            if chain.len() >= self.config.max_reporting_depth || !visited.insert(manager_id) {
                break;
            }
            let manager = match self.positions.get_by_id(manager_id).await {
                Ok(p) => p,
                Err(OrgError::NotFound { .. }) => break,
                Err(e) => return Err(e),
            };
            next = manager.reports_to_position_id;
            chain.push(manager);
        }

        Ok(chain)
    }

    /// Check that `manager_id` may become the manager of `position_id`
    /// (`None` for a position not yet created).
    async fn validate_reports_to(
        &self,
        position_id: Option<Uuid>,
        manager_id: Uuid,
    ) -> OrgResult<()> {
        let manager = self.positions.get_by_id(manager_id).await?;

        let Some(position_id) = position_id else {
            return Ok(());
        };
        if manager_id == position_id {
            return Err(WorkflowError::SelfReporting { position_id }.into());
        }
        if !self.config.reject_reporting_cycles {
            return Ok(());
        }

        let mut visited = HashSet::from([manager.id]);
        let mut next = manager.reports_to_position_id;
        let mut depth = 0usize;

        while let Some(ancestor_id) = next {
            if ancestor_id == position_id {
                return Err(WorkflowError::ReportingCycle {
                    position_id,
                    manager_id,
                }
                .into());
            }
            depth += 1;
            if depth > self.config.max_reporting_depth {
                return Err(WorkflowError::ReportingTooDeep {
                    position_id,
                    max_depth: self.config.max_reporting_depth,
                }
                .into());
            }
            // An existing loop above the manager cannot reach this position.
            if !visited.insert(ancestor_id) {
                break;
            }
            next = match self.positions.get_by_id(ancestor_id).await {
                Ok(p) => p.reports_to_position_id,
                Err(OrgError::NotFound { .. }) => None,
                Err(e) => return Err(e),
            };
        }

        Ok(())
    }

    // -----------------------------------------------------------------
    // Assignments
    // -----------------------------------------------------------------

    /// Create an assignment. The position must exist.
    pub async fn create_assignment(
        &self,
        input: CreatePositionAssignment,
    ) -> OrgResult<PositionAssignment> {
        self.positions.get_by_id(input.position_id).await?;
        let assignment = self.assignments.create(input).await?;
        debug!(
            assignment_id = %assignment.id,
            position_id = %assignment.position_id,
            "Position assignment created"
        );
        Ok(assignment)
    }

    pub async fn assignments_for_position(
        &self,
        position_id: Uuid,
    ) -> OrgResult<Vec<PositionAssignment>> {
        self.assignments.list_by_position(position_id).await
    }

    /// Close every open assignment of a position without touching the
    /// position itself. Returns the number closed.
    pub async fn close_open_assignments(
        &self,
        position_id: Uuid,
        end_date: DateTime<Utc>,
    ) -> OrgResult<u64> {
        self.assignments
            .close_open_for_position(position_id, end_date)
            .await
    }
}
