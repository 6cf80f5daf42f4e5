//! Audit trail.
//!
//! Mutating service calls build their change-log entry with an
//! [`AuditTrail`] and hand it to the repository, which stores it in the
//! same transaction as the write. Reads go through the trail as well.

use orgflow_core::error::OrgResult;
use orgflow_core::models::change_log::{
    AuditEntityType, ChangeAction, ChangeLogEntry, CreateChangeLogEntry,
};
use orgflow_core::repository::{
    ChangeLogFilter, ChangeLogRepository, PaginatedResult, Pagination,
};
use orgflow_core::snapshot::Snapshot;
use uuid::Uuid;

/// Who changed what, and how it should read in the trail.
#[derive(Debug, Clone, Copy)]
pub struct AuditContext<'a> {
    pub entity_type: AuditEntityType,
    pub entity_id: Uuid,
    pub performed_by: Option<Uuid>,
    pub summary: &'a str,
}

#[derive(Clone)]
pub struct AuditTrail<L: ChangeLogRepository> {
    log: L,
}

impl<L: ChangeLogRepository> AuditTrail<L> {
    pub fn new(log: L) -> Self {
        Self { log }
    }

    /// Entry for a creation. Only the after-snapshot is stored.
    pub fn created<T: Snapshot>(
        &self,
        ctx: AuditContext<'_>,
        after: &T,
    ) -> OrgResult<CreateChangeLogEntry> {
        Ok(entry(ChangeAction::Created, ctx, None, Some(after.snapshot()?)))
    }

    /// Entry for an update. `before` is `None` when the write inserted
    /// the record (upserts).
    pub fn updated<T: Snapshot>(
        &self,
        ctx: AuditContext<'_>,
        before: Option<&T>,
        after: &T,
    ) -> OrgResult<CreateChangeLogEntry> {
        let before = before.map(|b| b.snapshot()).transpose()?;
        Ok(entry(ChangeAction::Updated, ctx, before, Some(after.snapshot()?)))
    }

    pub fn deactivated<T: Snapshot>(
        &self,
        ctx: AuditContext<'_>,
        before: &T,
        after: &T,
    ) -> OrgResult<CreateChangeLogEntry> {
        Ok(entry(
            ChangeAction::Deactivated,
            ctx,
            Some(before.snapshot()?),
            Some(after.snapshot()?),
        ))
    }

    /// Query the trail. Read access for collaborators such as reporting.
    pub async fn list(
        &self,
        filter: ChangeLogFilter,
        pagination: Pagination,
    ) -> OrgResult<PaginatedResult<ChangeLogEntry>> {
        self.log.list(filter, pagination).await
    }

    /// Full history of one entity, oldest first.
    pub async fn history_of(
        &self,
        entity_type: AuditEntityType,
        entity_id: Uuid,
    ) -> OrgResult<Vec<ChangeLogEntry>> {
        let filter = ChangeLogFilter {
            entity_type: Some(entity_type),
            entity_id: Some(entity_id),
            ..Default::default()
        };

        let mut entries = Vec::new();
        let mut pagination = Pagination::default();
        loop {
            let page = self.log.list(filter.clone(), pagination.clone()).await?;
            let fetched = page.items.len() as u64;
            entries.extend(page.items);
            if fetched < pagination.limit || entries.len() as u64 >= page.total {
                break;
            }
            pagination.offset += fetched;
        }

        Ok(entries)
    }
}

fn entry(
    action: ChangeAction,
    ctx: AuditContext<'_>,
    before_snapshot: Option<serde_json::Value>,
    after_snapshot: Option<serde_json::Value>,
) -> CreateChangeLogEntry {
    CreateChangeLogEntry {
        action,
        entity_type: ctx.entity_type,
        entity_id: ctx.entity_id,
        performed_by_employee_id: ctx.performed_by,
        before_snapshot,
        after_snapshot,
        summary: ctx.summary.to_string(),
    }
}
