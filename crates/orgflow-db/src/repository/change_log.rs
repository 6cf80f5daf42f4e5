//! SurrealDB implementation of [`ChangeLogRepository`].
//!
//! The table is append-only: the schema denies update and delete. Rows
//! are written either through `append` or by the entity repositories,
//! inside the transaction of the change they describe.

use chrono::{DateTime, Utc};
use orgflow_core::error::OrgResult;
use orgflow_core::models::change_log::{
    AuditEntityType, ChangeAction, ChangeLogEntry, CreateChangeLogEntry,
};
use orgflow_core::repository::{
    ChangeLogFilter, ChangeLogRepository, PaginatedResult, Pagination,
};
use surrealdb::method::Transaction;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{CountRow, begin, finish, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ChangeLogRow {
    action: String,
    entity_type: String,
    entity_id: String,
    performed_by_employee_id: Option<String>,
    before_snapshot: Option<serde_json::Value>,
    after_snapshot: Option<serde_json::Value>,
    summary: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ChangeLogRowWithId {
    record_id: String,
    action: String,
    entity_type: String,
    entity_id: String,
    performed_by_employee_id: Option<String>,
    before_snapshot: Option<serde_json::Value>,
    after_snapshot: Option<serde_json::Value>,
    summary: String,
    timestamp: DateTime<Utc>,
}

fn row_to_entry(row: ChangeLogRow, id: Uuid) -> Result<ChangeLogEntry, DbError> {
    let action: ChangeAction = row
        .action
        .parse()
        .map_err(|_| DbError::Decode(format!("unknown change action: {}", row.action)))?;
    let entity_type: AuditEntityType = row
        .entity_type
        .parse()
        .map_err(|_| DbError::Decode(format!("unknown entity type: {}", row.entity_type)))?;

    Ok(ChangeLogEntry {
        id,
        action,
        entity_type,
        entity_id: parse_uuid(&row.entity_id, "entity")?,
        performed_by_employee_id: parse_opt_uuid(row.performed_by_employee_id, "performer")?,
        before_snapshot: row.before_snapshot,
        after_snapshot: row.after_snapshot,
        summary: row.summary,
        timestamp: row.timestamp,
    })
}

impl ChangeLogRowWithId {
    fn try_into_entry(self) -> Result<ChangeLogEntry, DbError> {
        let id = parse_uuid(&self.record_id, "change log")?;
        row_to_entry(
            ChangeLogRow {
                action: self.action,
                entity_type: self.entity_type,
                entity_id: self.entity_id,
                performed_by_employee_id: self.performed_by_employee_id,
                before_snapshot: self.before_snapshot,
                after_snapshot: self.after_snapshot,
                summary: self.summary,
                timestamp: self.timestamp,
            },
            id,
        )
    }
}

/// Write `input` as a new change-log row inside `tx`.
pub(super) async fn append_in<C: Connection>(
    tx: &Transaction<C>,
    input: CreateChangeLogEntry,
) -> Result<ChangeLogEntry, DbError> {
    let id = Uuid::now_v7();
    let id_str = id.to_string();

    let result = tx
        .query(
            "CREATE type::record('change_log', $log_id) SET \
             action = $action, entity_type = $entity_type, \
             entity_id = $entity_id, \
             performed_by_employee_id = $performed_by_employee_id, \
             before_snapshot = $before_snapshot, \
             after_snapshot = $after_snapshot, \
             summary = $summary",
        )
        .bind(("log_id", id_str.clone()))
        .bind(("action", input.action.as_str().to_string()))
        .bind(("entity_type", input.entity_type.as_str().to_string()))
        .bind(("entity_id", input.entity_id.to_string()))
        .bind((
            "performed_by_employee_id",
            input.performed_by_employee_id.map(|p| p.to_string()),
        ))
        .bind(("before_snapshot", input.before_snapshot))
        .bind(("after_snapshot", input.after_snapshot))
        .bind(("summary", input.summary))
        .await?;

    let mut result = result.check().map_err(DbError::from_check)?;

    let rows: Vec<ChangeLogRow> = result.take(0)?;
    let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: "change_log".into(),
        id: id_str,
    })?;

    let entry = row_to_entry(row, id)?;
    debug!(
        change_log_id = %entry.id,
        action = %entry.action,
        entity_type = %entry.entity_type,
        entity_id = %entry.entity_id,
        "Change log entry appended"
    );
    Ok(entry)
}

/// SurrealDB implementation of the ChangeLog repository.
#[derive(Clone)]
pub struct SurrealChangeLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealChangeLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ChangeLogRepository for SurrealChangeLogRepository<C> {
    async fn append(&self, input: CreateChangeLogEntry) -> OrgResult<ChangeLogEntry> {
        let tx = begin(&self.db).await?;
        let outcome: OrgResult<ChangeLogEntry> =
            append_in(&tx, input).await.map_err(Into::into);
        finish(tx, outcome).await
    }

    async fn list(
        &self,
        filter: ChangeLogFilter,
        pagination: Pagination,
    ) -> OrgResult<PaginatedResult<ChangeLogEntry>> {
        let mut conditions = Vec::new();
        if filter.entity_type.is_some() {
            conditions.push("entity_type = $entity_type");
        }
        if filter.entity_id.is_some() {
            conditions.push("entity_id = $entity_id");
        }
        if filter.action.is_some() {
            conditions.push("action = $action");
        }
        if filter.performed_by_employee_id.is_some() {
            conditions.push("performed_by_employee_id = $performed_by_employee_id");
        }
        if filter.from.is_some() {
            conditions.push("timestamp >= $from");
        }
        if filter.to.is_some() {
            conditions.push("timestamp <= $to");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let entity_type = filter.entity_type.map(|t| t.as_str().to_string());
        let entity_id = filter.entity_id.map(|id| id.to_string());
        let action = filter.action.map(|a| a.as_str().to_string());
        let performed_by = filter.performed_by_employee_id.map(|p| p.to_string());

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM change_log {where_clause} GROUP ALL"
            ))
            .bind(("entity_type", entity_type.clone()))
            .bind(("entity_id", entity_id.clone()))
            .bind(("action", action.clone()))
            .bind(("performed_by_employee_id", performed_by.clone()))
            .bind(("from", filter.from))
            .bind(("to", filter.to))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM change_log {where_clause} \
                 ORDER BY timestamp ASC, record_id ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("entity_type", entity_type))
            .bind(("entity_id", entity_id))
            .bind(("action", action))
            .bind(("performed_by_employee_id", performed_by))
            .bind(("from", filter.from))
            .bind(("to", filter.to))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ChangeLogRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
