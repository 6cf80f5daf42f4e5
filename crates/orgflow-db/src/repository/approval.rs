//! SurrealDB implementation of [`ApprovalRepository`].
//!
//! Decisions are keyed on `(change_request_id, approver_employee_id)`,
//! backed by a unique index. A repeated decision overwrites the existing
//! record in place and keeps its id.

use chrono::{DateTime, Utc};
use orgflow_core::error::OrgResult;
use orgflow_core::models::approval::{ApprovalDecision, RecordDecision, StructureApproval};
use orgflow_core::models::change_log::CreateChangeLogEntry;
use orgflow_core::repository::ApprovalRepository;
use surrealdb::method::Transaction;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::change_log::append_in;
use super::{begin, finish, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ApprovalRow {
    change_request_id: String,
    approver_employee_id: String,
    decision: String,
    decided_at: DateTime<Utc>,
    comments: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ApprovalRowWithId {
    record_id: String,
    change_request_id: String,
    approver_employee_id: String,
    decision: String,
    decided_at: DateTime<Utc>,
    comments: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_decision(s: &str) -> Result<ApprovalDecision, DbError> {
    s.parse()
        .map_err(|_| DbError::Decode(format!("unknown approval decision: {s}")))
}

fn row_to_approval(row: ApprovalRow, id: Uuid) -> Result<StructureApproval, DbError> {
    Ok(StructureApproval {
        id,
        change_request_id: parse_uuid(&row.change_request_id, "change request")?,
        approver_employee_id: parse_uuid(&row.approver_employee_id, "approver")?,
        decision: parse_decision(&row.decision)?,
        decided_at: row.decided_at,
        comments: row.comments,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl ApprovalRowWithId {
    fn try_into_approval(self) -> Result<StructureApproval, DbError> {
        let id = parse_uuid(&self.record_id, "approval")?;
        row_to_approval(
            ApprovalRow {
                change_request_id: self.change_request_id,
                approver_employee_id: self.approver_employee_id,
                decision: self.decision,
                decided_at: self.decided_at,
                comments: self.comments,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the Approval repository.
#[derive(Clone)]
pub struct SurrealApprovalRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealApprovalRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

const FIND_DECISION: &str = "SELECT meta::id(id) AS record_id, * FROM structure_approval \
     WHERE change_request_id = $change_request_id \
     AND approver_employee_id = $approver_employee_id";

async fn find_in<C: Connection>(
    tx: &Transaction<C>,
    input: &RecordDecision,
) -> Result<Option<StructureApproval>, DbError> {
    let mut result = tx
        .query(FIND_DECISION)
        .bind(("change_request_id", input.change_request_id.to_string()))
        .bind(("approver_employee_id", input.approver_employee_id.to_string()))
        .await?;

    let rows: Vec<ApprovalRowWithId> = result.take(0)?;
    rows.into_iter()
        .next()
        .map(|row| row.try_into_approval())
        .transpose()
}

impl<C: Connection> ApprovalRepository for SurrealApprovalRepository<C> {
    async fn find(
        &self,
        change_request_id: Uuid,
        approver_employee_id: Uuid,
    ) -> OrgResult<Option<StructureApproval>> {
        let mut result = self
            .db
            .query(FIND_DECISION)
            .bind(("change_request_id", change_request_id.to_string()))
            .bind(("approver_employee_id", approver_employee_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ApprovalRowWithId> = result.take(0).map_err(DbError::from)?;
        let approval = rows
            .into_iter()
            .next()
            .map(|row| row.try_into_approval())
            .transpose()?;

        Ok(approval)
    }

    async fn upsert<F>(&self, input: RecordDecision, audit: F) -> OrgResult<StructureApproval>
    where
        F: FnOnce(Option<&StructureApproval>, &StructureApproval) -> OrgResult<CreateChangeLogEntry>
            + Send,
    {
        let tx = begin(&self.db).await?;
        let outcome: OrgResult<StructureApproval> = async {
            let existing = find_in(&tx, &input).await?;

            let (id, query) = match &existing {
                Some(approval) => (
                    approval.id,
                    "UPDATE type::record('structure_approval', $id) SET \
                     decision = $decision, decided_at = $decided_at, \
                     comments = $comments, updated_at = time::now()",
                ),
                None => (
                    Uuid::new_v4(),
                    "CREATE type::record('structure_approval', $id) SET \
                     change_request_id = $change_request_id, \
                     approver_employee_id = $approver_employee_id, \
                     decision = $decision, decided_at = $decided_at, \
                     comments = $comments",
                ),
            };
            let id_str = id.to_string();

            let result = tx
                .query(query)
                .bind(("id", id_str.clone()))
                .bind(("change_request_id", input.change_request_id.to_string()))
                .bind((
                    "approver_employee_id",
                    input.approver_employee_id.to_string(),
                ))
                .bind(("decision", input.decision.as_str().to_string()))
                .bind(("decided_at", input.decided_at))
                .bind(("comments", input.comments))
                .await
                .map_err(DbError::from)?;

            let mut result = result.check().map_err(DbError::from_check)?;

            let rows: Vec<ApprovalRow> = result.take(0).map_err(DbError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                entity: "structure_approval".into(),
                id: id_str,
            })?;
            let approval = row_to_approval(row, id)?;

            append_in(&tx, audit(existing.as_ref(), &approval)?).await?;
            Ok(approval)
        }
        .await;

        finish(tx, outcome).await
    }

    async fn list_by_request(&self, change_request_id: Uuid) -> OrgResult<Vec<StructureApproval>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM structure_approval \
                 WHERE change_request_id = $change_request_id \
                 ORDER BY decided_at ASC",
            )
            .bind(("change_request_id", change_request_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ApprovalRowWithId> = result.take(0).map_err(DbError::from)?;
        let approvals = rows
            .into_iter()
            .map(|row| row.try_into_approval())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(approvals)
    }
}
