//! SurrealDB implementation of [`ChangeRequestRepository`].

use chrono::{DateTime, Utc};
use orgflow_core::error::OrgResult;
use orgflow_core::models::change_log::CreateChangeLogEntry;
use orgflow_core::models::change_request::{
    ChangeRequestStatus, ChangeRequestStatusUpdate, ChangeRequestType, CreateChangeRequest,
    StructureChangeRequest,
};
use orgflow_core::repository::{ChangeRequestRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::change_log::append_in;
use super::{CountRow, begin, finish, missing_or_conflict, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

const ENTITY: &str = "structure_change_request";

#[derive(Debug, SurrealValue)]
struct ChangeRequestRow {
    request_number: String,
    requested_by_employee_id: String,
    request_type: String,
    target_department_id: Option<String>,
    target_position_id: Option<String>,
    details: Option<String>,
    reason: Option<String>,
    status: String,
    submitted_by_employee_id: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ChangeRequestRowWithId {
    record_id: String,
    request_number: String,
    requested_by_employee_id: String,
    request_type: String,
    target_department_id: Option<String>,
    target_position_id: Option<String>,
    details: Option<String>,
    reason: Option<String>,
    status: String,
    submitted_by_employee_id: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<ChangeRequestStatus, DbError> {
    s.parse()
        .map_err(|_| DbError::Decode(format!("unknown change request status: {s}")))
}

fn parse_type(s: &str) -> Result<ChangeRequestType, DbError> {
    s.parse()
        .map_err(|_| DbError::Decode(format!("unknown change request type: {s}")))
}

fn row_to_request(row: ChangeRequestRow, id: Uuid) -> Result<StructureChangeRequest, DbError> {
    Ok(StructureChangeRequest {
        id,
        request_number: row.request_number,
        requested_by_employee_id: parse_uuid(&row.requested_by_employee_id, "requester")?,
        request_type: parse_type(&row.request_type)?,
        target_department_id: parse_opt_uuid(row.target_department_id, "target department")?,
        target_position_id: parse_opt_uuid(row.target_position_id, "target position")?,
        details: row.details,
        reason: row.reason,
        status: parse_status(&row.status)?,
        submitted_by_employee_id: parse_opt_uuid(row.submitted_by_employee_id, "submitter")?,
        submitted_at: row.submitted_at,
        version: row.version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl ChangeRequestRowWithId {
    fn try_into_request(self) -> Result<StructureChangeRequest, DbError> {
        let id = parse_uuid(&self.record_id, "change request")?;
        row_to_request(
            ChangeRequestRow {
                request_number: self.request_number,
                requested_by_employee_id: self.requested_by_employee_id,
                request_type: self.request_type,
                target_department_id: self.target_department_id,
                target_position_id: self.target_position_id,
                details: self.details,
                reason: self.reason,
                status: self.status,
                submitted_by_employee_id: self.submitted_by_employee_id,
                submitted_at: self.submitted_at,
                version: self.version,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the ChangeRequest repository.
#[derive(Clone)]
pub struct SurrealChangeRequestRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealChangeRequestRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ChangeRequestRepository for SurrealChangeRequestRepository<C> {
    async fn create<F>(
        &self,
        input: CreateChangeRequest,
        audit: F,
    ) -> OrgResult<StructureChangeRequest>
    where
        F: FnOnce(&StructureChangeRequest) -> OrgResult<CreateChangeLogEntry> + Send,
    {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let tx = begin(&self.db).await?;
        let outcome: OrgResult<StructureChangeRequest> = async {
            let result = tx
                .query(
                    "CREATE type::record('structure_change_request', $id) SET \
                     request_number = $request_number, \
                     requested_by_employee_id = $requested_by_employee_id, \
                     request_type = $request_type, \
                     target_department_id = $target_department_id, \
                     target_position_id = $target_position_id, \
                     details = $details, reason = $reason, \
                     status = $status, version = 1",
                )
                .bind(("id", id_str.clone()))
                .bind(("request_number", input.request_number))
                .bind((
                    "requested_by_employee_id",
                    input.requested_by_employee_id.to_string(),
                ))
                .bind(("request_type", input.request_type.as_str().to_string()))
                .bind((
                    "target_department_id",
                    input.target_department_id.map(|d| d.to_string()),
                ))
                .bind((
                    "target_position_id",
                    input.target_position_id.map(|p| p.to_string()),
                ))
                .bind(("details", input.details))
                .bind(("reason", input.reason))
                .bind(("status", ChangeRequestStatus::Draft.as_str().to_string()))
                .await
                .map_err(DbError::from)?;

            let mut result = result.check().map_err(DbError::from_check)?;

            let rows: Vec<ChangeRequestRow> = result.take(0).map_err(DbError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                entity: ENTITY.into(),
                id: id_str.clone(),
            })?;
            let request = row_to_request(row, id)?;

            append_in(&tx, audit(&request)?).await?;
            Ok(request)
        }
        .await;

        finish(tx, outcome).await
    }

    async fn get_by_id(&self, id: Uuid) -> OrgResult<StructureChangeRequest> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('structure_change_request', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ChangeRequestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        Ok(row_to_request(row, id)?)
    }

    async fn get_by_request_number(
        &self,
        request_number: &str,
    ) -> OrgResult<StructureChangeRequest> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM structure_change_request \
                 WHERE request_number = $request_number",
            )
            .bind(("request_number", request_number.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ChangeRequestRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: format!("request_number={request_number}"),
        })?;

        Ok(row.try_into_request()?)
    }

    async fn update_status<F>(
        &self,
        id: Uuid,
        expected_version: u64,
        input: ChangeRequestStatusUpdate,
        audit: F,
    ) -> OrgResult<StructureChangeRequest>
    where
        F: FnOnce(&StructureChangeRequest) -> OrgResult<CreateChangeLogEntry> + Send,
    {
        let id_str = id.to_string();

        let mut sets = vec!["status = $status"];
        if input.submitted_by_employee_id.is_some() {
            sets.push("submitted_by_employee_id = $submitted_by_employee_id");
        }
        if input.submitted_at.is_some() {
            sets.push("submitted_at = $submitted_at");
        }
        sets.push("version += 1");
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('structure_change_request', $id) SET {} \
             WHERE version = $expected_version",
            sets.join(", ")
        );

        let tx = begin(&self.db).await?;
        let outcome: OrgResult<Option<StructureChangeRequest>> = async {
            let mut builder = tx
                .query(&query)
                .bind(("id", id_str.clone()))
                .bind(("expected_version", expected_version))
                .bind(("status", input.status.as_str().to_string()));

            if let Some(submitter) = input.submitted_by_employee_id {
                builder = builder.bind(("submitted_by_employee_id", submitter.to_string()));
            }
            if let Some(submitted_at) = input.submitted_at {
                builder = builder.bind(("submitted_at", submitted_at));
            }

            let result = builder.await.map_err(DbError::from)?;
            let mut result = result.check().map_err(DbError::from_check)?;

            let rows: Vec<ChangeRequestRow> = result.take(0).map_err(DbError::from)?;
            let Some(row) = rows.into_iter().next() else {
                return Ok(None);
            };
            let request = row_to_request(row, id)?;

            append_in(&tx, audit(&request)?).await?;
            Ok(Some(request))
        }
        .await;

        match finish(tx, outcome).await? {
            Some(request) => Ok(request),
            None => Err(missing_or_conflict(&self.db, ENTITY, ENTITY, &id_str)
                .await
                .into()),
        }
    }

    async fn list(
        &self,
        status: Option<ChangeRequestStatus>,
        pagination: Pagination,
    ) -> OrgResult<PaginatedResult<StructureChangeRequest>> {
        let filter = if status.is_some() {
            "WHERE status = $status"
        } else {
            ""
        };
        let status_str = status.map(|s| s.as_str().to_string());

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM structure_change_request {filter} GROUP ALL"
            ))
            .bind(("status", status_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM structure_change_request {filter} \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("status", status_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ChangeRequestRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_request())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
