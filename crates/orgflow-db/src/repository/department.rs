//! SurrealDB implementation of [`DepartmentRepository`].

use chrono::{DateTime, Utc};
use orgflow_core::error::OrgResult;
use orgflow_core::models::change_log::CreateChangeLogEntry;
use orgflow_core::models::department::{CreateDepartment, Department, UpdateDepartment};
use orgflow_core::repository::{DepartmentRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::change_log::append_in;
use super::{CountRow, RecordIdRow, begin, finish, missing_or_conflict, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct DepartmentRow {
    code: String,
    name: String,
    description: Option<String>,
    head_position_id: Option<String>,
    is_active: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct DepartmentRowWithId {
    record_id: String,
    code: String,
    name: String,
    description: Option<String>,
    head_position_id: Option<String>,
    is_active: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DepartmentRow {
    fn into_department(self, id: Uuid) -> Result<Department, DbError> {
        Ok(Department {
            id,
            code: self.code,
            name: self.name,
            description: self.description,
            head_position_id: parse_opt_uuid(self.head_position_id, "head position")?,
            is_active: self.is_active,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DepartmentRowWithId {
    fn try_into_department(self) -> Result<Department, DbError> {
        let id = parse_uuid(&self.record_id, "department")?;
        DepartmentRow {
            code: self.code,
            name: self.name,
            description: self.description,
            head_position_id: self.head_position_id,
            is_active: self.is_active,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_department(id)
    }
}

/// SurrealDB implementation of the Department repository.
#[derive(Clone)]
pub struct SurrealDepartmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDepartmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DepartmentRepository for SurrealDepartmentRepository<C> {
    async fn create<F>(&self, input: CreateDepartment, audit: F) -> OrgResult<Department>
    where
        F: FnOnce(&Department) -> OrgResult<CreateChangeLogEntry> + Send,
    {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let tx = begin(&self.db).await?;
        let outcome: OrgResult<Department> = async {
            let result = tx
                .query(
                    "CREATE type::record('department', $id) SET \
                     code = $code, name = $name, \
                     description = $description, \
                     head_position_id = $head_position_id, \
                     is_active = true, version = 1",
                )
                .bind(("id", id_str.clone()))
                .bind(("code", input.code))
                .bind(("name", input.name))
                .bind(("description", input.description))
                .bind((
                    "head_position_id",
                    input.head_position_id.map(|p| p.to_string()),
                ))
                .await
                .map_err(DbError::from)?;

            let mut result = result.check().map_err(DbError::from_check)?;

            let rows: Vec<DepartmentRow> = result.take(0).map_err(DbError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                entity: "department".into(),
                id: id_str.clone(),
            })?;
            let department = row.into_department(id)?;

            append_in(&tx, audit(&department)?).await?;
            Ok(department)
        }
        .await;

        finish(tx, outcome).await
    }

    async fn get_by_id(&self, id: Uuid) -> OrgResult<Department> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('department', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DepartmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "department".into(),
            id: id_str,
        })?;

        Ok(row.into_department(id)?)
    }

    async fn get_by_code(&self, code: &str) -> OrgResult<Department> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM department WHERE code = $code",
            )
            .bind(("code", code.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DepartmentRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "department".into(),
            id: format!("code={code}"),
        })?;

        Ok(row.try_into_department()?)
    }

    async fn update<F>(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdateDepartment,
        audit: F,
    ) -> OrgResult<Department>
    where
        F: FnOnce(&Department) -> OrgResult<CreateChangeLogEntry> + Send,
    {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.head_position_id.is_some() {
            sets.push("head_position_id = $head_position_id");
        }
        sets.push("version += 1");
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('department', $id) SET {} \
             WHERE version = $expected_version",
            sets.join(", ")
        );

        let id_str = id.to_string();
        let tx = begin(&self.db).await?;
        let outcome: OrgResult<Option<Department>> = async {
            let mut builder = tx
                .query(&query)
                .bind(("id", id_str.clone()))
                .bind(("expected_version", expected_version));

            if let Some(name) = input.name {
                builder = builder.bind(("name", name));
            }
            if let Some(description) = input.description {
                builder = builder.bind(("description", description));
            }
            if let Some(head) = input.head_position_id {
                builder = builder.bind(("head_position_id", head.to_string()));
            }

            let result = builder.await.map_err(DbError::from)?;
            let mut result = result.check().map_err(DbError::from_check)?;

            let rows: Vec<DepartmentRow> = result.take(0).map_err(DbError::from)?;
            let Some(row) = rows.into_iter().next() else {
                return Ok(None);
            };
            let department = row.into_department(id)?;

            append_in(&tx, audit(&department)?).await?;
            Ok(Some(department))
        }
        .await;

        match finish(tx, outcome).await? {
            Some(department) => Ok(department),
            None => Err(missing_or_conflict(&self.db, "department", "department", &id_str)
                .await
                .into()),
        }
    }

    async fn deactivate<F>(
        &self,
        id: Uuid,
        expected_version: u64,
        audit: F,
    ) -> OrgResult<(Department, u64)>
    where
        F: FnOnce(&Department, u64) -> OrgResult<CreateChangeLogEntry> + Send,
    {
        let id_str = id.to_string();

        let tx = begin(&self.db).await?;
        let outcome: OrgResult<Option<(Department, u64)>> = async {
            let result = tx
                .query(
                    "UPDATE type::record('department', $id) SET \
                     is_active = false, version += 1, updated_at = time::now() \
                     WHERE version = $expected_version",
                )
                .bind(("id", id_str.clone()))
                .bind(("expected_version", expected_version))
                .await
                .map_err(DbError::from)?;
            let mut result = result.check().map_err(DbError::from_check)?;

            let rows: Vec<DepartmentRow> = result.take(0).map_err(DbError::from)?;
            let Some(row) = rows.into_iter().next() else {
                return Ok(None);
            };
            let department = row.into_department(id)?;

            let result = tx
                .query(
                    "UPDATE position SET \
                     is_active = false, version += 1, updated_at = time::now() \
                     WHERE department_id = $department_id AND is_active = true \
                     RETURN meta::id(id) AS record_id",
                )
                .bind(("department_id", id_str.clone()))
                .await
                .map_err(DbError::from)?;
            let mut result = result.check().map_err(DbError::from_check)?;
            let cascaded: Vec<RecordIdRow> = result.take(0).map_err(DbError::from)?;
            let cascaded = cascaded.len() as u64;
            debug!(department_id = %id, cascaded, "Positions deactivated with department");

            append_in(&tx, audit(&department, cascaded)?).await?;
            Ok(Some((department, cascaded)))
        }
        .await;

        match finish(tx, outcome).await? {
            Some(done) => Ok(done),
            None => Err(missing_or_conflict(&self.db, "department", "department", &id_str)
                .await
                .into()),
        }
    }

    async fn list(
        &self,
        include_inactive: bool,
        pagination: Pagination,
    ) -> OrgResult<PaginatedResult<Department>> {
        let filter = if include_inactive {
            ""
        } else {
            "WHERE is_active = true"
        };

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM department {filter} GROUP ALL"
            ))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM department {filter} \
                 ORDER BY code ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DepartmentRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_department())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
