//! SurrealDB implementation of [`PositionRepository`].

use chrono::{DateTime, Utc};
use orgflow_core::error::OrgResult;
use orgflow_core::models::change_log::CreateChangeLogEntry;
use orgflow_core::models::position::{CreatePosition, Position, UpdatePosition};
use orgflow_core::repository::PositionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::assignment::close_open_assignments;
use super::change_log::append_in;
use super::{begin, finish, missing_or_conflict, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PositionRow {
    code: String,
    title: String,
    description: Option<String>,
    department_id: String,
    reports_to_position_id: Option<String>,
    is_active: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PositionRowWithId {
    record_id: String,
    code: String,
    title: String,
    description: Option<String>,
    department_id: String,
    reports_to_position_id: Option<String>,
    is_active: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn row_to_position(row: PositionRow, id: Uuid) -> Result<Position, DbError> {
    Ok(Position {
        id,
        code: row.code,
        title: row.title,
        description: row.description,
        department_id: parse_uuid(&row.department_id, "department")?,
        reports_to_position_id: parse_opt_uuid(row.reports_to_position_id, "reports-to")?,
        is_active: row.is_active,
        version: row.version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl PositionRowWithId {
    fn try_into_position(self) -> Result<Position, DbError> {
        let id = parse_uuid(&self.record_id, "position")?;
        row_to_position(
            PositionRow {
                code: self.code,
                title: self.title,
                description: self.description,
                department_id: self.department_id,
                reports_to_position_id: self.reports_to_position_id,
                is_active: self.is_active,
                version: self.version,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the Position repository.
#[derive(Clone)]
pub struct SurrealPositionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPositionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn list_where(
        &self,
        clause: &str,
        key: &'static str,
        value: Uuid,
    ) -> OrgResult<Vec<Position>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM position \
                 WHERE {clause} ORDER BY code ASC"
            ))
            .bind((key, value.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PositionRowWithId> = result.take(0).map_err(DbError::from)?;
        let positions = rows
            .into_iter()
            .map(|row| row.try_into_position())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(positions)
    }
}

impl<C: Connection> PositionRepository for SurrealPositionRepository<C> {
    async fn create<F>(&self, input: CreatePosition, audit: F) -> OrgResult<Position>
    where
        F: FnOnce(&Position) -> OrgResult<CreateChangeLogEntry> + Send,
    {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let tx = begin(&self.db).await?;
        let outcome: OrgResult<Position> = async {
            let result = tx
                .query(
                    "CREATE type::record('position', $id) SET \
                     code = $code, title = $title, \
                     description = $description, \
                     department_id = $department_id, \
                     reports_to_position_id = $reports_to_position_id, \
                     is_active = true, version = 1",
                )
                .bind(("id", id_str.clone()))
                .bind(("code", input.code))
                .bind(("title", input.title))
                .bind(("description", input.description))
                .bind(("department_id", input.department_id.to_string()))
                .bind((
                    "reports_to_position_id",
                    input.reports_to_position_id.map(|p| p.to_string()),
                ))
                .await
                .map_err(DbError::from)?;

            let mut result = result.check().map_err(DbError::from_check)?;

            let rows: Vec<PositionRow> = result.take(0).map_err(DbError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                entity: "position".into(),
                id: id_str.clone(),
            })?;
            let position = row_to_position(row, id)?;

            append_in(&tx, audit(&position)?).await?;
            Ok(position)
        }
        .await;

        finish(tx, outcome).await
    }

    async fn get_by_id(&self, id: Uuid) -> OrgResult<Position> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('position', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PositionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "position".into(),
            id: id_str,
        })?;

        Ok(row_to_position(row, id)?)
    }

    async fn update<F>(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdatePosition,
        audit: F,
    ) -> OrgResult<Position>
    where
        F: FnOnce(&Position) -> OrgResult<CreateChangeLogEntry> + Send,
    {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.department_id.is_some() {
            sets.push("department_id = $department_id");
        }
        if input.reports_to_position_id.is_some() {
            sets.push("reports_to_position_id = $reports_to_position_id");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("version += 1");
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('position', $id) SET {} \
             WHERE version = $expected_version",
            sets.join(", ")
        );

        let tx = begin(&self.db).await?;
        let outcome: OrgResult<Option<Position>> = async {
            let mut builder = tx
                .query(&query)
                .bind(("id", id_str.clone()))
                .bind(("expected_version", expected_version));

            if let Some(title) = input.title {
                builder = builder.bind(("title", title));
            }
            if let Some(description) = input.description {
                builder = builder.bind(("description", description));
            }
            if let Some(department_id) = input.department_id {
                builder = builder.bind(("department_id", department_id.to_string()));
            }
            if let Some(manager) = input.reports_to_position_id {
                builder = builder.bind(("reports_to_position_id", manager.to_string()));
            }
            if let Some(is_active) = input.is_active {
                builder = builder.bind(("is_active", is_active));
            }

            let result = builder.await.map_err(DbError::from)?;
            let mut result = result.check().map_err(DbError::from_check)?;

            let rows: Vec<PositionRow> = result.take(0).map_err(DbError::from)?;
            let Some(row) = rows.into_iter().next() else {
                return Ok(None);
            };
            let position = row_to_position(row, id)?;

            append_in(&tx, audit(&position)?).await?;
            Ok(Some(position))
        }
        .await;

        match finish(tx, outcome).await? {
            Some(position) => Ok(position),
            None => Err(missing_or_conflict(&self.db, "position", "position", &id_str)
                .await
                .into()),
        }
    }

    async fn deactivate<F>(
        &self,
        id: Uuid,
        expected_version: u64,
        end_date: DateTime<Utc>,
        audit: F,
    ) -> OrgResult<(Position, u64)>
    where
        F: FnOnce(&Position, u64) -> OrgResult<CreateChangeLogEntry> + Send,
    {
        let id_str = id.to_string();

        let tx = begin(&self.db).await?;
        let outcome: OrgResult<Option<(Position, u64)>> = async {
            let result = tx
                .query(
                    "UPDATE type::record('position', $id) SET \
                     is_active = false, version += 1, updated_at = time::now() \
                     WHERE version = $expected_version",
                )
                .bind(("id", id_str.clone()))
                .bind(("expected_version", expected_version))
                .await
                .map_err(DbError::from)?;
            let mut result = result.check().map_err(DbError::from_check)?;

            let rows: Vec<PositionRow> = result.take(0).map_err(DbError::from)?;
            let Some(row) = rows.into_iter().next() else {
                return Ok(None);
            };
            let position = row_to_position(row, id)?;

            let closed = close_open_assignments(&tx, id, end_date).await?;
            append_in(&tx, audit(&position, closed)?).await?;
            Ok(Some((position, closed)))
        }
        .await;

        match finish(tx, outcome).await? {
            Some(done) => Ok(done),
            None => Err(missing_or_conflict(&self.db, "position", "position", &id_str)
                .await
                .into()),
        }
    }

    async fn list_by_department(&self, department_id: Uuid) -> OrgResult<Vec<Position>> {
        self.list_where("department_id = $department_id", "department_id", department_id)
            .await
    }

    async fn list_direct_reports(&self, manager_id: Uuid) -> OrgResult<Vec<Position>> {
        self.list_where(
            "reports_to_position_id = $manager_id",
            "manager_id",
            manager_id,
        )
        .await
    }
}
