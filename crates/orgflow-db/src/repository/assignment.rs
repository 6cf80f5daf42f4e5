//! SurrealDB implementation of [`PositionAssignmentRepository`].

use chrono::{DateTime, Utc};
use orgflow_core::error::OrgResult;
use orgflow_core::models::assignment::{CreatePositionAssignment, PositionAssignment};
use orgflow_core::repository::PositionAssignmentRepository;
use surrealdb::method::Transaction;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{begin, finish, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AssignmentRow {
    position_id: String,
    employee_id: String,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AssignmentRowWithId {
    record_id: String,
    position_id: String,
    employee_id: String,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

fn row_to_assignment(row: AssignmentRow, id: Uuid) -> Result<PositionAssignment, DbError> {
    Ok(PositionAssignment {
        id,
        position_id: parse_uuid(&row.position_id, "position")?,
        employee_id: parse_uuid(&row.employee_id, "employee")?,
        start_date: row.start_date,
        end_date: row.end_date,
        created_at: row.created_at,
    })
}

impl AssignmentRowWithId {
    fn try_into_assignment(self) -> Result<PositionAssignment, DbError> {
        let id = parse_uuid(&self.record_id, "assignment")?;
        row_to_assignment(
            AssignmentRow {
                position_id: self.position_id,
                employee_id: self.employee_id,
                start_date: self.start_date,
                end_date: self.end_date,
                created_at: self.created_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the PositionAssignment repository.
#[derive(Clone)]
pub struct SurrealPositionAssignmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPositionAssignmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PositionAssignmentRepository for SurrealPositionAssignmentRepository<C> {
    async fn create(&self, input: CreatePositionAssignment) -> OrgResult<PositionAssignment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // end_date is only written when known so open assignments keep
        // the field as NONE.
        let query = if input.end_date.is_some() {
            "CREATE type::record('position_assignment', $id) SET \
             position_id = $position_id, employee_id = $employee_id, \
             start_date = $start_date, end_date = $end_date"
        } else {
            "CREATE type::record('position_assignment', $id) SET \
             position_id = $position_id, employee_id = $employee_id, \
             start_date = $start_date"
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("position_id", input.position_id.to_string()))
            .bind(("employee_id", input.employee_id.to_string()))
            .bind(("start_date", input.start_date));
        if let Some(end_date) = input.end_date {
            builder = builder.bind(("end_date", end_date));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from_check)?;

        let rows: Vec<AssignmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "position_assignment".into(),
            id: id_str,
        })?;

        Ok(row_to_assignment(row, id)?)
    }

    async fn list_by_position(&self, position_id: Uuid) -> OrgResult<Vec<PositionAssignment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM position_assignment \
                 WHERE position_id = $position_id \
                 ORDER BY start_date ASC",
            )
            .bind(("position_id", position_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AssignmentRowWithId> = result.take(0).map_err(DbError::from)?;
        let assignments = rows
            .into_iter()
            .map(|row| row.try_into_assignment())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(assignments)
    }

    async fn close_open_for_position(
        &self,
        position_id: Uuid,
        end_date: DateTime<Utc>,
    ) -> OrgResult<u64> {
        let tx = begin(&self.db).await?;
        let outcome: OrgResult<u64> = close_open_assignments(&tx, position_id, end_date)
            .await
            .map_err(Into::into);
        finish(tx, outcome).await
    }
}

/// Stamp `end_date` on the open assignments of a position inside `tx`.
pub(super) async fn close_open_assignments<C: Connection>(
    tx: &Transaction<C>,
    position_id: Uuid,
    end_date: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = tx
        .query(
            "UPDATE position_assignment SET end_date = $end_date \
             WHERE position_id = $position_id AND end_date = NONE",
        )
        .bind(("position_id", position_id.to_string()))
        .bind(("end_date", end_date))
        .await?;
    let mut result = result.check().map_err(DbError::from_check)?;

    let rows: Vec<AssignmentRow> = result.take(0)?;

    Ok(rows.len() as u64)
}
