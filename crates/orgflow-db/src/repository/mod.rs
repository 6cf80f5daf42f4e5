//! SurrealDB repository implementations.

mod approval;
mod assignment;
mod change_log;
mod change_request;
mod department;
mod position;

pub use approval::SurrealApprovalRepository;
pub use assignment::SurrealPositionAssignmentRepository;
pub use change_log::SurrealChangeLogRepository;
pub use change_request::SurrealChangeRequestRepository;
pub use department::SurrealDepartmentRepository;
pub use position::SurrealPositionRepository;

use orgflow_core::error::OrgResult;
use surrealdb::method::Transaction;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::warn;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Row struct for existence checks.
#[derive(Debug, SurrealValue)]
struct RecordIdRow {
    #[allow(dead_code)]
    record_id: String,
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

fn parse_opt_uuid(value: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    value.map(|v| parse_uuid(&v, field)).transpose()
}

async fn begin<C: Connection>(db: &Surreal<C>) -> Result<Transaction<C>, DbError> {
    db.clone().begin().await.map_err(DbError::from)
}

/// Commit on success, cancel on failure.
async fn finish<C: Connection, T>(tx: Transaction<C>, outcome: OrgResult<T>) -> OrgResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await.map_err(DbError::from)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(cancel) = tx.cancel().await {
                warn!(error = %cancel, "Failed to cancel transaction");
            }
            Err(e)
        }
    }
}

/// Explain why a versioned `UPDATE ... WHERE version = $expected_version`
/// touched no rows: the record is either gone or was written by someone
/// else since the caller read it.
async fn missing_or_conflict<C: Connection>(
    db: &Surreal<C>,
    table: &'static str,
    entity: &str,
    id: &str,
) -> DbError {
    let lookup = db
        .query("SELECT meta::id(id) AS record_id FROM type::record($table, $id)")
        .bind(("table", table))
        .bind(("id", id.to_string()))
        .await;

    let rows: Result<Vec<RecordIdRow>, DbError> = match lookup {
        Ok(mut result) => result.take(0).map_err(DbError::from),
        Err(e) => Err(DbError::from(e)),
    };

    match rows {
        Ok(rows) if rows.is_empty() => DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        },
        Ok(_) => DbError::Conflict {
            entity: entity.into(),
            id: id.into(),
        },
        Err(e) => e,
    }
}
