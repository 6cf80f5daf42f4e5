//! Database-specific error types and conversions.

use orgflow_core::error::OrgError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// A unique index rejected the write.
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    /// A stored value could not be mapped back onto a domain type.
    #[error("Corrupt record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Version conflict: {entity} with id {id}")]
    Conflict { entity: String, id: String },
}

impl DbError {
    /// Classify the error reported by `Response::check`.
    pub(crate) fn from_check(err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        if is_unique_violation(&message) {
            DbError::Duplicate(message)
        } else {
            DbError::Query(message)
        }
    }
}

/// Unique-index rejections reach `check` as text only. SurrealDB 3.3
/// words them "Database index `idx_...` already contains ..."; the
/// schema's `idx_` index prefix is accepted as a second marker.
fn is_unique_violation(message: &str) -> bool {
    message.contains("already contains") || message.contains("index `idx_")
}

impl From<DbError> for OrgError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => OrgError::NotFound { entity, id },
            DbError::Conflict { entity, id } => OrgError::Conflict { entity, id },
            DbError::Duplicate(message) => OrgError::Validation { message },
            other => OrgError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_index_violation_becomes_validation_error() {
        let err = DbError::from_check(
            "Database index `idx_department_code` already contains 'ENG', with record `department:abc`",
        );
        assert!(matches!(
            OrgError::from(err),
            OrgError::Validation { .. }
        ));
    }

    #[test]
    fn index_name_alone_marks_a_unique_violation() {
        let err = DbError::from_check(
            "Unique index `idx_change_request_number` rejected value 'CR-1'",
        );
        assert!(matches!(err, DbError::Duplicate(_)));
    }

    #[test]
    fn other_check_failures_are_database_errors() {
        let err = DbError::from_check("Found NONE for field `name`");
        assert!(matches!(OrgError::from(err), OrgError::Database(_)));
    }
}
