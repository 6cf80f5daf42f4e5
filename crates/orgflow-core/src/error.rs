//! Error types shared by every orgflow crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrgError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Illegal transition for {entity}: {from} -> {to}")]
    IllegalTransition {
        entity: String,
        from: String,
        to: String,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The record changed since the caller read it.
    #[error("Concurrent modification of {entity} with id {id}")]
    Conflict { entity: String, id: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrgError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        OrgError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        OrgError::Validation {
            message: message.into(),
        }
    }

    /// Whether the failure was caused by the caller's input rather than
    /// the environment. Client errors are never worth retrying unchanged.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OrgError::NotFound { .. }
                | OrgError::IllegalTransition { .. }
                | OrgError::Validation { .. }
                | OrgError::Conflict { .. }
        )
    }
}

pub type OrgResult<T> = Result<T, OrgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_transition_names_both_states() {
        let err = OrgError::IllegalTransition {
            entity: "StructureChangeRequest".into(),
            from: "SUBMITTED".into(),
            to: "APPROVED".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SUBMITTED"));
        assert!(msg.contains("APPROVED"));
    }

    #[test]
    fn database_errors_are_not_client_errors() {
        assert!(OrgError::not_found("Department", "x").is_client_error());
        assert!(OrgError::validation("bad").is_client_error());
        assert!(!OrgError::Database("down".into()).is_client_error());
    }
}
