//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: organization structure, change requests, change log
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Departments (never deleted, deactivated via is_active)
-- =======================================================================
DEFINE TABLE department SCHEMAFULL;
DEFINE FIELD code ON TABLE department TYPE string;
DEFINE FIELD name ON TABLE department TYPE string;
DEFINE FIELD description ON TABLE department TYPE option<string>;
DEFINE FIELD head_position_id ON TABLE department TYPE option<string>;
DEFINE FIELD is_active ON TABLE department TYPE bool DEFAULT true;
DEFINE FIELD version ON TABLE department TYPE int DEFAULT 1;
DEFINE FIELD created_at ON TABLE department TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE department TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_department_code ON TABLE department \
    COLUMNS code UNIQUE;

-- =======================================================================
-- Positions (owned by a department, optional reports-to hierarchy)
-- =======================================================================
DEFINE TABLE position SCHEMAFULL;
DEFINE FIELD code ON TABLE position TYPE string;
DEFINE FIELD title ON TABLE position TYPE string;
DEFINE FIELD description ON TABLE position TYPE option<string>;
DEFINE FIELD department_id ON TABLE position TYPE string;
DEFINE FIELD reports_to_position_id ON TABLE position \
    TYPE option<string>;
DEFINE FIELD is_active ON TABLE position TYPE bool DEFAULT true;
DEFINE FIELD version ON TABLE position TYPE int DEFAULT 1;
DEFINE FIELD created_at ON TABLE position TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE position TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_position_code ON TABLE position COLUMNS code UNIQUE;
DEFINE INDEX idx_position_department ON TABLE position \
    COLUMNS department_id;
DEFINE INDEX idx_position_reports_to ON TABLE position \
    COLUMNS reports_to_position_id;

-- =======================================================================
-- Position assignments (open while end_date is NONE)
-- =======================================================================
DEFINE TABLE position_assignment SCHEMAFULL;
DEFINE FIELD position_id ON TABLE position_assignment TYPE string;
DEFINE FIELD employee_id ON TABLE position_assignment TYPE string;
DEFINE FIELD start_date ON TABLE position_assignment TYPE datetime;
DEFINE FIELD end_date ON TABLE position_assignment \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE position_assignment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_assignment_position ON TABLE position_assignment \
    COLUMNS position_id;

-- =======================================================================
-- Structure change requests
-- =======================================================================
DEFINE TABLE structure_change_request SCHEMAFULL;
DEFINE FIELD request_number ON TABLE structure_change_request \
    TYPE string;
DEFINE FIELD requested_by_employee_id ON TABLE structure_change_request \
    TYPE string;
DEFINE FIELD request_type ON TABLE structure_change_request TYPE string \
    ASSERT $value IN ['CREATE_DEPARTMENT', 'UPDATE_DEPARTMENT', \
    'DEACTIVATE_DEPARTMENT', 'CREATE_POSITION', 'UPDATE_POSITION', \
    'MOVE_POSITION', 'DEACTIVATE_POSITION', 'OTHER'];
DEFINE FIELD target_department_id ON TABLE structure_change_request \
    TYPE option<string>;
DEFINE FIELD target_position_id ON TABLE structure_change_request \
    TYPE option<string>;
DEFINE FIELD details ON TABLE structure_change_request \
    TYPE option<string>;
DEFINE FIELD reason ON TABLE structure_change_request \
    TYPE option<string>;
DEFINE FIELD status ON TABLE structure_change_request TYPE string \
    ASSERT $value IN ['DRAFT', 'SUBMITTED', 'UNDER_REVIEW', 'APPROVED', \
    'REJECTED', 'CANCELED', 'IMPLEMENTED'];
DEFINE FIELD submitted_by_employee_id ON TABLE structure_change_request \
    TYPE option<string>;
DEFINE FIELD submitted_at ON TABLE structure_change_request \
    TYPE option<datetime>;
DEFINE FIELD version ON TABLE structure_change_request TYPE int \
    DEFAULT 1;
DEFINE FIELD created_at ON TABLE structure_change_request \
    TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE structure_change_request \
    TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_change_request_number ON TABLE structure_change_request \
    COLUMNS request_number UNIQUE;
DEFINE INDEX idx_change_request_status ON TABLE structure_change_request \
    COLUMNS status;

-- =======================================================================
-- Structure approvals (one decision per request and approver)
-- =======================================================================
DEFINE TABLE structure_approval SCHEMAFULL;
DEFINE FIELD change_request_id ON TABLE structure_approval TYPE string;
DEFINE FIELD approver_employee_id ON TABLE structure_approval \
    TYPE string;
DEFINE FIELD decision ON TABLE structure_approval TYPE string \
    ASSERT $value IN ['APPROVE', 'REJECT', 'ABSTAIN'];
DEFINE FIELD decided_at ON TABLE structure_approval TYPE datetime;
DEFINE FIELD comments ON TABLE structure_approval TYPE option<string>;
DEFINE FIELD created_at ON TABLE structure_approval TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE structure_approval TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_approval_request_approver ON TABLE structure_approval \
    COLUMNS change_request_id, approver_employee_id UNIQUE;

-- =======================================================================
-- Change log (append-only)
-- =======================================================================
DEFINE TABLE change_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD action ON TABLE change_log TYPE string \
    ASSERT $value IN ['CREATED', 'UPDATED', 'DEACTIVATED'];
DEFINE FIELD entity_type ON TABLE change_log TYPE string \
    ASSERT $value IN ['Department', 'Position', \
    'StructureChangeRequest', 'StructureApproval'];
DEFINE FIELD entity_id ON TABLE change_log TYPE string;
DEFINE FIELD performed_by_employee_id ON TABLE change_log \
    TYPE option<string>;
DEFINE FIELD before_snapshot ON TABLE change_log \
    TYPE option<object> FLEXIBLE;
DEFINE FIELD after_snapshot ON TABLE change_log \
    TYPE option<object> FLEXIBLE;
DEFINE FIELD summary ON TABLE change_log TYPE string;
DEFINE FIELD timestamp ON TABLE change_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_change_log_entity ON TABLE change_log \
    COLUMNS entity_type, entity_id;
DEFINE INDEX idx_change_log_time ON TABLE change_log \
    COLUMNS timestamp;
";

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn schema_v1_defines_every_table() {
        for table in [
            "department",
            "position",
            "position_assignment",
            "structure_change_request",
            "structure_approval",
            "change_log",
        ] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} SCHEMAFULL")),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
