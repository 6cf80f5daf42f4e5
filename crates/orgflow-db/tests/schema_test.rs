//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    orgflow_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    for table in [
        "department",
        "position",
        "position_assignment",
        "structure_change_request",
        "structure_approval",
        "change_log",
        "_migration",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    // Run twice; should not fail.
    orgflow_db::run_migrations(&db).await.unwrap();
    orgflow_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn defaults_apply_on_create() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgflow_db::run_migrations(&db).await.unwrap();

    db.query("CREATE department SET code = 'ENG', name = 'Engineering'")
        .await
        .unwrap()
        .check()
        .unwrap();

    let mut result = db
        .query("SELECT is_active, version FROM department WHERE code = 'ENG'")
        .await
        .unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1);
    let rendered = format!("{:?}", records[0]);
    assert!(rendered.contains("true"), "is_active should default to true: {rendered}");
}

#[tokio::test]
async fn unique_index_prevents_duplicate_department_codes() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgflow_db::run_migrations(&db).await.unwrap();

    db.query("CREATE department SET code = 'ENG', name = 'Engineering'")
        .await
        .unwrap()
        .check()
        .unwrap();

    let result = db
        .query("CREATE department SET code = 'ENG', name = 'Other Engineering'")
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "duplicate code should be rejected");
}

#[tokio::test]
async fn status_assert_rejects_unknown_values() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgflow_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE structure_change_request SET \
             request_number = 'CR-1', \
             requested_by_employee_id = 'someone', \
             request_type = 'CREATE_DEPARTMENT', \
             status = 'PENDING'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "unknown status should be rejected");
}

#[tokio::test]
async fn one_approval_per_request_and_approver() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgflow_db::run_migrations(&db).await.unwrap();

    let insert = "CREATE structure_approval SET \
                  change_request_id = 'cr-1', \
                  approver_employee_id = 'emp-1', \
                  decision = 'APPROVE', \
                  decided_at = time::now()";

    db.query(insert).await.unwrap().check().unwrap();
    let result = db.query(insert).await.unwrap().check();

    assert!(result.is_err(), "second approval row should be rejected");
}
