//! Integration tests for the append-only change log repository.

use chrono::{Duration, Utc};
use orgflow_core::models::change_log::{AuditEntityType, ChangeAction, CreateChangeLogEntry};
use orgflow_core::repository::{ChangeLogFilter, ChangeLogRepository, Pagination};
use orgflow_db::repository::SurrealChangeLogRepository;
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgflow_db::run_migrations(&db).await.unwrap();
    db
}

fn entry(
    action: ChangeAction,
    entity_type: AuditEntityType,
    entity_id: Uuid,
    summary: &str,
) -> CreateChangeLogEntry {
    CreateChangeLogEntry {
        action,
        entity_type,
        entity_id,
        performed_by_employee_id: None,
        before_snapshot: None,
        after_snapshot: Some(json!({ "summary": summary })),
        summary: summary.into(),
    }
}

#[tokio::test]
async fn append_round_trips_nested_snapshots() {
    let repo = SurrealChangeLogRepository::new(setup().await);
    let actor = Uuid::new_v4();
    let before = json!({ "name": "Eng", "tags": ["a", "b"], "meta": { "depth": 2 } });
    let after = json!({ "name": "Engineering", "tags": ["a"], "meta": { "depth": 3 } });

    let saved = repo
        .append(CreateChangeLogEntry {
            action: ChangeAction::Updated,
            entity_type: AuditEntityType::Department,
            entity_id: Uuid::new_v4(),
            performed_by_employee_id: Some(actor),
            before_snapshot: Some(before.clone()),
            after_snapshot: Some(after.clone()),
            summary: "Department ENG updated".into(),
        })
        .await
        .unwrap();

    assert_eq!(saved.before_snapshot, Some(before));
    assert_eq!(saved.after_snapshot, Some(after));
    assert_eq!(saved.performed_by_employee_id, Some(actor));
}

#[tokio::test]
async fn list_is_in_insertion_order_and_filterable() {
    let repo = SurrealChangeLogRepository::new(setup().await);
    let dept = Uuid::new_v4();
    let pos = Uuid::new_v4();

    for (action, entity_type, id, summary) in [
        (ChangeAction::Created, AuditEntityType::Department, dept, "one"),
        (ChangeAction::Created, AuditEntityType::Position, pos, "two"),
        (ChangeAction::Updated, AuditEntityType::Department, dept, "three"),
        (ChangeAction::Deactivated, AuditEntityType::Department, dept, "four"),
    ] {
        repo.append(entry(action, entity_type, id, summary))
            .await
            .unwrap();
    }

    let all = repo
        .list(ChangeLogFilter::default(), Pagination::default())
        .await
        .unwrap();
    let summaries: Vec<_> = all.items.iter().map(|e| e.summary.as_str()).collect();
    assert_eq!(summaries, vec!["one", "two", "three", "four"]);

    let dept_only = repo
        .list(
            ChangeLogFilter {
                entity_type: Some(AuditEntityType::Department),
                entity_id: Some(dept),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(dept_only.total, 3);

    let deactivations = repo
        .list(
            ChangeLogFilter {
                action: Some(ChangeAction::Deactivated),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(deactivations.total, 1);
    assert_eq!(deactivations.items[0].summary, "four");

    let future = repo
        .list(
            ChangeLogFilter {
                from: Some(Utc::now() + Duration::hours(1)),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(future.total, 0);

    let second_page = repo
        .list(ChangeLogFilter::default(), Pagination { offset: 2, limit: 2 })
        .await
        .unwrap();
    assert_eq!(second_page.total, 4);
    assert_eq!(second_page.items[0].summary, "three");
}

#[tokio::test]
async fn appending_identical_content_creates_distinct_entries() {
    let repo = SurrealChangeLogRepository::new(setup().await);
    let id = Uuid::new_v4();
    let a = repo
        .append(entry(ChangeAction::Updated, AuditEntityType::Position, id, "x"))
        .await
        .unwrap();
    let b = repo
        .append(entry(ChangeAction::Updated, AuditEntityType::Position, id, "x"))
        .await
        .unwrap();
    assert_ne!(a.id, b.id);
    assert!(a.timestamp <= b.timestamp);
}
