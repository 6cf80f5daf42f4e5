//! Structural snapshots for the audit trail.
//!
//! A snapshot is a deep JSON copy of an entity's public field set. It is
//! produced through `serde`, so any serializable entity gets one without
//! per-entity code.

use serde::Serialize;

use crate::error::{OrgError, OrgResult};

pub trait Snapshot {
    /// Deep-copy the current field values into a storage-agnostic value.
    fn snapshot(&self) -> OrgResult<serde_json::Value>;
}

impl<T: Serialize> Snapshot for T {
    fn snapshot(&self) -> OrgResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| OrgError::Internal(format!("snapshot failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::department::Department;
    use chrono::Utc;
    use uuid::Uuid;

    fn department() -> Department {
        Department {
            id: Uuid::new_v4(),
            code: "ENG".into(),
            name: "Engineering".into(),
            description: None,
            head_position_id: None,
            is_active: true,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn snapshot_captures_every_field() {
        let dept = department();
        let snap = dept.snapshot().unwrap();
        assert_eq!(snap["code"], "ENG");
        assert_eq!(snap["is_active"], true);
        assert_eq!(snap["version"], 1);
        assert!(snap["description"].is_null());
    }

    #[test]
    fn snapshot_is_detached_from_the_live_entity() {
        let mut dept = department();
        let snap = dept.snapshot().unwrap();
        dept.name = "Platform".into();
        dept.is_active = false;
        assert_eq!(snap["name"], "Engineering");
        assert_eq!(snap["is_active"], true);
    }
}
