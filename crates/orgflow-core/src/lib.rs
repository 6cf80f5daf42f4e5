//! orgflow core: domain models, error taxonomy, repository traits and
//! the change-request transition table.
//!
//! Nothing in this crate performs I/O. Storage lives in `orgflow-db`
//! and orchestration (auditing, cascades, state machine) lives in
//! `orgflow-workflow`.

pub mod error;
pub mod models;
pub mod repository;
pub mod snapshot;
pub mod transition;

pub use error::{OrgError, OrgResult};
pub use transition::TransitionTable;
