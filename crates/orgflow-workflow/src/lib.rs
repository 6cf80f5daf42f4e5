//! orgflow workflow: the organization-structure entity store, the
//! change-request state machine, the approval ledger and the audit log
//! writer they all report to.

pub mod approval;
pub mod audit;
pub mod change_request;
pub mod config;
pub mod error;
pub mod structure;

pub use approval::{ApprovalLedger, DecisionInput};
pub use audit::{AuditContext, AuditTrail};
pub use change_request::ChangeRequestService;
pub use config::WorkflowConfig;
pub use error::WorkflowError;
pub use structure::OrgStructureService;
