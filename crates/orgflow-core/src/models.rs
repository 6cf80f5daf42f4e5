//! Domain models for orgflow.
//!
//! Departments and positions form the organization structure; change
//! requests and approvals track proposals against it; change-log
//! entries record every mutation.

pub mod approval;
pub mod assignment;
pub mod change_log;
pub mod change_request;
pub mod department;
pub mod position;
