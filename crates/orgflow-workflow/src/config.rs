//! Workflow configuration.

/// Configuration for the organization-structure services.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Refuse a `reports_to_position_id` that would close a loop in the
    /// reporting hierarchy (default: true).
    pub reject_reporting_cycles: bool,
    /// Maximum number of reports-to hops followed when validating or
    /// walking a reporting chain (default: 64).
    pub max_reporting_depth: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            reject_reporting_cycles: true,
            max_reporting_depth: 64,
        }
    }
}
