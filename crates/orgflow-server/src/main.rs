//! orgflow server: application entry point.
//!
//! Connects to SurrealDB, applies migrations and wires the workflow
//! services into [`Services`]. HTTP routing is provided by the embedding
//! application.

use orgflow_core::TransitionTable;
use orgflow_db::{DbConfig, DbManager};
use orgflow_server::Services;
use orgflow_workflow::WorkflowConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("orgflow=info".parse()?))
        .json()
        .init();

    tracing::info!("Starting orgflow server...");

    let db_config = DbConfig::from_env();
    let manager = DbManager::connect(&db_config).await.inspect_err(|e| {
        tracing::error!(error = %e, "Failed to connect to SurrealDB");
    })?;
    let db = manager.client().clone();

    orgflow_db::run_migrations(&db).await.inspect_err(|e| {
        tracing::error!(error = %e, "Schema migration failed");
    })?;

    let workflow_config = WorkflowConfig::default();
    let transitions = TransitionTable::default();
    tracing::info!(
        reject_reporting_cycles = workflow_config.reject_reporting_cycles,
        max_reporting_depth = workflow_config.max_reporting_depth,
        "Workflow configuration loaded"
    );

    let services = Services::new(db, workflow_config, transitions);
    tracing::info!("orgflow services ready");

    tokio::signal::ctrl_c().await?;

    drop(services);
    tracing::info!("orgflow server stopped.");
    Ok(())
}
