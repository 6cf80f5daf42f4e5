//! Connection to the orgflow SurrealDB instance.
//!
//! The server talks to a remote SurrealDB over WebSocket; tests use the
//! in-memory engine directly and never go through [`DbManager`].

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

/// Where the organization store lives and how to sign in to it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `host:port` of the SurrealDB WebSocket endpoint.
    pub url: String,
    /// Defaults to `orgflow`.
    pub namespace: String,
    /// Holds the departments, positions, change requests and change log.
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "orgflow".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Read `ORGFLOW_DB_URL`, `ORGFLOW_DB_NAMESPACE`, `ORGFLOW_DB_DATABASE`,
    /// `ORGFLOW_DB_USERNAME` and `ORGFLOW_DB_PASSWORD`, keeping the
    /// default for any variable that is unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            url: lookup("ORGFLOW_DB_URL").unwrap_or(defaults.url),
            namespace: lookup("ORGFLOW_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: lookup("ORGFLOW_DB_DATABASE").unwrap_or(defaults.database),
            username: lookup("ORGFLOW_DB_USERNAME").unwrap_or(defaults.username),
            password: lookup("ORGFLOW_DB_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

/// Signed-in client shared by every orgflow repository.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Open the WebSocket, sign in with root credentials and select the
    /// orgflow namespace and database. Migrations are run separately.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!(namespace = %config.namespace, "orgflow store connected");

        Ok(Self { db })
    }

    /// Clone this into each `Surreal*Repository`.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        let config = DbConfig::from_lookup(|key| match key {
            "ORGFLOW_DB_URL" => Some("db.internal:8000".into()),
            "ORGFLOW_DB_DATABASE" => Some("hr".into()),
            _ => None,
        });
        assert_eq!(config.url, "db.internal:8000");
        assert_eq!(config.database, "hr");
        assert_eq!(config.namespace, "orgflow");
        assert_eq!(config.username, "root");
    }
}
