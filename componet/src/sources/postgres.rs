//! PostgreSQL catalog table through `datafusion-table-providers`.

use crate::config::StoreConfig;
use crate::error::{ComponetError, Result};
use crate::security::SecureString;
use datafusion::catalog::TableProvider;
use datafusion::sql::TableReference;
use datafusion_table_providers::{
    postgres::PostgresTableFactory, sql::db_connection_pool::postgrespool::PostgresConnectionPool,
    util::secrets::to_secret_map,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Environment variable the database password is read from.
pub const PASSWORD_ENV: &str = "COMPONET_PG_PASSWORD";

/// Connection parameters for the catalog database.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: SecureString,
    pub sslmode: Option<String>,
}

impl PostgresConfig {
    /// Builds connection parameters from a `postgres` store entry and the
    /// password in [`PASSWORD_ENV`].
    pub fn from_store_config(store: &StoreConfig) -> Result<Self> {
        let StoreConfig::Postgres {
            host,
            port,
            database,
            username,
            sslmode,
        } = store
        else {
            return Err(ComponetError::Configuration(
                "store is not a PostgreSQL store".to_string(),
            ));
        };
        let password = std::env::var(PASSWORD_ENV).map_err(|_| {
            ComponetError::Configuration(format!("{PASSWORD_ENV} must be set for the PostgreSQL store"))
        })?;

        Ok(Self {
            host: host.clone(),
            port: *port,
            database: database.clone(),
            username: username.clone(),
            password: SecureString::new(password),
            sslmode: sslmode.clone(),
        })
    }
}

/// Opens a pooled connection and returns a provider for `table`.
#[instrument(skip(config), fields(host = %config.host, database = %config.database))]
pub(crate) async fn table_provider(
    config: &PostgresConfig,
    table: &str,
) -> Result<Arc<dyn TableProvider>> {
    let mut params = HashMap::new();
    params.insert("host".to_string(), config.host.clone());
    params.insert("port".to_string(), config.port.to_string());
    params.insert("db".to_string(), config.database.clone());
    params.insert("user".to_string(), config.username.clone());
    params.insert("pass".to_string(), config.password.expose().to_string());
    if let Some(ssl) = &config.sslmode {
        params.insert("sslmode".to_string(), ssl.clone());
    }

    let pool = Arc::new(
        PostgresConnectionPool::new(to_secret_map(params))
            .await
            .map_err(|e| {
                ComponetError::data_source_with_source(
                    "PostgreSQL",
                    format!("failed to create connection pool: {e}"),
                    Box::new(e),
                )
            })?,
    );

    PostgresTableFactory::new(pool)
        .table_provider(TableReference::from(table))
        .await
        .map_err(|e| {
            ComponetError::data_source("PostgreSQL", format!("no provider for '{table}': {e}"))
        })
}
