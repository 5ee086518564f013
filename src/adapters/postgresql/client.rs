//! PostgreSQL client implementation
//!
//! Connection pooling and query helpers shared by the PostgreSQL gateway.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{Result, SyncError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::{NoTls, Row};

/// Schema applied by [`PostgreSQLClient::ensure_schema`]
const INITIAL_SCHEMA: &str = include_str!("../../../migrations/001_initial_schema.sql");

/// Pooled PostgreSQL client
pub struct PostgreSQLClient {
    pool: Pool,
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// The pool connects lazily; call [`test_connection`](Self::test_connection)
    /// to fail fast on bad settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the pool cannot be built.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                SyncError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
            })?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| SyncError::Database(format!("Failed to create connection pool: {e}")))?;

        Ok(Self { pool, config })
    }

    /// Run `SELECT 1` on a pooled connection
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| SyncError::Database(format!("Connection test failed: {e}")))?;

        tracing::info!(target = %self.connection_string_safe(), "PostgreSQL connection test successful");
        Ok(())
    }

    /// Create tables and indexes if they don't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the migration fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .batch_execute(INITIAL_SCHEMA)
            .await
            .map_err(|e| SyncError::Database(format!("Failed to execute migration: {e}")))?;

        tracing::info!("PostgreSQL schema initialized successfully");
        Ok(())
    }

    /// Get a connection from the pool
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| SyncError::Database(format!("Failed to get connection from pool: {e}")))
    }

    async fn with_timeout(&self) -> Result<deadpool_postgres::Object> {
        let client = self.get_connection().await?;
        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client
            .execute(&timeout_query, &[])
            .await
            .map_err(|e| SyncError::Database(format!("Failed to set statement timeout: {e}")))?;
        Ok(client)
    }

    /// Execute a query and return rows
    pub async fn query(
        &self,
        query: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Vec<Row>> {
        let client = self.with_timeout().await?;

        client
            .query(query, params)
            .await
            .map_err(|e| SyncError::Database(format!("Query failed: {e}")))
    }

    /// Execute a query expecting at most one row
    pub async fn query_opt(
        &self,
        query: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Option<Row>> {
        let client = self.with_timeout().await?;

        client
            .query_opt(query, params)
            .await
            .map_err(|e| SyncError::Database(format!("Query failed: {e}")))
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(
        &self,
        statement: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<u64> {
        let client = self.with_timeout().await?;

        client
            .execute(statement, params)
            .await
            .map_err(|e| SyncError::Database(format!("Statement execution failed: {e}")))
    }

    /// Connection target with credentials redacted
    pub fn connection_string_safe(&self) -> String {
        redact_connection_string(self.config.connection_string.expose_secret().as_ref())
    }
}

/// Hide credentials in a connection string for display
pub fn redact_connection_string(connection_string: &str) -> String {
    match connection_string.rsplit_once('@') {
        Some((_, host)) => format!("postgresql://***@{host}"),
        None => "postgresql://***".to_string(),
    }
}
