//! Persistence gateway factory
//!
//! Builds the gateway selected by `[store] backend`.

use crate::adapters::gateway::memory::InMemoryGateway;
use crate::adapters::gateway::traits::PersistenceGateway;
use crate::adapters::postgresql::{PostgreSQLClient, PostgresGateway};
use crate::config::schema::{StoreBackend, SyncConfig};
use crate::domain::{Result, SyncError};
use std::sync::Arc;

/// Create a persistence gateway based on the configuration
///
/// The PostgreSQL backend verifies connectivity and applies the schema before
/// returning.
///
/// # Errors
///
/// Returns a configuration error when the PostgreSQL backend is selected
/// without a `[postgresql]` section, or a database error if the connection
/// or migration fails.
pub async fn create_gateway(config: &SyncConfig) -> Result<Arc<dyn PersistenceGateway>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Creating in-memory persistence gateway");
            Ok(Arc::new(InMemoryGateway::new()) as Arc<dyn PersistenceGateway>)
        }
        StoreBackend::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                SyncError::Configuration(
                    "store.backend is postgresql but [postgresql] is missing".to_string(),
                )
            })?;

            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            tracing::info!(
                target_db = %client.connection_string_safe(),
                "Creating PostgreSQL persistence gateway"
            );
            client.test_connection().await?;
            client.ensure_schema().await?;

            Ok(Arc::new(PostgresGateway::new(client)) as Arc<dyn PersistenceGateway>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    #[tokio::test]
    async fn test_create_memory_gateway() {
        let config = load_config_from_str(
            r#"
[linkhub]
base_url = "http://localhost:3000"
"#,
        )
        .unwrap();

        let gateway = create_gateway(&config).await.unwrap();
        let missing = crate::domain::ids::InstanceId::new("missing").unwrap();
        assert!(gateway.get_instance(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_postgresql_backend_requires_section() {
        let mut config = load_config_from_str(
            r#"
[linkhub]
base_url = "http://localhost:3000"
"#,
        )
        .unwrap();
        config.store.backend = StoreBackend::PostgreSQL;
        config.postgresql = None;

        let result = create_gateway(&config).await;
        assert!(matches!(result, Err(SyncError::Configuration(_))));
    }
}
