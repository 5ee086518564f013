//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the linkhub-sync configuration file.

use crate::adapters::postgresql::client::redact_connection_string;
use crate::cli::{EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use crate::config::schema::StoreBackend;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates; a file that loads is valid.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Batch Size: {}", config.sync.batch_size);

        match config.store.backend {
            StoreBackend::Memory => println!("  Store: memory"),
            StoreBackend::PostgreSQL => {
                if let Some(pg_config) = &config.postgresql {
                    println!("  Store: PostgreSQL");
                    let conn = pg_config.connection_string.expose_secret();
                    println!(
                        "  PostgreSQL Connection: {}",
                        redact_connection_string(conn.as_ref())
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
        }

        println!("  LinkHub API: {}", config.linkhub.base_url);
        println!(
            "  LinkHub Token: {}",
            if config.linkhub.api_token.is_some() {
                "set"
            } else {
                "not set"
            }
        );
        println!("  HubSpot API: {}", config.providers.hubspot.base_url);
        println!(
            "  HubSpot OAuth Client: {}",
            config
                .providers
                .hubspot
                .client_id
                .as_deref()
                .unwrap_or("not set")
        );
        println!();

        Ok(EXIT_OK)
    }
}
