//! Configuration management.
//!
//! TOML configuration with `${VAR_NAME}` substitution, `LINKHUB_*`
//! environment overrides, defaults for optional settings and validation on
//! load.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use linkhub_sync::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("linkhub-sync.toml")?;
//!
//! println!("LinkHub API: {}", config.linkhub.base_url);
//! println!("Batch size: {}", config.sync.batch_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//! dry_run = false
//!
//! [sync]
//! batch_size = 100
//!
//! [store]
//! backend = "postgresql"
//!
//! [postgresql]
//! connection_string = "${LINKHUB_DATABASE_URL}"
//!
//! [linkhub]
//! base_url = "https://app.linkhub.example"
//! api_token = "${LINKHUB_API_TOKEN}"
//!
//! [providers.hubspot]
//! client_id = "${HUBSPOT_CLIENT_ID}"
//! client_secret = "${HUBSPOT_CLIENT_SECRET}"
//!
//! [logging]
//! local_enabled = true
//! local_path = "/var/log/linkhub-sync"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, Environment, HubSpotConfig, LinkHubConfig, LoggingConfig,
    PostgreSQLConfig, ProvidersConfig, StoreBackend, StoreConfig, SyncConfig, SyncSettings,
};
pub use secret::{secret_string, SecretString, SecretValue};
