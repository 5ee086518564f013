//! Core business logic for linkhub-sync.
//!
//! # Sync Workflow
//!
//! 1. **Load**: read the integration instance and its provider
//! 2. **Dispatch**: look up the provider's adapter in the registry
//! 3. **Fetch**: pull one batch from the external system from the stored cursor
//! 4. **Process**: write records in order, injecting ids of earlier entities
//! 5. **Advance**: store the next cursor, last sync time and next schedule
//! 6. **Log**: append a sync run log row
//!
//! # Example
//!
//! ```rust,no_run
//! use linkhub_sync::adapters::gateway::create_gateway;
//! use linkhub_sync::adapters::linkhub::HttpEntityStore;
//! use linkhub_sync::adapters::provider::AdapterRegistry;
//! use linkhub_sync::config::load_config;
//! use linkhub_sync::core::sync::SyncEngine;
//! use linkhub_sync::domain::ids::InstanceId;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("linkhub-sync.toml")?;
//! let gateway = create_gateway(&config).await?;
//! let registry = Arc::new(AdapterRegistry::with_defaults(&config.providers)?);
//! let store = Arc::new(HttpEntityStore::new(&config.linkhub)?);
//!
//! let engine = SyncEngine::from_config(&config, gateway, registry, store);
//! let result = engine.execute_sync_job(&InstanceId::new("inst-1")?).await?;
//!
//! println!("Processed: {}", result.records_processed);
//! println!("Errors: {}", result.records_error);
//! # Ok(())
//! # }
//! ```

pub mod sync;
