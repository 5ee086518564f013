//! External system integrations for linkhub-sync.
//!
//! - [`provider`] - third-party adapters (HubSpot) and the adapter registry
//! - [`gateway`] - persistence gateway trait, factory and in-memory backend
//! - [`postgresql`] - PostgreSQL persistence backend
//! - [`linkhub`] - business entity store (LinkHub main API)
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits so the sync engine
//! can be exercised against in-memory implementations.
//!
//! # Provider Adapters
//!
//! ```rust,no_run
//! use linkhub_sync::adapters::provider::{AdapterRegistry, FetchParams, IntegrationAdapter};
//! use linkhub_sync::config::ProvidersConfig;
//! use linkhub_sync::domain::Credentials;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = AdapterRegistry::with_defaults(&ProvidersConfig::default())?;
//! let hubspot = registry.get("hubspot")?;
//!
//! let page = hubspot
//!     .fetch_records(FetchParams::new(Credentials::with_access_token("token")))
//!     .await?;
//! println!("{} records, more: {}", page.records.len(), page.has_more);
//! # Ok(())
//! # }
//! ```

pub mod gateway;
pub mod linkhub;
pub mod postgresql;
pub mod provider;
