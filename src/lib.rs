// linkhub-sync - Integration sync engine for LinkHub
// Copyright (c) 2025 LinkHub Contributors
// Licensed under the MIT License

//! # linkhub-sync - Integration Sync Engine
//!
//! linkhub-sync pulls records from third-party systems (HubSpot first) and
//! writes them into the LinkHub business schema as indicators, values and
//! initiatives.
//!
//! ## Overview
//!
//! This library provides:
//! - **Adapters** that authenticate against a provider, fetch records
//!   incrementally and normalize them
//! - **Multi-entity records** whose later entities reference the ids of
//!   earlier ones
//! - **A sync engine** that runs jobs per integration instance and keeps
//!   cursors, schedules and run logs up to date
//! - **A persistence gateway** over memory or PostgreSQL
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Sync orchestration and record processing
//! - [`adapters`] - Provider adapters, persistence gateway, entity store
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use linkhub_sync::adapters::gateway::create_gateway;
//! use linkhub_sync::adapters::linkhub::HttpEntityStore;
//! use linkhub_sync::adapters::provider::AdapterRegistry;
//! use linkhub_sync::config::load_config;
//! use linkhub_sync::core::sync::SyncEngine;
//! use chrono::Utc;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("linkhub-sync.toml")?;
//!
//!     let engine = SyncEngine::from_config(
//!         &config,
//!         create_gateway(&config).await?,
//!         Arc::new(AdapterRegistry::with_defaults(&config.providers)?),
//!         Arc::new(HttpEntityStore::new(&config.linkhub)?),
//!     );
//!
//!     let summary = engine.run_due(Utc::now()).await?;
//!     println!("Synced {} instances", summary.entries.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Multi-entity Records
//!
//! A HubSpot deal becomes an indicator, a value and an initiative. The value
//! declares a dependency on the indicator at index 0, and the engine injects
//! the indicator's new id before writing it:
//!
//! ```rust
//! use linkhub_sync::domain::{Dependency, EntityType, EntityWrite, FieldMap, MultiEntityRecord};
//!
//! let record = MultiEntityRecord::new(vec![
//!     EntityWrite::new(EntityType::Indicators, FieldMap::new()),
//!     EntityWrite::new(EntityType::Values, FieldMap::new()).depends_on(
//!         Dependency::new(EntityType::Indicators, 0).with_inject_field("indicatorId"),
//!     ),
//! ]);
//! assert!(record.validate_dependencies().is_empty());
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`], whose error type is
//! [`domain::SyncError`]:
//!
//! ```rust,no_run
//! use linkhub_sync::domain::SyncError;
//!
//! fn example() -> Result<(), SyncError> {
//!     let config = linkhub_sync::config::load_config("linkhub-sync.toml")?;
//!     println!("{}", config.linkhub.base_url);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
