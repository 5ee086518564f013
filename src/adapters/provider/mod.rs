//! Provider integrations
//!
//! The `IntegrationAdapter` trait defines the common interface; per-provider
//! implementations (e.g. HubSpot) supply the concrete behaviour, and the
//! `AdapterRegistry` maps provider slugs to adapters.

pub mod hubspot;
pub mod registry;
mod r#trait;

pub use hubspot::{HubSpotAdapter, HUBSPOT_PROVIDER_KEY};
pub use r#trait::{
    ConfigValidation, FetchParams, FetchResult, IntegrationAdapter, OutboundRecord, PushError,
    PushResult, DEFAULT_BATCH_SIZE,
};
pub use registry::{AdapterRegistry, AdapterRegistryBuilder};
