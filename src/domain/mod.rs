//! Domain models and types for the sync engine.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`InstanceId`], [`ProviderId`], [`TenantId`], ...)
//! - **Integration models** ([`IntegrationInstance`], [`Provider`], [`Credentials`])
//! - **Normalized records** ([`Record`], [`SingleEntityRecord`], [`MultiEntityRecord`])
//! - **Run audit rows** ([`SyncRunLog`])
//! - **Error types** ([`SyncError`]) and the [`Result`] alias
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so an instance id can never be passed
//! where a tenant id is expected:
//!
//! ```rust
//! use linkhub_sync::domain::{InstanceId, TenantId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let instance = InstanceId::new("inst-1")?;
//! let tenant = TenantId::new("company-7")?;
//!
//! // let wrong: TenantId = instance;  // Compile error!
//! # Ok(())
//! # }
//! ```
//!
//! # Builder Pattern
//!
//! ```rust
//! use linkhub_sync::domain::{
//!     IntegrationInstanceBuilder, InstanceStatus, ProfileId, ProviderId, SyncFrequency,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let instance = IntegrationInstanceBuilder::new(ProfileId::new("p1")?, ProviderId::new("hs")?)
//!     .sync_frequency(SyncFrequency::Hourly)
//!     .status(InstanceStatus::Active)
//!     .build();
//! assert!(instance.is_active());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod instance;
pub mod record;
pub mod result;
pub mod sync_log;

pub use errors::{ErrorKind, FailedRecord, SyncError};
pub use ids::{EntityId, InstanceId, ProfileId, ProviderId, SyncLogId, TenantId};
pub use instance::{
    AuthType, Credentials, InstanceStatus, IntegrationInstance, IntegrationInstanceBuilder,
    Provider, SetupStep, SyncDirection, SyncFrequency,
};
pub use record::{
    Dependency, EntityType, EntityWrite, FieldMap, MultiEntityRecord, Record, SingleEntityRecord,
};
pub use result::Result;
pub use sync_log::{SyncOperation, SyncRunLog};
