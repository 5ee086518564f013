//! LinkHub business entity store
//!
//! - [`HttpEntityStore`] writes through the LinkHub main API
//! - [`InMemoryEntityStore`] keeps writes in memory for tests and local runs

pub mod memory;
pub mod store;

pub use memory::{InMemoryEntityStore, StoredEntity};
pub use store::{EntityStore, HttpEntityStore, TENANT_FIELD};
