//! Persistence gateway
//!
//! Trait-based access to integration instances, providers and sync run logs,
//! with in-memory and PostgreSQL implementations.

pub mod factory;
pub mod memory;
pub mod traits;

pub use factory::create_gateway;
pub use memory::InMemoryGateway;
pub use traits::{PersistenceGateway, DEFAULT_LOG_LIMIT};
