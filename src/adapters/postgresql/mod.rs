//! PostgreSQL persistence backend
//!
//! Stores integration instances, providers and run logs as JSONB documents
//! with indexed lookup columns.

pub mod client;
pub mod gateway;
pub mod models;

pub use client::PostgreSQLClient;
pub use gateway::PostgresGateway;
