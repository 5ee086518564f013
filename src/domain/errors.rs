//! Domain error types
//!
//! This module defines the error hierarchy for the sync engine. Errors are
//! domain-specific and don't expose third-party types beyond `From` conversions.

use thiserror::Error;

/// Main sync engine error type
///
/// Every fallible operation in the crate returns this type. The variants map
/// onto the failure categories the orchestrator distinguishes: configuration
/// problems and transport failures abort a job, entity store and dependency
/// errors are counted per record, and `NotImplemented` marks missing adapter
/// capabilities.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration-related errors (missing tenant, bad settings)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The integration instance row does not exist
    #[error("Integration instance not found: {0}")]
    InstanceNotFound(String),

    /// The provider catalog row does not exist
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// No adapter registered for the provider key
    #[error("Adapter not found for provider: {provider}. Available adapters: {available}")]
    AdapterNotFound { provider: String, available: String },

    /// Authentication errors against an external system
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network/connection errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status from an external API
    #[error("{provider} API error: {status}")]
    Api { provider: String, status: u16 },

    /// Response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Write to the business entity store failed
    #[error("Entity store error: {0}")]
    EntityStore(String),

    /// A multi-entity dependency could not be resolved
    #[error("Dependency not found: {0}")]
    DependencyUnresolved(String),

    /// The adapter does not provide this capability
    #[error("{0} not implemented")]
    NotImplemented(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistence gateway errors
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Coarse classification used for log fields and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown provider, missing rows, missing tenant, bad settings
    Configuration,
    /// Adapter fetch failures and non-2xx responses
    Transport,
    /// Per-record failures that never abort a job
    RecordWrite,
    /// Export or refresh on an adapter that lacks the capability
    Unimplemented,
    /// Gateway and serialization failures
    Storage,
}

impl SyncError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Configuration(_)
            | SyncError::InstanceNotFound(_)
            | SyncError::ProviderNotFound(_)
            | SyncError::AdapterNotFound { .. }
            | SyncError::Validation(_) => ErrorKind::Configuration,
            SyncError::Authentication(_)
            | SyncError::Transport(_)
            | SyncError::Api { .. }
            | SyncError::InvalidResponse(_) => ErrorKind::Transport,
            SyncError::EntityStore(_) | SyncError::DependencyUnresolved(_) => {
                ErrorKind::RecordWrite
            }
            SyncError::NotImplemented(_) => ErrorKind::Unimplemented,
            SyncError::Database(_) | SyncError::Serialization(_) | SyncError::Io(_) => {
                ErrorKind::Storage
            }
        }
    }

    /// Whether this error aborts a sync job when raised before record processing
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::RecordWrite
    }
}

/// Per-record failure detail kept in the run log
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FailedRecord {
    /// External id of the record (or a positional label when none was given)
    pub external_id: String,

    /// Error message
    pub error: String,
}

impl FailedRecord {
    /// Creates a new failed record entry
    pub fn new(external_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            error: error.into(),
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::InvalidResponse(err.to_string())
        } else {
            SyncError::Transport(err.to_string())
        }
    }
}
