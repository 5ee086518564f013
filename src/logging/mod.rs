//! Logging and observability
//!
//! Structured logging through `tracing`, with JSON file output and rotation.
//!
//! # Example
//!
//! ```no_run
//! use linkhub_sync::logging::init_logging;
//! use linkhub_sync::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a sync job
///
/// # Example
///
/// ```no_run
/// use linkhub_sync::log_sync_start;
/// use linkhub_sync::domain::ids::InstanceId;
///
/// let instance_id = InstanceId::new("inst-1").unwrap();
/// log_sync_start!(&instance_id);
/// log_sync_start!(&instance_id, "hubspot");
/// ```
#[macro_export]
macro_rules! log_sync_start {
    ($instance_id:expr) => {
        tracing::info!(instance_id = %$instance_id, "Starting sync");
    };
    ($instance_id:expr, $provider:expr) => {
        tracing::info!(
            instance_id = %$instance_id,
            provider = %$provider,
            "Starting sync"
        );
    };
}

/// Log the completion of a sync job
///
/// # Example
///
/// ```no_run
/// use linkhub_sync::log_sync_complete;
/// use linkhub_sync::domain::ids::InstanceId;
/// use std::time::Duration;
///
/// let instance_id = InstanceId::new("inst-1").unwrap();
/// log_sync_complete!(&instance_id, 42, Duration::from_secs(3));
/// ```
#[macro_export]
macro_rules! log_sync_complete {
    ($instance_id:expr, $records:expr, $duration:expr) => {
        tracing::info!(
            instance_id = %$instance_id,
            records = $records,
            duration_ms = $duration.as_millis() as u64,
            "Sync finished"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use linkhub_sync::log_error_with_context;
/// use linkhub_sync::domain::SyncError;
///
/// let error = SyncError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
