//! Integration adapter trait definition
//!
//! This module defines the `IntegrationAdapter` trait that every provider
//! integration implements. The sync engine only ever talks to providers
//! through this interface, so adding a provider means adding one adapter and
//! registering it.

use crate::domain::{Credentials, EntityType, FieldMap, Record, Result, SyncError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default number of records requested per fetch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Input for a single fetch call
#[derive(Debug, Clone)]
pub struct FetchParams {
    /// Stored credentials of the instance
    pub credentials: Credentials,

    /// Provider-specific instance config
    pub config: Value,

    /// Continuation token from the previous run
    pub cursor: Option<String>,

    /// Maximum number of native objects to request
    pub batch_size: usize,
}

impl FetchParams {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            config: Value::Null,
            cursor: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Output of a single fetch call
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub records: Vec<Record>,

    /// Continuation token for the next run, when the provider returned one
    pub next_cursor: Option<String>,

    pub has_more: bool,
}

/// Business entity sent to a provider during export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundRecord {
    pub entity_type: EntityType,
    pub fields: FieldMap,
}

/// Per-record export error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushError {
    pub record_id: String,
    pub error: String,
}

/// Outcome of an export call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushResult {
    pub success_count: u64,
    pub error_count: u64,
    #[serde(default)]
    pub errors: Vec<PushError>,
}

/// Result of validating provider-specific config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidation {
    pub valid: bool,
    pub error: Option<String>,
}

impl ConfigValidation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Trait for provider integrations
///
/// Implementations must be shareable across tasks; the registry hands out
/// `Arc<dyn IntegrationAdapter>` values.
///
/// # Example
///
/// ```no_run
/// use linkhub_sync::adapters::provider::{FetchParams, HubSpotAdapter, IntegrationAdapter};
/// use linkhub_sync::config::HubSpotConfig;
/// use linkhub_sync::domain::Credentials;
///
/// # async fn example() -> linkhub_sync::domain::Result<()> {
/// let adapter = HubSpotAdapter::new(HubSpotConfig::default())?;
/// let credentials = Credentials::with_access_token("pat-na1-...");
///
/// if adapter.authenticate(&credentials).await? {
///     let result = adapter.fetch_records(FetchParams::new(credentials)).await?;
///     println!("Fetched {} records", result.records.len());
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait IntegrationAdapter: Send + Sync {
    /// Registry key of this adapter (the provider slug)
    fn provider_key(&self) -> &str;

    /// Check whether the credentials are accepted by the provider
    ///
    /// Invalid credentials yield `Ok(false)`, not an error.
    async fn authenticate(&self, credentials: &Credentials) -> Result<bool>;

    /// Exchange a refresh token for fresh credentials
    async fn refresh_token(&self, _refresh_token: &str) -> Result<Credentials> {
        Err(SyncError::NotImplemented(format!(
            "{} token refresh",
            self.provider_key()
        )))
    }

    /// Fetch one batch of records starting after the cursor
    ///
    /// # Errors
    ///
    /// Transport failures and non-success responses are returned as errors.
    async fn fetch_records(&self, params: FetchParams) -> Result<FetchResult>;

    /// Send business entities to the provider
    async fn push_records(&self, _records: Vec<OutboundRecord>) -> Result<PushResult> {
        Err(SyncError::NotImplemented(format!(
            "{} export",
            self.provider_key()
        )))
    }

    /// Validate provider-specific instance config
    fn validate_config(&self, _config: &Value) -> ConfigValidation {
        ConfigValidation::valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MinimalAdapter;

    #[async_trait]
    impl IntegrationAdapter for MinimalAdapter {
        fn provider_key(&self) -> &str {
            "minimal"
        }

        async fn authenticate(&self, _credentials: &Credentials) -> Result<bool> {
            Ok(true)
        }

        async fn fetch_records(&self, _params: FetchParams) -> Result<FetchResult> {
            Ok(FetchResult::default())
        }
    }

    #[tokio::test]
    async fn test_default_push_is_not_implemented() {
        let err = MinimalAdapter.push_records(vec![]).await.unwrap_err();
        assert!(matches!(err, SyncError::NotImplemented(_)));
        assert_eq!(err.to_string(), "minimal export not implemented");
    }

    #[tokio::test]
    async fn test_default_refresh_is_not_implemented() {
        let err = MinimalAdapter.refresh_token("rt").await.unwrap_err();
        assert!(matches!(err, SyncError::NotImplemented(_)));
    }

    #[test]
    fn test_default_config_validation_passes() {
        assert!(MinimalAdapter.validate_config(&Value::Null).valid);
    }

    #[test]
    fn test_fetch_params_defaults() {
        let params = FetchParams::new(Credentials::default());
        assert_eq!(params.batch_size, DEFAULT_BATCH_SIZE);
        assert!(params.cursor.is_none());
    }
}
