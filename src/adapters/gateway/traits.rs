//! Persistence gateway trait
//!
//! This module defines the interface the sync engine uses to read and advance
//! integration instances, look up providers and append run logs. Backends
//! implement it over their own storage.

use crate::domain::ids::{InstanceId, ProfileId, ProviderId, SyncLogId};
use crate::domain::{InstanceStatus, IntegrationInstance, Provider, Result, SyncError, SyncRunLog};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Number of log rows returned when no limit is given
pub const DEFAULT_LOG_LIMIT: usize = 50;

/// Reject a move to `error` status without a message
pub(crate) fn check_status_change(
    status: InstanceStatus,
    last_error: Option<&str>,
) -> Result<()> {
    if status == InstanceStatus::Error && last_error.map_or(true, |e| e.trim().is_empty()) {
        return Err(SyncError::Validation(
            "An instance in error status needs a non-empty last error".to_string(),
        ));
    }
    Ok(())
}

/// Storage interface for instances, providers and run logs
///
/// Instance mutations (`update_*`) fail with `InstanceNotFound` when the id
/// does not exist. Writes are last-writer-wins.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Load an instance by id
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the instance does not exist.
    async fn get_instance(&self, id: &InstanceId) -> Result<Option<IntegrationInstance>>;

    /// Load a provider catalog entry by id
    async fn get_provider(&self, id: &ProviderId) -> Result<Option<Provider>>;

    /// Load a provider catalog entry by slug
    async fn get_provider_by_slug(&self, slug: &str) -> Result<Option<Provider>>;

    /// Store the continuation token of an instance
    async fn update_cursor(&self, id: &InstanceId, cursor: &str) -> Result<()>;

    /// Store the completion time of the last run
    async fn update_last_sync(&self, id: &InstanceId, timestamp: DateTime<Utc>) -> Result<()>;

    /// Store the next scheduled run time (`None` for manual instances)
    async fn update_schedule(
        &self,
        id: &InstanceId,
        next_sync_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Change the status of an instance
    ///
    /// # Errors
    ///
    /// Returns a validation error when moving to `error` without a message.
    async fn update_status(
        &self,
        id: &InstanceId,
        status: InstanceStatus,
        last_error: Option<String>,
    ) -> Result<()>;

    /// Append a run log row
    async fn log_sync_operation(&self, entry: SyncRunLog) -> Result<SyncLogId>;

    /// Active instances of a profile
    async fn get_provider_configs(&self, profile_id: &ProfileId)
        -> Result<Vec<IntegrationInstance>>;

    /// Pause the instance of a profile for a provider slug
    ///
    /// # Returns
    ///
    /// Returns `false` when no instance matched.
    async fn disable_provider_config(
        &self,
        profile_id: &ProfileId,
        provider_slug: &str,
    ) -> Result<bool>;

    /// Insert an instance or update the existing one for the same profile and provider
    ///
    /// # Returns
    ///
    /// Returns the id of the stored instance, which is the existing id on update.
    async fn upsert_instance(&self, instance: IntegrationInstance) -> Result<InstanceId>;

    /// Insert or replace a provider catalog entry, keyed by slug
    async fn upsert_provider(&self, provider: Provider) -> Result<ProviderId>;

    /// Active or errored instances whose next run time is at or before `now`
    async fn list_due_instances(&self, now: DateTime<Utc>) -> Result<Vec<IntegrationInstance>>;

    /// Newest run logs of a profile (default limit 50)
    async fn get_recent_sync_logs(
        &self,
        profile_id: &ProfileId,
        limit: Option<usize>,
    ) -> Result<Vec<SyncRunLog>>;

    /// Newest run logs of one instance (default limit 50)
    async fn get_instance_logs(
        &self,
        instance_id: &InstanceId,
        limit: Option<usize>,
    ) -> Result<Vec<SyncRunLog>>;
}
