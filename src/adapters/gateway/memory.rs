//! In-memory persistence gateway
//!
//! Keeps everything in `tokio::sync::RwLock` maps. Used by tests, dry runs
//! and the `memory` store backend.

use super::traits::{check_status_change, PersistenceGateway, DEFAULT_LOG_LIMIT};
use crate::domain::ids::{InstanceId, ProfileId, ProviderId, SyncLogId};
use crate::domain::{
    InstanceStatus, IntegrationInstance, Provider, Result, SyncError, SyncRunLog,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Gateway backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    instances: RwLock<HashMap<InstanceId, IntegrationInstance>>,
    providers: RwLock<HashMap<ProviderId, Provider>>,
    logs: RwLock<Vec<SyncRunLog>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// All run logs in insertion order
    pub async fn all_logs(&self) -> Vec<SyncRunLog> {
        self.logs.read().await.clone()
    }

    async fn with_instance<F>(&self, id: &InstanceId, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut IntegrationInstance),
    {
        let mut instances = self.instances.write().await;
        let instance = instances
            .get_mut(id)
            .ok_or_else(|| SyncError::InstanceNotFound(id.to_string()))?;
        mutate(instance);
        instance.updated_at = Utc::now();
        Ok(())
    }

    fn newest_first(mut logs: Vec<SyncRunLog>, limit: Option<usize>) -> Vec<SyncRunLog> {
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        logs.truncate(limit.unwrap_or(DEFAULT_LOG_LIMIT));
        logs
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn get_instance(&self, id: &InstanceId) -> Result<Option<IntegrationInstance>> {
        Ok(self.instances.read().await.get(id).cloned())
    }

    async fn get_provider(&self, id: &ProviderId) -> Result<Option<Provider>> {
        Ok(self.providers.read().await.get(id).cloned())
    }

    async fn get_provider_by_slug(&self, slug: &str) -> Result<Option<Provider>> {
        Ok(self
            .providers
            .read()
            .await
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn update_cursor(&self, id: &InstanceId, cursor: &str) -> Result<()> {
        self.with_instance(id, |inst| {
            inst.last_modified_cursor = Some(cursor.to_string());
        })
        .await
    }

    async fn update_last_sync(&self, id: &InstanceId, timestamp: DateTime<Utc>) -> Result<()> {
        self.with_instance(id, |inst| inst.last_sync_at = Some(timestamp))
            .await
    }

    async fn update_schedule(
        &self,
        id: &InstanceId,
        next_sync_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.with_instance(id, |inst| inst.next_sync_at = next_sync_at)
            .await
    }

    async fn update_status(
        &self,
        id: &InstanceId,
        status: InstanceStatus,
        last_error: Option<String>,
    ) -> Result<()> {
        check_status_change(status, last_error.as_deref())?;

        self.with_instance(id, |inst| {
            inst.status = status;
            inst.last_error = last_error;
        })
        .await
    }

    async fn log_sync_operation(&self, entry: SyncRunLog) -> Result<SyncLogId> {
        let id = entry.id.clone();
        self.logs.write().await.push(entry);
        Ok(id)
    }

    async fn get_provider_configs(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<IntegrationInstance>> {
        Ok(self
            .instances
            .read()
            .await
            .values()
            .filter(|inst| &inst.profile_id == profile_id && inst.is_active())
            .cloned()
            .collect())
    }

    async fn disable_provider_config(
        &self,
        profile_id: &ProfileId,
        provider_slug: &str,
    ) -> Result<bool> {
        let Some(provider) = self.get_provider_by_slug(provider_slug).await? else {
            return Ok(false);
        };

        let mut instances = self.instances.write().await;
        let matched = instances
            .values_mut()
            .find(|inst| &inst.profile_id == profile_id && inst.provider_id == provider.id);

        match matched {
            Some(inst) => {
                inst.status = InstanceStatus::Paused;
                inst.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert_instance(&self, mut instance: IntegrationInstance) -> Result<InstanceId> {
        let mut instances = self.instances.write().await;

        let existing = instances
            .values()
            .find(|inst| {
                inst.profile_id == instance.profile_id && inst.provider_id == instance.provider_id
            })
            .map(|inst| (inst.id.clone(), inst.created_at));

        if let Some((id, created_at)) = existing {
            instance.id = id;
            instance.created_at = created_at;
        }
        instance.updated_at = Utc::now();

        let id = instance.id.clone();
        instances.insert(id.clone(), instance);
        Ok(id)
    }

    async fn upsert_provider(&self, mut provider: Provider) -> Result<ProviderId> {
        let mut providers = self.providers.write().await;

        if let Some(existing) = providers.values().find(|p| p.slug == provider.slug) {
            provider.id = existing.id.clone();
        }

        let id = provider.id.clone();
        providers.insert(id.clone(), provider);
        Ok(id)
    }

    async fn list_due_instances(&self, now: DateTime<Utc>) -> Result<Vec<IntegrationInstance>> {
        let mut due: Vec<IntegrationInstance> = self
            .instances
            .read()
            .await
            .values()
            .filter(|inst| inst.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|inst| inst.next_sync_at);
        Ok(due)
    }

    async fn get_recent_sync_logs(
        &self,
        profile_id: &ProfileId,
        limit: Option<usize>,
    ) -> Result<Vec<SyncRunLog>> {
        let logs = self
            .logs
            .read()
            .await
            .iter()
            .filter(|log| log.profile_id.as_ref() == Some(profile_id))
            .cloned()
            .collect();
        Ok(Self::newest_first(logs, limit))
    }

    async fn get_instance_logs(
        &self,
        instance_id: &InstanceId,
        limit: Option<usize>,
    ) -> Result<Vec<SyncRunLog>> {
        let logs = self
            .logs
            .read()
            .await
            .iter()
            .filter(|log| &log.instance_id == instance_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(logs, limit))
    }
}
