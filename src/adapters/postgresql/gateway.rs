//! PostgreSQL persistence gateway
//!
//! Implements [`PersistenceGateway`] over JSONB document tables. Instance
//! updates are read-modify-write on the whole document, so concurrent writers
//! on the same instance are last-writer-wins.

use super::client::PostgreSQLClient;
use super::models::{collect_rows, instance_from_row, provider_from_row, sync_log_from_row};
use crate::adapters::gateway::traits::{
    check_status_change, PersistenceGateway, DEFAULT_LOG_LIMIT,
};
use crate::domain::ids::{InstanceId, ProfileId, ProviderId, SyncLogId};
use crate::domain::{
    InstanceStatus, IntegrationInstance, Provider, Result, SyncError, SyncRunLog,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Gateway backed by PostgreSQL
pub struct PostgresGateway {
    client: Arc<PostgreSQLClient>,
}

impl PostgresGateway {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    async fn save_instance(&self, instance: &IntegrationInstance) -> Result<()> {
        let doc = serde_json::to_value(instance)?;

        self.client
            .execute(
                r#"
                INSERT INTO integration_instances (
                    id, profile_id, provider_id, status, next_sync_at, doc, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (id) DO UPDATE SET
                    profile_id = EXCLUDED.profile_id,
                    provider_id = EXCLUDED.provider_id,
                    status = EXCLUDED.status,
                    next_sync_at = EXCLUDED.next_sync_at,
                    doc = EXCLUDED.doc,
                    updated_at = EXCLUDED.updated_at
                "#,
                &[
                    &instance.id.as_str(),
                    &instance.profile_id.as_str(),
                    &instance.provider_id.as_str(),
                    &instance.status.as_str(),
                    &instance.next_sync_at,
                    &doc,
                    &instance.created_at,
                    &instance.updated_at,
                ],
            )
            .await?;

        Ok(())
    }

    async fn mutate_instance<F>(&self, id: &InstanceId, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut IntegrationInstance) + Send,
    {
        let mut instance = self
            .get_instance(id)
            .await?
            .ok_or_else(|| SyncError::InstanceNotFound(id.to_string()))?;

        mutate(&mut instance);
        instance.updated_at = Utc::now();
        self.save_instance(&instance).await
    }

    async fn find_instance(
        &self,
        profile_id: &ProfileId,
        provider_id: &ProviderId,
    ) -> Result<Option<IntegrationInstance>> {
        self.client
            .query_opt(
                "SELECT doc FROM integration_instances WHERE profile_id = $1 AND provider_id = $2",
                &[&profile_id.as_str(), &provider_id.as_str()],
            )
            .await?
            .as_ref()
            .map(instance_from_row)
            .transpose()
    }

    fn limit(limit: Option<usize>) -> i64 {
        limit.unwrap_or(DEFAULT_LOG_LIMIT) as i64
    }
}

#[async_trait]
impl PersistenceGateway for PostgresGateway {
    async fn get_instance(&self, id: &InstanceId) -> Result<Option<IntegrationInstance>> {
        self.client
            .query_opt(
                "SELECT doc FROM integration_instances WHERE id = $1",
                &[&id.as_str()],
            )
            .await?
            .as_ref()
            .map(instance_from_row)
            .transpose()
    }

    async fn get_provider(&self, id: &ProviderId) -> Result<Option<Provider>> {
        self.client
            .query_opt("SELECT doc FROM providers WHERE id = $1", &[&id.as_str()])
            .await?
            .as_ref()
            .map(provider_from_row)
            .transpose()
    }

    async fn get_provider_by_slug(&self, slug: &str) -> Result<Option<Provider>> {
        self.client
            .query_opt("SELECT doc FROM providers WHERE slug = $1", &[&slug])
            .await?
            .as_ref()
            .map(provider_from_row)
            .transpose()
    }

    async fn update_cursor(&self, id: &InstanceId, cursor: &str) -> Result<()> {
        let cursor = cursor.to_string();
        self.mutate_instance(id, move |inst| inst.last_modified_cursor = Some(cursor))
            .await
    }

    async fn update_last_sync(&self, id: &InstanceId, timestamp: DateTime<Utc>) -> Result<()> {
        self.mutate_instance(id, |inst| inst.last_sync_at = Some(timestamp))
            .await
    }

    async fn update_schedule(
        &self,
        id: &InstanceId,
        next_sync_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.mutate_instance(id, |inst| inst.next_sync_at = next_sync_at)
            .await
    }

    async fn update_status(
        &self,
        id: &InstanceId,
        status: InstanceStatus,
        last_error: Option<String>,
    ) -> Result<()> {
        check_status_change(status, last_error.as_deref())?;

        self.mutate_instance(id, move |inst| {
            inst.status = status;
            inst.last_error = last_error;
        })
        .await
    }

    async fn log_sync_operation(&self, entry: SyncRunLog) -> Result<SyncLogId> {
        let doc = serde_json::to_value(&entry)?;
        let profile_id = entry.profile_id.as_ref().map(|p| p.as_str());

        self.client
            .execute(
                r#"
                INSERT INTO sync_logs (id, instance_id, profile_id, "timestamp", doc)
                VALUES ($1, $2, $3, $4, $5)
                "#,
                &[
                    &entry.id.as_str(),
                    &entry.instance_id.as_str(),
                    &profile_id,
                    &entry.timestamp,
                    &doc,
                ],
            )
            .await?;

        tracing::debug!(log_id = %entry.id, instance_id = %entry.instance_id, "Sync log stored");
        Ok(entry.id)
    }

    async fn get_provider_configs(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<IntegrationInstance>> {
        let rows = self
            .client
            .query(
                "SELECT doc FROM integration_instances WHERE profile_id = $1 AND status = 'active'",
                &[&profile_id.as_str()],
            )
            .await?;
        collect_rows(&rows, instance_from_row)
    }

    async fn disable_provider_config(
        &self,
        profile_id: &ProfileId,
        provider_slug: &str,
    ) -> Result<bool> {
        let Some(provider) = self.get_provider_by_slug(provider_slug).await? else {
            return Ok(false);
        };
        let Some(mut instance) = self.find_instance(profile_id, &provider.id).await? else {
            return Ok(false);
        };

        instance.status = InstanceStatus::Paused;
        instance.updated_at = Utc::now();
        self.save_instance(&instance).await?;

        tracing::info!(instance_id = %instance.id, provider = provider_slug, "Integration paused");
        Ok(true)
    }

    async fn upsert_instance(&self, mut instance: IntegrationInstance) -> Result<InstanceId> {
        if let Some(existing) = self
            .find_instance(&instance.profile_id, &instance.provider_id)
            .await?
        {
            instance.id = existing.id;
            instance.created_at = existing.created_at;
        }
        instance.updated_at = Utc::now();

        self.save_instance(&instance).await?;
        Ok(instance.id)
    }

    async fn upsert_provider(&self, mut provider: Provider) -> Result<ProviderId> {
        if let Some(existing) = self.get_provider_by_slug(&provider.slug).await? {
            provider.id = existing.id;
        }

        let doc = serde_json::to_value(&provider)?;
        let categories = serde_json::to_value(&provider.categories)?;

        self.client
            .execute(
                r#"
                INSERT INTO providers (id, slug, active, categories, doc, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                ON CONFLICT (id) DO UPDATE SET
                    slug = EXCLUDED.slug,
                    active = EXCLUDED.active,
                    categories = EXCLUDED.categories,
                    doc = EXCLUDED.doc,
                    updated_at = NOW()
                "#,
                &[
                    &provider.id.as_str(),
                    &provider.slug,
                    &provider.active,
                    &categories,
                    &doc,
                ],
            )
            .await?;

        Ok(provider.id)
    }

    async fn list_due_instances(&self, now: DateTime<Utc>) -> Result<Vec<IntegrationInstance>> {
        let rows = self
            .client
            .query(
                r#"
                SELECT doc FROM integration_instances
                WHERE status IN ('active', 'error') AND next_sync_at IS NOT NULL AND next_sync_at <= $1
                ORDER BY next_sync_at
                "#,
                &[&now],
            )
            .await?;
        collect_rows(&rows, instance_from_row)
    }

    async fn get_recent_sync_logs(
        &self,
        profile_id: &ProfileId,
        limit: Option<usize>,
    ) -> Result<Vec<SyncRunLog>> {
        let rows = self
            .client
            .query(
                r#"SELECT doc FROM sync_logs WHERE profile_id = $1 ORDER BY "timestamp" DESC LIMIT $2"#,
                &[&profile_id.as_str(), &Self::limit(limit)],
            )
            .await?;
        collect_rows(&rows, sync_log_from_row)
    }

    async fn get_instance_logs(
        &self,
        instance_id: &InstanceId,
        limit: Option<usize>,
    ) -> Result<Vec<SyncRunLog>> {
        let rows = self
            .client
            .query(
                r#"SELECT doc FROM sync_logs WHERE instance_id = $1 ORDER BY "timestamp" DESC LIMIT $2"#,
                &[&instance_id.as_str(), &Self::limit(limit)],
            )
            .await?;
        collect_rows(&rows, sync_log_from_row)
    }
}
