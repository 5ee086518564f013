//! Sync engine - main orchestrator for integration sync jobs
//!
//! A job loads the instance and its provider, dispatches to the provider's
//! adapter, fetches one batch from the external system, writes the records
//! through the entity store, advances the instance and appends a run log.

use crate::adapters::gateway::PersistenceGateway;
use crate::adapters::linkhub::EntityStore;
use crate::adapters::provider::{AdapterRegistry, FetchParams, FetchResult, DEFAULT_BATCH_SIZE};
use crate::config::SyncConfig;
use crate::core::sync::processor::RecordProcessor;
use crate::core::sync::summary::{SweepSummary, SyncJobResult};
use crate::domain::ids::{InstanceId, SyncLogId, TenantId};
use crate::domain::sync_log::{SyncOperation, SyncRunLog};
use crate::domain::{InstanceStatus, IntegrationInstance, Result, SyncError};
use crate::{log_error_with_context, log_sync_complete, log_sync_start};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};

/// Sync job orchestrator
///
/// Jobs for the same instance id run one after the other inside a process.
pub struct SyncEngine {
    gateway: Arc<dyn PersistenceGateway>,
    registry: Arc<AdapterRegistry>,
    processor: RecordProcessor,
    batch_size: usize,
    locks: Mutex<HashMap<InstanceId, Arc<Mutex<()>>>>,
    shutdown_signal: Option<watch::Receiver<bool>>,
}

impl SyncEngine {
    /// Create an engine with the default batch size and live writes
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        registry: Arc<AdapterRegistry>,
        entity_store: Arc<dyn EntityStore>,
    ) -> Self {
        Self {
            gateway,
            registry,
            processor: RecordProcessor::new(entity_store),
            batch_size: DEFAULT_BATCH_SIZE,
            locks: Mutex::new(HashMap::new()),
            shutdown_signal: None,
        }
    }

    /// Create an engine using `[sync] batch_size` and `[application] dry_run`
    pub fn from_config(
        config: &SyncConfig,
        gateway: Arc<dyn PersistenceGateway>,
        registry: Arc<AdapterRegistry>,
        entity_store: Arc<dyn EntityStore>,
    ) -> Self {
        Self::new(gateway, registry, entity_store)
            .with_batch_size(config.sync.batch_size)
            .with_dry_run(config.application.dry_run)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// In dry-run mode entity writes are skipped and the instance is not
    /// advanced; the run log is still written.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.processor = self.processor.with_dry_run(dry_run);
        self
    }

    /// Stop a due sweep between jobs once the signal turns true
    pub fn with_shutdown_signal(mut self, shutdown_signal: watch::Receiver<bool>) -> Self {
        self.shutdown_signal = Some(shutdown_signal);
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.processor.is_dry_run()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn registry(&self) -> &Arc<AdapterRegistry> {
        &self.registry
    }

    /// Execute one sync job
    ///
    /// Record write failures are counted in the result. Failures while
    /// loading, dispatching or fetching abort the job: a failure log row is
    /// written, the instance moves to `error` status when it was loaded and
    /// its next run is scheduled from the frequency. A persistence failure
    /// after the batch was processed keeps the batch counts in the run log.
    /// The original error is returned in every case.
    ///
    /// # Errors
    ///
    /// Returns `InstanceNotFound`, `ProviderNotFound`, `AdapterNotFound`, a
    /// configuration error for an instance without tenant, the adapter's
    /// fetch error, or the gateway error that stopped the instance update.
    pub async fn execute_sync_job(&self, instance_id: &InstanceId) -> Result<SyncJobResult> {
        let lock = self.instance_lock(instance_id).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.run_locked(instance_id).await
        };
        self.release_lock(instance_id, lock).await;
        outcome
    }

    /// Run every scheduled instance whose next sync time has passed
    ///
    /// Instances run sequentially; a failed job is recorded in the summary and
    /// the sweep continues. A shutdown signal stops the sweep before the next
    /// job and marks the summary interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error only if the due instances cannot be listed.
    pub async fn run_due(&self, now: DateTime<Utc>) -> Result<SweepSummary> {
        let start_time = Instant::now();
        let due = self.gateway.list_due_instances(now).await?;

        tracing::info!(count = due.len(), "Running due integration instances");

        let mut summary = SweepSummary::new();
        for instance in due {
            if self.shutdown_requested() {
                tracing::info!("Shutdown requested, stopping due sweep");
                summary.interrupted = true;
                break;
            }

            let outcome = self
                .execute_sync_job(&instance.id)
                .await
                .map_err(|e| e.to_string());
            summary.push(instance.id, outcome);
        }

        Ok(summary.with_duration(start_time.elapsed()))
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_signal
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }

    async fn instance_lock(&self, instance_id: &InstanceId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(instance_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the map entry once no other job holds or waits on the lock
    async fn release_lock(&self, instance_id: &InstanceId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        let current = locks
            .get(instance_id)
            .is_some_and(|held| Arc::ptr_eq(held, &lock));
        // One reference in the map, one here.
        if current && Arc::strong_count(&lock) <= 2 {
            locks.remove(instance_id);
        }
    }

    async fn run_locked(&self, instance_id: &InstanceId) -> Result<SyncJobResult> {
        let start_time = Instant::now();
        log_sync_start!(instance_id);

        let mut loaded: Option<IntegrationInstance> = None;
        let job = match self.prepare_job(instance_id, &mut loaded).await {
            Ok(job) => job,
            Err(e) => {
                self.record_failure(instance_id, loaded.as_ref(), &e, start_time)
                    .await;
                return Err(e);
            }
        };

        self.complete_job(job, start_time).await
    }

    async fn prepare_job(
        &self,
        instance_id: &InstanceId,
        loaded: &mut Option<IntegrationInstance>,
    ) -> Result<PreparedJob> {
        let instance = self
            .gateway
            .get_instance(instance_id)
            .await?
            .ok_or_else(|| SyncError::InstanceNotFound(instance_id.to_string()))?;
        *loaded = Some(instance.clone());

        let provider = self
            .gateway
            .get_provider(&instance.provider_id)
            .await?
            .ok_or_else(|| SyncError::ProviderNotFound(instance.provider_id.to_string()))?;

        let tenant_id = instance.tenant_id.clone().ok_or_else(|| {
            SyncError::Configuration(format!(
                "Integration instance {instance_id} has no tenant (company) id"
            ))
        })?;

        let adapter = self.registry.get(&provider.slug)?;

        tracing::info!(
            instance_id = %instance_id,
            provider = %provider.name,
            cursor = instance.last_modified_cursor.as_deref().unwrap_or(""),
            batch_size = self.batch_size,
            "Fetching records"
        );

        let params = FetchParams::new(instance.credentials.clone())
            .with_config(instance.config.clone())
            .with_cursor(instance.last_modified_cursor.clone())
            .with_batch_size(self.batch_size);
        let fetched = adapter.fetch_records(params).await?;

        tracing::info!(
            instance_id = %instance_id,
            records = fetched.records.len(),
            has_more = fetched.has_more,
            "Fetched records"
        );

        Ok(PreparedJob {
            instance,
            tenant_id,
            fetched,
        })
    }

    /// Write the batch, advance the instance and append the run log
    async fn complete_job(&self, job: PreparedJob, start_time: Instant) -> Result<SyncJobResult> {
        let PreparedJob {
            instance,
            tenant_id,
            fetched,
        } = job;
        let instance_id = &instance.id;

        let tally = self
            .processor
            .process_batch(fetched.records, &tenant_id)
            .await;

        let completed_at = Utc::now();
        let advanced = if self.is_dry_run() {
            tracing::info!(instance_id = %instance_id, "Dry run: instance not advanced");
            Ok(())
        } else {
            self.advance_instance(&instance, fetched.next_cursor, completed_at)
                .await
        };

        let result = SyncJobResult::from_tally(&tally, start_time.elapsed());

        let mut entry = SyncRunLog {
            id: SyncLogId::generate(),
            instance_id: instance_id.clone(),
            profile_id: Some(instance.profile_id.clone()),
            operation: SyncOperation::from(instance.sync_direction),
            entity_type: tally.entity_label(),
            records_processed: tally.processed,
            records_success: tally.success,
            records_warning: tally.warning,
            records_error: tally.error,
            success: result.success,
            error_message: None,
            error_detail: None,
            duration_ms: result.duration_ms,
            failed_records: tally.failed_records,
            timestamp: completed_at,
        };
        if let Err(e) = &advanced {
            log_error_with_context!(e, "Failed to advance instance after processing");
            entry.success = false;
            entry.error_message = Some(e.to_string());
            entry.error_detail = Some(format!("{e:?}"));
        }

        let logged = self.gateway.log_sync_operation(entry).await;

        if let Err(e) = advanced {
            if let Err(log_err) = logged {
                log_error_with_context!(log_err, "Failed to write run log");
            }
            self.mark_failed(&instance, &e).await;
            return Err(e);
        }
        if let Err(e) = logged {
            log_error_with_context!(e, "Failed to write run log");
            self.mark_failed(&instance, &e).await;
            return Err(e);
        }

        result.log_summary(instance_id);
        log_sync_complete!(instance_id, result.records_processed, start_time.elapsed());

        Ok(result)
    }

    /// Persist cursor, last sync time, next schedule and status reset
    async fn advance_instance(
        &self,
        instance: &IntegrationInstance,
        next_cursor: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        // A blank continuation token would restart the next run from the top.
        if let Some(cursor) = next_cursor.filter(|c| !c.trim().is_empty()) {
            self.gateway.update_cursor(&instance.id, &cursor).await?;
        }

        self.gateway
            .update_last_sync(&instance.id, completed_at)
            .await?;

        let mut synced = instance.clone();
        synced.mark_synced(completed_at);

        self.gateway
            .update_schedule(&instance.id, synced.next_sync_at)
            .await?;

        if synced.status != instance.status {
            self.gateway
                .update_status(&instance.id, synced.status, synced.last_error)
                .await?;
        }

        Ok(())
    }

    async fn record_failure(
        &self,
        instance_id: &InstanceId,
        instance: Option<&IntegrationInstance>,
        error: &SyncError,
        start_time: Instant,
    ) {
        log_error_with_context!(error, "Sync job failed");

        let entry = SyncRunLog::failure(
            instance_id.clone(),
            instance.map(|i| i.profile_id.clone()),
            error.to_string(),
            format!("{error:?}"),
            start_time.elapsed().as_millis() as u64,
        );

        if let Err(e) = self.gateway.log_sync_operation(entry).await {
            log_error_with_context!(e, "Failed to write failure log");
        }

        if let Some(instance) = instance {
            self.mark_failed(instance, error).await;
        }
    }

    /// Move a loaded instance to `error` and schedule its next attempt
    async fn mark_failed(&self, instance: &IntegrationInstance, error: &SyncError) {
        if let Err(e) = self
            .gateway
            .update_status(&instance.id, InstanceStatus::Error, Some(error.to_string()))
            .await
        {
            log_error_with_context!(e, "Failed to set instance error status");
        }

        let next_sync_at = instance.sync_frequency.next_run_after(Utc::now());
        if let Err(e) = self.gateway.update_schedule(&instance.id, next_sync_at).await {
            log_error_with_context!(e, "Failed to reschedule failed instance");
        }
    }
}

/// A loaded instance together with the batch fetched for it
struct PreparedJob {
    instance: IntegrationInstance,
    tenant_id: TenantId,
    fetched: FetchResult,
}
