//! Sync command implementation
//!
//! This module implements the `sync` command, which runs a sync job for a
//! single integration instance or sweeps every instance that is due.

use crate::adapters::gateway::create_gateway;
use crate::adapters::linkhub::HttpEntityStore;
use crate::adapters::provider::AdapterRegistry;
use crate::cli::{
    exit_code_for, EXIT_CONFIG, EXIT_CONNECTION, EXIT_INTERRUPTED, EXIT_OK, EXIT_PARTIAL,
};
use crate::config::load_config;
use crate::core::sync::{SweepSummary, SyncEngine, SyncJobResult};
use crate::domain::ids::InstanceId;
use chrono::Utc;
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the sync command
#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["instance", "due"])))]
pub struct SyncArgs {
    /// Integration instance id to sync
    #[arg(long)]
    pub instance: Option<String>,

    /// Sync every active instance whose next sync time has passed
    #[arg(long)]
    pub due: bool,

    /// Dry run mode - fetch and process without writing entities
    #[arg(long)]
    pub dry_run: bool,

    /// Override the fetch batch size
    #[arg(long)]
    pub batch_size: Option<usize>,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting sync command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Some(batch_size) = self.batch_size {
            tracing::info!(batch_size, "Overriding batch size from CLI");
            config.sync.batch_size = batch_size;
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        if config.application.dry_run {
            println!("🔍 DRY RUN MODE - No entities will be written");
            println!();
        }

        let registry = match AdapterRegistry::with_defaults(&config.providers) {
            Ok(r) => Arc::new(r),
            Err(e) => {
                eprintln!("Failed to initialize adapters: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let entity_store = match HttpEntityStore::new(&config.linkhub) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                eprintln!("Failed to initialize entity store: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let gateway = match create_gateway(&config).await {
            Ok(g) => g,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create persistence gateway");
                eprintln!("Failed to connect to store: {e}");
                return Ok(EXIT_CONNECTION);
            }
        };

        let engine = SyncEngine::from_config(&config, gateway, registry, entity_store)
            .with_shutdown_signal(shutdown_signal);

        match &self.instance {
            Some(id) => self.sync_one(&engine, id).await,
            None => self.sync_due(&engine).await,
        }
    }

    async fn sync_one(&self, engine: &SyncEngine, id: &str) -> anyhow::Result<i32> {
        let instance_id = match InstanceId::new(id) {
            Ok(id) => id,
            Err(e) => {
                eprintln!("Invalid instance id: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("🚀 Syncing instance {instance_id}...");
        println!();

        match engine.execute_sync_job(&instance_id).await {
            Ok(result) => {
                print_result(&result);
                if result.success {
                    println!("✅ Sync completed successfully!");
                    Ok(EXIT_OK)
                } else {
                    println!("⚠️  Sync completed with failures");
                    Ok(EXIT_PARTIAL)
                }
            }
            Err(e) => {
                eprintln!("Sync failed: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }

    async fn sync_due(&self, engine: &SyncEngine) -> anyhow::Result<i32> {
        println!("🚀 Syncing due instances...");
        println!();

        let summary = match engine.run_due(Utc::now()).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to list due instances: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        summary.log_summary();
        print_sweep(&summary);

        let exit_code = if summary.interrupted {
            println!("⚠️  Sweep interrupted. Remaining instances run on the next sweep.");
            EXIT_INTERRUPTED
        } else if summary.is_successful() {
            println!("✅ Sweep completed successfully!");
            EXIT_OK
        } else {
            println!("⚠️  Sweep completed with failures");
            EXIT_PARTIAL
        };

        Ok(exit_code)
    }
}

fn print_result(result: &SyncJobResult) {
    println!("📊 Sync Summary:");
    println!("  Records processed: {}", result.records_processed);
    println!("  Successful writes: {}", result.records_success);
    println!("  Failed writes: {}", result.records_error);
    println!("  Warnings: {}", result.records_warning);
    println!("  Duration: {}ms", result.duration_ms);
    println!();
}

fn print_sweep(summary: &SweepSummary) {
    println!("📊 Sweep Summary:");
    println!("  Instances: {}", summary.entries.len());
    println!("  Succeeded: {}", summary.succeeded());
    println!("  Partial: {}", summary.partial());
    println!("  Failed: {}", summary.failed());
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    for entry in &summary.entries {
        match &entry.outcome {
            Ok(result) => println!(
                "  {} processed={} success={} error={}",
                entry.instance_id,
                result.records_processed,
                result.records_success,
                result.records_error
            ),
            Err(message) => println!("  {} failed: {}", entry.instance_id, message),
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_args_defaults() {
        let args = SyncArgs {
            instance: Some("inst-1".to_string()),
            due: false,
            dry_run: false,
            batch_size: None,
        };

        assert_eq!(args.instance.as_deref(), Some("inst-1"));
        assert!(!args.dry_run);
        assert!(args.batch_size.is_none());
    }

    #[tokio::test]
    async fn test_missing_config_is_config_error() {
        let args = SyncArgs {
            instance: None,
            due: true,
            dry_run: false,
            batch_size: None,
        };
        let (_tx, rx) = watch::channel(false);

        let code = args.execute("does-not-exist.toml", rx).await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
