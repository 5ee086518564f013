//! Status command implementation
//!
//! This module implements the `status` command for displaying recent sync
//! runs for a profile or a single integration instance.

use crate::adapters::gateway::{create_gateway, DEFAULT_LOG_LIMIT};
use crate::cli::{EXIT_CONFIG, EXIT_CONNECTION, EXIT_FATAL, EXIT_OK};
use crate::config::load_config;
use crate::domain::ids::{InstanceId, ProfileId};
use crate::domain::SyncRunLog;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("scope").required(true).args(["profile", "instance"])))]
pub struct StatusArgs {
    /// Show runs for every instance of this profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Show runs and schedule for one instance
    #[arg(long)]
    pub instance: Option<String>,

    /// Maximum number of runs to show
    #[arg(long, default_value_t = DEFAULT_LOG_LIMIT)]
    pub limit: usize,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking sync status");

        println!("📊 Sync Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let gateway = match create_gateway(&config).await {
            Ok(g) => g,
            Err(e) => {
                println!("❌ Failed to connect to store");
                println!("   Error: {e}");
                return Ok(EXIT_CONNECTION);
            }
        };

        let logs = if let Some(instance) = &self.instance {
            let Ok(instance_id) = InstanceId::new(instance.as_str()) else {
                println!("❌ Invalid instance id");
                return Ok(EXIT_CONFIG);
            };

            match gateway.get_instance(&instance_id).await {
                Ok(Some(instance)) => {
                    println!("Instance: {}", instance.id);
                    println!("  Status: {}", instance.status);
                    println!("  Frequency: {:?}", instance.sync_frequency);
                    println!("  Last sync: {}", format_time(instance.last_sync_at));
                    println!("  Next sync: {}", format_time(instance.next_sync_at));
                    if let Some(error) = &instance.last_error {
                        println!("  Last error: {error}");
                    }
                    println!();
                }
                Ok(None) => {
                    println!("❌ Integration instance not found: {instance_id}");
                    return Ok(EXIT_CONFIG);
                }
                Err(e) => {
                    println!("❌ Failed to load instance");
                    println!("   Error: {e}");
                    return Ok(EXIT_FATAL);
                }
            }

            gateway
                .get_instance_logs(&instance_id, Some(self.limit))
                .await
        } else {
            let profile = self.profile.as_deref().unwrap_or_default();
            let Ok(profile_id) = ProfileId::new(profile) else {
                println!("❌ Invalid profile id");
                return Ok(EXIT_CONFIG);
            };
            gateway
                .get_recent_sync_logs(&profile_id, Some(self.limit))
                .await
        };

        let logs = match logs {
            Ok(l) => l,
            Err(e) => {
                println!("❌ Failed to load sync logs");
                println!("   Error: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        if logs.is_empty() {
            println!("No sync history found.");
            println!("Run 'linkhub-sync sync' to start syncing.");
            return Ok(EXIT_OK);
        }

        print_logs(&logs);
        Ok(EXIT_OK)
    }
}

fn format_time(time: Option<chrono::DateTime<chrono::Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Never".to_string())
}

fn print_logs(logs: &[SyncRunLog]) {
    println!("Found {} run(s):", logs.len());
    println!();
    println!(
        "{:<21} {:<38} {:<8} {:<12} {:<10} {:<8} {:<8} {:<10}",
        "Timestamp", "Instance", "Op", "Entity", "Processed", "Success", "Errors", "Duration"
    );
    println!("{}", "-".repeat(120));

    for log in logs {
        let marker = if log.success { "✅" } else { "❌" };
        println!(
            "{:<21} {:<38} {:<8} {:<12} {:<10} {:<8} {:<8} {:<10} {}",
            log.timestamp.format("%Y-%m-%d %H:%M:%S"),
            log.instance_id,
            format!("{:?}", log.operation).to_lowercase(),
            log.entity_type,
            log.records_processed,
            log.records_success,
            log.records_error,
            format!("{}ms", log.duration_ms),
            marker
        );
        if let Some(message) = &log.error_message {
            println!("    Error: {message}");
        }
        for failed in log.failed_records.iter().take(5) {
            println!("    - {}: {}", failed.external_id, failed.error);
        }
        if log.failed_records.len() > 5 {
            println!("    ... and {} more failures", log.failed_records.len() - 5);
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(None), "Never");
        let t = chrono::DateTime::parse_from_rfc3339("2024-03-15T10:30:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        assert_eq!(format_time(Some(t)), "2024-03-15 10:30:00");
    }
}
