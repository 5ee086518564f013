//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for linkhub-sync using clap.

pub mod commands;

use crate::domain::{ErrorKind, SyncError};
use clap::{Parser, Subcommand};

/// Exit code for a clean run
pub const EXIT_OK: i32 = 0;
/// Exit code when a run completed with record errors
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code for configuration errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for connection and transport errors
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code for everything else
pub const EXIT_FATAL: i32 = 5;
/// Exit code after a shutdown signal (standard Unix convention)
pub const EXIT_INTERRUPTED: i32 = 130;

/// Map an error to a process exit code
pub fn exit_code_for(error: &SyncError) -> i32 {
    match error.kind() {
        ErrorKind::Configuration => EXIT_CONFIG,
        ErrorKind::Transport => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}

/// linkhub-sync - integration sync engine for LinkHub
#[derive(Parser, Debug)]
#[command(name = "linkhub-sync")]
#[command(version, about, long_about = None)]
#[command(author = "LinkHub Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "linkhub-sync.toml", env = "LINKHUB_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LINKHUB_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a sync job for one instance or every due instance
    Sync(commands::sync::SyncArgs),

    /// Show recent sync runs
    Status(commands::status::StatusArgs),

    /// List registered provider adapters
    Adapters(commands::adapters::AdaptersArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_sync_instance() {
        let cli = Cli::parse_from(["linkhub-sync", "sync", "--instance", "inst-1"]);
        assert_eq!(cli.config, "linkhub-sync.toml");
        match cli.command {
            Commands::Sync(args) => assert_eq!(args.instance.as_deref(), Some("inst-1")),
            _ => panic!("expected sync command"),
        }
    }

    #[test]
    fn test_cli_sync_requires_target() {
        assert!(Cli::try_parse_from(["linkhub-sync", "sync"]).is_err());
        assert!(
            Cli::try_parse_from(["linkhub-sync", "sync", "--instance", "a", "--due"]).is_err()
        );
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["linkhub-sync", "--config", "custom.toml", "sync", "--due"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["linkhub-sync", "--log-level", "debug", "adapters"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["linkhub-sync", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["linkhub-sync", "status", "--profile", "p1"]);
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["linkhub-sync", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for(&SyncError::InstanceNotFound("x".to_string())),
            EXIT_CONFIG
        );
        assert_eq!(
            exit_code_for(&SyncError::Api {
                provider: "HubSpot".to_string(),
                status: 502
            }),
            EXIT_CONNECTION
        );
        assert_eq!(
            exit_code_for(&SyncError::Database("down".to_string())),
            EXIT_FATAL
        );
    }
}
