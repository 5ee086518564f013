//! Adapters command implementation
//!
//! Lists the registered provider adapters and optionally checks an
//! instance configuration document against one of them.

use crate::adapters::provider::AdapterRegistry;
use crate::cli::{exit_code_for, EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use clap::Args;

/// Arguments for the adapters command
#[derive(Args, Debug)]
pub struct AdaptersArgs {
    /// Provider key whose config validation to run
    #[arg(long, requires = "config_json")]
    pub provider: Option<String>,

    /// Instance config as a JSON document
    #[arg(long, value_name = "JSON")]
    pub config_json: Option<String>,
}

impl AdaptersArgs {
    /// Execute the adapters command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let registry = match AdapterRegistry::with_defaults(&config.providers) {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Failed to initialize adapters");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let (Some(provider), Some(raw)) = (&self.provider, &self.config_json) else {
            println!("Registered adapters ({}):", registry.len());
            for key in registry.list() {
                println!("  - {key}");
            }
            return Ok(EXIT_OK);
        };

        let adapter = match registry.get(provider) {
            Ok(a) => a,
            Err(e) => {
                println!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                println!("❌ Config is not valid JSON: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let validation = adapter.validate_config(&value);
        if validation.valid {
            println!("✅ Config is valid for {provider}");
            Ok(EXIT_OK)
        } else {
            println!(
                "❌ Config is invalid for {provider}: {}",
                validation.error.unwrap_or_default()
            );
            Ok(EXIT_CONFIG)
        }
    }
}
