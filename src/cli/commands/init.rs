//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "linkhub-sync.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing linkhub-sync configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set store.backend to 'memory' or 'postgresql'");
                println!("  3. Create a .env file with your credentials:");
                println!("     - LINKHUB_API_TOKEN for entity writes");
                println!("     - HUBSPOT_CLIENT_ID and HUBSPOT_CLIENT_SECRET for token refresh");
                println!("     - LINKHUB_DATABASE_URL (if using PostgreSQL)");
                println!("  4. Validate configuration: linkhub-sync validate-config");
                println!("  5. Run a sync: linkhub-sync sync --due");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# linkhub-sync Configuration File

[application]
log_level = "info"
dry_run = false

[sync]
batch_size = 100

[store]
backend = "memory"

[linkhub]
base_url = "http://localhost:3000"

[providers.hubspot]
base_url = "https://api.hubspot.com"

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# linkhub-sync Configuration File
#
# Values of the form ${VAR} are read from the environment (or .env).
# Any setting can also be overridden with LINKHUB_<SECTION>_<KEY>.

# development | staging | production
environment = "development"

[application]
# trace | debug | info | warn | error
log_level = "info"
# Fetch and process records without writing entities or advancing instances
dry_run = false

[sync]
# Records requested per fetch (1-1000)
batch_size = 100

[store]
# memory | postgresql
backend = "postgresql"

[postgresql]
connection_string = "${LINKHUB_DATABASE_URL}"
max_connections = 10
connection_timeout_seconds = 30
statement_timeout_seconds = 60

[linkhub]
# LinkHub main API receiving indicators, values and initiatives
base_url = "https://app.linkhub.example"
api_token = "${LINKHUB_API_TOKEN}"
timeout_seconds = 30

[providers.hubspot]
base_url = "https://api.hubspot.com"
# Needed only for OAuth token refresh
client_id = "${HUBSPOT_CLIENT_ID}"
client_secret = "${HUBSPOT_CLIENT_SECRET}"
timeout_seconds = 30

[logging]
local_enabled = true
local_path = "/var/log/linkhub-sync"
# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}
