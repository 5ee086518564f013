//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{StoreBackend, SyncConfig};
use super::secret_string;
use crate::domain::errors::SyncError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`SyncConfig`]
/// 4. Applies environment variable overrides (`LINKHUB_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file is missing or unreadable, a
/// referenced variable is unset, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use linkhub_sync::config::loader::load_config;
///
/// let config = load_config("linkhub-sync.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SyncConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SyncError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SyncError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Same as [`load_config`] for an in-memory TOML document
pub fn load_config_from_str(contents: &str) -> Result<SyncConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SyncConfig = toml::from_str(&contents)
        .map_err(|e| SyncError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        SyncError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SyncError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SyncError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env(name).and_then(|v| v.parse().ok())
}

/// Applies environment variable overrides using the `LINKHUB_*` prefix
///
/// Variables follow the pattern `LINKHUB_<SECTION>_<KEY>`, for example
/// `LINKHUB_SYNC_BATCH_SIZE` or `LINKHUB_PROVIDERS_HUBSPOT_CLIENT_SECRET`.
/// Values that fail to parse are ignored.
fn apply_env_overrides(config: &mut SyncConfig) {
    if let Some(val) = env("LINKHUB_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env_parse("LINKHUB_APPLICATION_DRY_RUN") {
        config.application.dry_run = val;
    }

    if let Some(val) = env_parse("LINKHUB_SYNC_BATCH_SIZE") {
        config.sync.batch_size = val;
    }

    if let Some(val) = env("LINKHUB_STORE_BACKEND") {
        match val.to_lowercase().as_str() {
            "memory" => config.store.backend = StoreBackend::Memory,
            "postgresql" => config.store.backend = StoreBackend::PostgreSQL,
            other => tracing::warn!(value = other, "Ignoring unknown LINKHUB_STORE_BACKEND"),
        }
    }

    if let Some(pg) = config.postgresql.as_mut() {
        if let Some(val) = env("LINKHUB_POSTGRESQL_CONNECTION_STRING") {
            pg.connection_string = secret_string(val);
        }
        if let Some(val) = env_parse("LINKHUB_POSTGRESQL_MAX_CONNECTIONS") {
            pg.max_connections = val;
        }
    }

    if let Some(val) = env("LINKHUB_LINKHUB_BASE_URL") {
        config.linkhub.base_url = val;
    }
    if let Some(val) = env("LINKHUB_LINKHUB_API_TOKEN") {
        config.linkhub.api_token = Some(secret_string(val));
    }
    if let Some(val) = env_parse("LINKHUB_LINKHUB_TIMEOUT_SECONDS") {
        config.linkhub.timeout_seconds = val;
    }

    let hubspot = &mut config.providers.hubspot;
    if let Some(val) = env("LINKHUB_PROVIDERS_HUBSPOT_BASE_URL") {
        hubspot.base_url = val;
    }
    if let Some(val) = env("LINKHUB_PROVIDERS_HUBSPOT_CLIENT_ID") {
        hubspot.client_id = Some(val);
    }
    if let Some(val) = env("LINKHUB_PROVIDERS_HUBSPOT_CLIENT_SECRET") {
        hubspot.client_secret = Some(secret_string(val));
    }

    if let Some(val) = env_parse("LINKHUB_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env("LINKHUB_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env("LINKHUB_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("LOADER_TEST_TOKEN", "test_value");
        let result = substitute_env_vars("api_token = \"${LOADER_TEST_TOKEN}\"").unwrap();
        assert_eq!(result, "api_token = \"test_value\"\n");
        std::env::remove_var("LOADER_TEST_TOKEN");
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        let input = "# api_token = \"${LOADER_TEST_NEVER_SET}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("LOADER_TEST_MISSING");
        let err = substitute_env_vars("x = \"${LOADER_TEST_MISSING}\"").unwrap_err();
        assert!(err.to_string().contains("LOADER_TEST_MISSING"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(SyncError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[sync]
batch_size = 250

[linkhub]
base_url = "https://app.linkhub.example"
api_token = "lh-token"

[providers.hubspot]
client_id = "client"
client_secret = "secret"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.sync.batch_size, 250);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.providers.hubspot.base_url, "https://api.hubspot.com");
        assert_eq!(
            config
                .linkhub
                .api_token
                .as_ref()
                .unwrap()
                .expose_secret()
                .as_ref(),
            "lh-token"
        );
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let toml_content = r#"
[sync]
batch_size = 5000

[linkhub]
base_url = "https://app.linkhub.example"
"#;
        let err = load_config_from_str(toml_content).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }
}
