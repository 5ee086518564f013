//! Integration instance and provider catalog models
//!
//! An [`IntegrationInstance`] is the configured connection between one
//! integrator profile and one provider. It carries the credentials, the
//! incremental cursor and the scheduling state the sync engine reads and
//! advances on every run.

use crate::config::SecretString;
use crate::domain::ids::{InstanceId, ProfileId, ProviderId, TenantId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wizard progress of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStep {
    #[default]
    NotStarted,
    Connection,
    Mapping,
    SyncConfig,
    Completed,
}

/// Direction of data flow for an instance or a provider capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    #[default]
    Import,
    Export,
    Bidirectional,
}

/// How often the scheduler should run an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncFrequency {
    #[default]
    Manual,
    Hourly,
    Daily,
    Weekly,
}

impl SyncFrequency {
    /// Interval between runs, `None` for manual instances
    pub fn interval(&self) -> Option<Duration> {
        match self {
            SyncFrequency::Manual => None,
            SyncFrequency::Hourly => Some(Duration::hours(1)),
            SyncFrequency::Daily => Some(Duration::hours(24)),
            SyncFrequency::Weekly => Some(Duration::days(7)),
        }
    }

    /// Next run time after a sync that finished at `completed_at`
    pub fn next_run_after(&self, completed_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.interval().map(|interval| completed_at + interval)
    }
}

/// Operational status of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Active,
    Paused,
    Error,
    #[default]
    SetupIncomplete,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Active => "active",
            InstanceStatus::Paused => "paused",
            InstanceStatus::Error => "error",
            InstanceStatus::SetupIncomplete => "setup_incomplete",
        }
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored provider credentials
///
/// Token values are secrets; `Debug` output shows them as redacted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<SecretString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<SecretString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Access token expiry as epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl Credentials {
    /// Credentials holding only an access token
    pub fn with_access_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(crate::config::secret_string(token)),
            ..Self::default()
        }
    }

    /// True when the expiry is known and already passed at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|expires| expires <= now.timestamp_millis())
            .unwrap_or(false)
    }
}

/// Configured connection between a profile and a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationInstance {
    pub id: InstanceId,
    pub profile_id: ProfileId,

    /// Company the profile belongs to; every entity write is scoped to it
    #[serde(default)]
    pub tenant_id: Option<TenantId>,

    pub provider_id: ProviderId,

    #[serde(default)]
    pub setup_step: SetupStep,

    #[serde(default)]
    pub credentials: Credentials,

    #[serde(default)]
    pub sync_direction: SyncDirection,

    #[serde(default)]
    pub sync_frequency: SyncFrequency,

    #[serde(default)]
    pub status: InstanceStatus,

    pub last_sync_at: Option<DateTime<Utc>>,
    pub next_sync_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,

    /// Opaque continuation token returned by the adapter
    pub last_modified_cursor: Option<String>,

    /// Provider-specific settings, interpreted only by the adapter
    #[serde(default)]
    pub config: Value,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IntegrationInstance {
    /// Whether the instance takes part in scheduled and "active" queries
    pub fn is_active(&self) -> bool {
        self.status == InstanceStatus::Active
    }

    /// Whether the scheduler may pick the instance up
    ///
    /// Instances in `error` status stay scheduled so a later run can recover
    /// them. Paused and incomplete instances never run on schedule.
    pub fn is_schedulable(&self) -> bool {
        matches!(self.status, InstanceStatus::Active | InstanceStatus::Error)
    }

    /// Whether the instance should run at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_schedulable() && self.next_sync_at.map(|next| next <= now).unwrap_or(false)
    }

    /// Move to `error` status, rejecting an empty message
    pub fn mark_error(&mut self, message: impl Into<String>) -> Result<(), String> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err("An instance in error status needs a non-empty last error".to_string());
        }
        self.status = InstanceStatus::Error;
        self.last_error = Some(message);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record a completed run at `completed_at`
    ///
    /// Schedules the next run from the frequency and clears a previous
    /// error status. Paused and incomplete instances keep their status.
    pub fn mark_synced(&mut self, completed_at: DateTime<Utc>) {
        self.last_sync_at = Some(completed_at);
        self.next_sync_at = self.sync_frequency.next_run_after(completed_at);
        if self.status == InstanceStatus::Error {
            self.status = InstanceStatus::Active;
            self.last_error = None;
        }
        self.updated_at = completed_at;
    }
}

/// Builder for creating IntegrationInstance values
pub struct IntegrationInstanceBuilder {
    id: Option<InstanceId>,
    profile_id: ProfileId,
    provider_id: ProviderId,
    tenant_id: Option<TenantId>,
    setup_step: SetupStep,
    credentials: Credentials,
    sync_direction: SyncDirection,
    sync_frequency: SyncFrequency,
    status: InstanceStatus,
    next_sync_at: Option<DateTime<Utc>>,
    cursor: Option<String>,
    config: Value,
}

impl IntegrationInstanceBuilder {
    pub fn new(profile_id: ProfileId, provider_id: ProviderId) -> Self {
        Self {
            id: None,
            profile_id,
            provider_id,
            tenant_id: None,
            setup_step: SetupStep::NotStarted,
            credentials: Credentials::default(),
            sync_direction: SyncDirection::Import,
            sync_frequency: SyncFrequency::Manual,
            status: InstanceStatus::SetupIncomplete,
            next_sync_at: None,
            cursor: None,
            config: Value::Null,
        }
    }

    pub fn id(mut self, id: InstanceId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn tenant_id(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn setup_step(mut self, step: SetupStep) -> Self {
        self.setup_step = step;
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn sync_direction(mut self, direction: SyncDirection) -> Self {
        self.sync_direction = direction;
        self
    }

    pub fn sync_frequency(mut self, frequency: SyncFrequency) -> Self {
        self.sync_frequency = frequency;
        self
    }

    pub fn status(mut self, status: InstanceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn next_sync_at(mut self, at: DateTime<Utc>) -> Self {
        self.next_sync_at = Some(at);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> IntegrationInstance {
        let now = Utc::now();
        IntegrationInstance {
            id: self.id.unwrap_or_else(InstanceId::generate),
            profile_id: self.profile_id,
            tenant_id: self.tenant_id,
            provider_id: self.provider_id,
            setup_step: self.setup_step,
            credentials: self.credentials,
            sync_direction: self.sync_direction,
            sync_frequency: self.sync_frequency,
            status: self.status,
            last_sync_at: None,
            next_sync_at: self.next_sync_at,
            last_error: None,
            last_modified_cursor: self.cursor,
            config: self.config,
            created_at: now,
            updated_at: now,
        }
    }
}

/// How a provider authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    OAuth2,
    ApiKey,
    Basic,
}

/// Provider catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,

    /// Adapter registry key
    pub slug: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub sync_directions: Vec<SyncDirection>,

    pub auth_type: AuthType,

    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Provider {
    /// Catalog entry with an empty description and no categories
    pub fn new(slug: impl Into<String>, name: impl Into<String>, auth_type: AuthType) -> Self {
        Self {
            id: ProviderId::generate(),
            slug: slug.into(),
            name: name.into(),
            description: String::new(),
            categories: Vec::new(),
            sync_directions: vec![SyncDirection::Import],
            auth_type,
            active: true,
        }
    }
}
