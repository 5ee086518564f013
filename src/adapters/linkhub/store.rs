//! Business entity store
//!
//! The sync engine writes indicators, initiatives and values through
//! [`EntityStore`]. [`HttpEntityStore`] targets the LinkHub main API.

use crate::config::schema::LinkHubConfig;
use crate::config::SecretString;
use crate::domain::ids::{EntityId, TenantId};
use crate::domain::record::{EntityType, FieldMap};
use crate::domain::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Tenant scoping field added to every write
pub const TENANT_FIELD: &str = "companyId";

/// Write access to the business schema
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Create one entity owned by `tenant_id` and return its id
    ///
    /// # Errors
    ///
    /// Returns `SyncError::EntityStore` when the write is rejected.
    async fn save_entity(
        &self,
        entity_type: EntityType,
        fields: &FieldMap,
        tenant_id: &TenantId,
    ) -> Result<EntityId>;
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Entity store backed by the LinkHub HTTP API
///
/// Each write is a `POST {base_url}/api/{entity_type}` with the field map plus
/// `companyId` as JSON body.
pub struct HttpEntityStore {
    client: Client,
    base_url: String,
    api_token: Option<SecretString>,
}

impl HttpEntityStore {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &LinkHubConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SyncError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn endpoint(&self, entity_type: EntityType) -> String {
        format!("{}/api/{}", self.base_url, entity_type.as_str())
    }
}

/// Pull the created id out of `data`
///
/// Accepts `id` or the type-specific key (`indicatorId`, `initiativeId`,
/// `valueId`), string or number.
fn extract_id(entity_type: EntityType, data: &Value) -> Option<String> {
    let typed_key = match entity_type {
        EntityType::Indicators => "indicatorId",
        EntityType::Initiatives => "initiativeId",
        EntityType::Values => "valueId",
    };

    ["id", typed_key]
        .iter()
        .filter_map(|key| data.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

#[async_trait]
impl EntityStore for HttpEntityStore {
    async fn save_entity(
        &self,
        entity_type: EntityType,
        fields: &FieldMap,
        tenant_id: &TenantId,
    ) -> Result<EntityId> {
        let mut body = fields.clone();
        body.insert(
            TENANT_FIELD.to_string(),
            Value::String(tenant_id.as_str().to_string()),
        );

        let mut request = self.client.post(self.endpoint(entity_type)).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret().as_ref());
        }

        let response = request.send().await.map_err(|e| {
            SyncError::EntityStore(format!("Failed to save {entity_type}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(
                entity_type = %entity_type,
                status = status.as_u16(),
                "Entity store rejected write"
            );
            return Err(SyncError::EntityStore(format!(
                "Failed to save {entity_type}: HTTP {} {}",
                status.as_u16(),
                text
            )));
        }

        let payload: SaveResponse = response.json().await.map_err(|e| {
            SyncError::EntityStore(format!("Invalid response saving {entity_type}: {e}"))
        })?;

        if payload.success == Some(false) {
            return Err(SyncError::EntityStore(format!(
                "Failed to save {entity_type}: {}",
                payload.error.as_deref().unwrap_or("unknown error")
            )));
        }

        let id = payload
            .data
            .as_ref()
            .and_then(|data| extract_id(entity_type, data))
            .ok_or_else(|| {
                SyncError::EntityStore(format!("Response for {entity_type} carried no id"))
            })?;

        tracing::debug!(entity_type = %entity_type, entity_id = %id, "Entity saved");
        EntityId::new(id).map_err(SyncError::EntityStore)
    }
}
