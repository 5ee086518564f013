//! In-memory entity store

use super::store::{EntityStore, TENANT_FIELD};
use crate::domain::ids::{EntityId, TenantId};
use crate::domain::record::{EntityType, FieldMap};
use crate::domain::{Result, SyncError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use tokio::sync::Mutex;

/// One accepted write
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntity {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub fields: FieldMap,
}

#[derive(Debug, Default)]
struct State {
    saved: Vec<StoredEntity>,
    failing: HashSet<EntityType>,
}

/// Records writes in order and hands out sequential ids (`{type}-{n}`)
///
/// Entity types passed to [`fail_on`](Self::fail_on) are rejected.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    state: Mutex<State>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent write of `entity_type`
    pub async fn fail_on(&self, entity_type: EntityType) {
        self.state.lock().await.failing.insert(entity_type);
    }

    pub async fn saved(&self) -> Vec<StoredEntity> {
        self.state.lock().await.saved.clone()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn save_entity(
        &self,
        entity_type: EntityType,
        fields: &FieldMap,
        tenant_id: &TenantId,
    ) -> Result<EntityId> {
        let mut state = self.state.lock().await;

        if state.failing.contains(&entity_type) {
            return Err(SyncError::EntityStore(format!(
                "Failed to save {entity_type}: rejected"
            )));
        }

        let id = EntityId::new(format!("{}-{}", entity_type, state.saved.len() + 1))
            .map_err(SyncError::EntityStore)?;

        let mut fields = fields.clone();
        fields.insert(
            TENANT_FIELD.to_string(),
            Value::String(tenant_id.as_str().to_string()),
        );

        state.saved.push(StoredEntity {
            id: id.clone(),
            entity_type,
            fields,
        });

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_saves_in_order_with_tenant() {
        let store = InMemoryEntityStore::new();
        let tenant = TenantId::new("company-1").unwrap();

        let first = store
            .save_entity(EntityType::Indicators, &FieldMap::new(), &tenant)
            .await
            .unwrap();
        let second = store
            .save_entity(EntityType::Values, &FieldMap::new(), &tenant)
            .await
            .unwrap();

        assert_eq!(first.as_str(), "indicators-1");
        assert_eq!(second.as_str(), "values-2");

        let saved = store.saved().await;
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].fields[TENANT_FIELD], "company-1");
    }

    #[tokio::test]
    async fn test_fail_on() {
        let store = InMemoryEntityStore::new();
        store.fail_on(EntityType::Values).await;
        let tenant = TenantId::new("company-1").unwrap();

        let err = store
            .save_entity(EntityType::Values, &FieldMap::new(), &tenant)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::EntityStore(_)));
        assert!(store.saved().await.is_empty());
    }
}
