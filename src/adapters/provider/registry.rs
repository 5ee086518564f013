//! Adapter registry
//!
//! Immutable lookup from provider key to adapter, built once at startup and
//! shared with the sync engine.

use super::{HubSpotAdapter, IntegrationAdapter};
use crate::config::ProvidersConfig;
use crate::domain::{Result, SyncError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lookup table of registered adapters
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<String, Arc<dyn IntegrationAdapter>>,
}

impl AdapterRegistry {
    /// Start an empty registry builder
    pub fn builder() -> AdapterRegistryBuilder {
        AdapterRegistryBuilder::default()
    }

    /// Registry with every built-in adapter
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter cannot be constructed from its settings.
    pub fn with_defaults(settings: &ProvidersConfig) -> Result<Self> {
        let registry = Self::builder()
            .register(Arc::new(HubSpotAdapter::new(settings.hubspot.clone())?))
            .build();

        tracing::debug!(adapters = ?registry.list(), "Adapter registry initialized");
        Ok(registry)
    }

    /// Look up the adapter for a provider key
    ///
    /// # Errors
    ///
    /// Returns `AdapterNotFound` listing every registered key when the key is unknown.
    pub fn get(&self, key: &str) -> Result<Arc<dyn IntegrationAdapter>> {
        self.adapters
            .get(key)
            .cloned()
            .ok_or_else(|| SyncError::AdapterNotFound {
                provider: key.to_string(),
                available: self.list().join(", "),
            })
    }

    pub fn has(&self, key: &str) -> bool {
        self.adapters.contains_key(key)
    }

    /// Registered keys in sorted order
    pub fn list(&self) -> Vec<String> {
        self.adapters.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.list())
            .finish()
    }
}

/// Builder for [`AdapterRegistry`]
#[derive(Default)]
pub struct AdapterRegistryBuilder {
    adapters: BTreeMap<String, Arc<dyn IntegrationAdapter>>,
}

impl AdapterRegistryBuilder {
    /// Register an adapter under its own provider key
    ///
    /// A later registration with the same key replaces the earlier one.
    pub fn register(mut self, adapter: Arc<dyn IntegrationAdapter>) -> Self {
        self.adapters
            .insert(adapter.provider_key().to_string(), adapter);
        self
    }

    pub fn build(self) -> AdapterRegistry {
        AdapterRegistry {
            adapters: self.adapters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::provider::{FetchParams, FetchResult};
    use crate::domain::Credentials;
    use async_trait::async_trait;

    struct NamedAdapter(&'static str);

    #[async_trait]
    impl IntegrationAdapter for NamedAdapter {
        fn provider_key(&self) -> &str {
            self.0
        }

        async fn authenticate(&self, _credentials: &Credentials) -> Result<bool> {
            Ok(true)
        }

        async fn fetch_records(&self, _params: FetchParams) -> Result<FetchResult> {
            Ok(FetchResult::default())
        }
    }

    fn registry() -> AdapterRegistry {
        AdapterRegistry::builder()
            .register(Arc::new(NamedAdapter("powerbi")))
            .register(Arc::new(NamedAdapter("hubspot")))
            .build()
    }

    #[test]
    fn test_has_and_get_agree() {
        let registry = registry();
        for key in ["hubspot", "powerbi", "stripe"] {
            assert_eq!(registry.has(key), registry.get(key).is_ok());
        }
    }

    #[test]
    fn test_unknown_key_lists_registered_keys() {
        let err = registry().get("stripe").err().unwrap();
        match err {
            SyncError::AdapterNotFound {
                provider,
                available,
            } => {
                assert_eq!(provider, "stripe");
                assert_eq!(available, "hubspot, powerbi");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_list_is_sorted() {
        assert_eq!(registry().list(), vec!["hubspot", "powerbi"]);
    }

    #[test]
    fn test_with_defaults_registers_hubspot() {
        let registry = AdapterRegistry::with_defaults(&ProvidersConfig::default()).unwrap();
        assert!(registry.has("hubspot"));
        assert_eq!(registry.get("hubspot").unwrap().provider_key(), "hubspot");
    }

    #[test]
    fn test_empty_registry() {
        let registry = AdapterRegistry::builder().build();
        assert!(registry.is_empty());
        let err = registry.get("hubspot").err().unwrap();
        assert!(err.to_string().contains("Available adapters: "));
    }
}
