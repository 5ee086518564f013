//! Record processing
//!
//! Writes normalized records to the entity store in declaration order,
//! resolving multi-entity dependencies from the ids created earlier in the
//! same record.

use crate::adapters::linkhub::EntityStore;
use crate::core::sync::summary::RunTally;
use crate::domain::errors::FailedRecord;
use crate::domain::ids::{EntityId, TenantId};
use crate::domain::record::{EntityType, FieldMap, MultiEntityRecord, Record, SingleEntityRecord};
use crate::domain::{Result, SyncError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sequential record processor
pub struct RecordProcessor {
    entity_store: Arc<dyn EntityStore>,
    dry_run: bool,
    dry_run_counter: AtomicU64,
}

impl RecordProcessor {
    pub fn new(entity_store: Arc<dyn EntityStore>) -> Self {
        Self {
            entity_store,
            dry_run: false,
            dry_run_counter: AtomicU64::new(0),
        }
    }

    /// Skip entity store writes and synthesize `dry-run:{type}:{n}` ids
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Process a fetched batch
    ///
    /// Write failures are counted in the returned tally and never abort the
    /// batch.
    pub async fn process_batch(&self, records: Vec<Record>, tenant_id: &TenantId) -> RunTally {
        let mut tally = RunTally::new();

        for (index, record) in records.into_iter().enumerate() {
            tally.add_record(record.single_entity_type());
            match record {
                Record::Single(single) => {
                    self.process_single(single, index, tenant_id, &mut tally)
                        .await
                }
                Record::Multi(multi) => self.process_multi(multi, tenant_id, &mut tally).await,
            }
        }

        tally
    }

    async fn process_single(
        &self,
        record: SingleEntityRecord,
        index: usize,
        tenant_id: &TenantId,
        tally: &mut RunTally,
    ) {
        match self.save(record.entity_type, &record.fields, tenant_id).await {
            Ok(_) => tally.add_success(),
            Err(e) => {
                tracing::error!(
                    entity_type = %record.entity_type,
                    error = %e,
                    "Failed to save entity"
                );
                tally.add_failure(FailedRecord::new(
                    fallback_id(record.external_id, record.entity_type, index),
                    e.to_string(),
                ));
            }
        }
    }

    async fn process_multi(
        &self,
        record: MultiEntityRecord,
        tenant_id: &TenantId,
        tally: &mut RunTally,
    ) {
        let mut created: HashMap<(EntityType, usize), EntityId> = HashMap::new();

        for (index, entity) in record.entities.into_iter().enumerate() {
            let mut fields = entity.fields;

            if let Some(dependency) = &entity.depends_on {
                let Some(dep_id) = created.get(&dependency.key()) else {
                    let err = SyncError::DependencyUnresolved(format!(
                        "{}_{}",
                        dependency.entity_type, dependency.index
                    ));
                    tracing::warn!(
                        entity_type = %entity.entity_type,
                        index,
                        error = %err,
                        "Skipping entity with unresolved dependency"
                    );
                    tally.add_failure(FailedRecord::new(
                        fallback_id(entity.external_id, entity.entity_type, index),
                        err.to_string(),
                    ));
                    continue;
                };

                fields.insert(
                    dependency.field_name(),
                    Value::String(dep_id.as_str().to_string()),
                );
            }

            match self.save(entity.entity_type, &fields, tenant_id).await {
                Ok(id) => {
                    created.insert((entity.entity_type, index), id);
                    tally.add_success();
                }
                Err(e) => {
                    tracing::error!(
                        entity_type = %entity.entity_type,
                        index,
                        error = %e,
                        "Failed to save entity"
                    );
                    tally.add_failure(FailedRecord::new(
                        fallback_id(entity.external_id, entity.entity_type, index),
                        e.to_string(),
                    ));
                }
            }
        }
    }

    async fn save(
        &self,
        entity_type: EntityType,
        fields: &FieldMap,
        tenant_id: &TenantId,
    ) -> Result<EntityId> {
        if self.dry_run {
            let n = self.dry_run_counter.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(entity_type = %entity_type, "Dry run: skipping entity write");
            return EntityId::new(format!("dry-run:{entity_type}:{n}"))
                .map_err(SyncError::EntityStore);
        }

        self.entity_store
            .save_entity(entity_type, fields, tenant_id)
            .await
    }
}

fn fallback_id(external_id: Option<String>, entity_type: EntityType, index: usize) -> String {
    external_id.unwrap_or_else(|| format!("{entity_type}[{index}]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::linkhub::InMemoryEntityStore;
    use crate::domain::record::{Dependency, EntityWrite};
    use serde_json::json;

    fn fields(value: Value) -> FieldMap {
        value.as_object().cloned().unwrap_or_default()
    }

    fn tenant() -> TenantId {
        TenantId::new("company-1").unwrap()
    }

    #[tokio::test]
    async fn test_dependency_injection() {
        let store = Arc::new(InMemoryEntityStore::new());
        let processor = RecordProcessor::new(store.clone());

        let record = MultiEntityRecord::new(vec![
            EntityWrite::new(EntityType::Indicators, fields(json!({"description": "Revenue"}))),
            EntityWrite::new(EntityType::Values, fields(json!({"value": 10.0})))
                .depends_on(Dependency::new(EntityType::Indicators, 0)),
        ]);

        let tally = processor
            .process_batch(vec![record.into()], &tenant())
            .await;

        assert_eq!(tally.processed, 1);
        assert_eq!(tally.success, 2);
        assert_eq!(tally.error, 0);

        let saved = store.saved().await;
        assert_eq!(saved[1].fields["indicatorsId"], saved[0].id.as_str());
    }

    #[tokio::test]
    async fn test_custom_inject_field() {
        let store = Arc::new(InMemoryEntityStore::new());
        let processor = RecordProcessor::new(store.clone());

        let record = MultiEntityRecord::new(vec![
            EntityWrite::new(EntityType::Indicators, FieldMap::new()),
            EntityWrite::new(EntityType::Values, FieldMap::new()).depends_on(
                Dependency::new(EntityType::Indicators, 0).with_inject_field("indicatorId"),
            ),
        ]);

        processor
            .process_batch(vec![record.into()], &tenant())
            .await;

        let saved = store.saved().await;
        assert_eq!(saved[1].fields["indicatorId"], "indicators-1");
    }

    #[tokio::test]
    async fn test_failed_dependency_skips_dependent() {
        let store = Arc::new(InMemoryEntityStore::new());
        store.fail_on(EntityType::Indicators).await;
        let processor = RecordProcessor::new(store.clone());

        let record = MultiEntityRecord::new(vec![
            EntityWrite::new(EntityType::Indicators, FieldMap::new()).with_external_id("ind-1"),
            EntityWrite::new(EntityType::Values, FieldMap::new())
                .depends_on(Dependency::new(EntityType::Indicators, 0)),
            EntityWrite::new(EntityType::Initiatives, FieldMap::new()),
        ]);

        let tally = processor
            .process_batch(vec![record.into()], &tenant())
            .await;

        assert_eq!(tally.success, 1);
        assert_eq!(tally.error, 2);
        assert_eq!(tally.failed_records[0].external_id, "ind-1");
        assert_eq!(tally.failed_records[1].external_id, "values[1]");
        assert!(tally.failed_records[1].error.contains("indicators_0"));
        assert_eq!(store.saved().await.len(), 1);
    }

    #[tokio::test]
    async fn test_forward_dependency_is_an_error() {
        let store = Arc::new(InMemoryEntityStore::new());
        let processor = RecordProcessor::new(store.clone());

        let record = MultiEntityRecord::new(vec![
            EntityWrite::new(EntityType::Values, FieldMap::new())
                .depends_on(Dependency::new(EntityType::Indicators, 1)),
            EntityWrite::new(EntityType::Indicators, FieldMap::new()),
        ]);

        let tally = processor
            .process_batch(vec![record.into()], &tenant())
            .await;

        assert_eq!(tally.success, 1);
        assert_eq!(tally.error, 1);
    }

    #[tokio::test]
    async fn test_single_record_failures_are_counted() {
        let store = Arc::new(InMemoryEntityStore::new());
        store.fail_on(EntityType::Values).await;
        let processor = RecordProcessor::new(store.clone());

        let records: Vec<Record> = vec![
            SingleEntityRecord::new(EntityType::Indicators, FieldMap::new()).into(),
            SingleEntityRecord::new(EntityType::Values, FieldMap::new()).into(),
            SingleEntityRecord::new(EntityType::Indicators, FieldMap::new())
                .with_external_id("ext-3")
                .into(),
        ];

        let tally = processor.process_batch(records, &tenant()).await;
        assert_eq!(tally.processed, 3);
        assert_eq!(tally.success, 2);
        assert_eq!(tally.error, 1);
        assert_eq!(tally.failed_records[0].external_id, "values[1]");
        assert_eq!(tally.entity_label(), "mixed");
    }

    #[tokio::test]
    async fn test_dry_run_skips_writes() {
        let store = Arc::new(InMemoryEntityStore::new());
        let processor = RecordProcessor::new(store.clone()).with_dry_run(true);

        let record = MultiEntityRecord::new(vec![
            EntityWrite::new(EntityType::Indicators, FieldMap::new()),
            EntityWrite::new(EntityType::Values, FieldMap::new())
                .depends_on(Dependency::new(EntityType::Indicators, 0)),
        ]);

        let tally = processor
            .process_batch(vec![record.into()], &tenant())
            .await;

        assert_eq!(tally.success, 2);
        assert!(store.saved().await.is_empty());
    }
}
