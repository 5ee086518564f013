//! Normalized record model
//!
//! Adapters translate provider-native objects into [`Record`] values. A record
//! is either a single business entity write or an ordered list of writes in
//! which later entries may reference ids produced by earlier ones.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Field payload for one business entity write
pub type FieldMap = serde_json::Map<String, Value>;

/// Business entity categories the sync engine writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Indicators,
    Initiatives,
    Values,
}

impl EntityType {
    /// Returns the collection name used by the entity store
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Indicators => "indicators",
            EntityType::Initiatives => "initiatives",
            EntityType::Values => "values",
        }
    }

    /// Default field used when injecting this entity's id into a dependent write
    pub fn default_inject_field(&self) -> String {
        format!("{}Id", self.as_str())
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "indicators" => Ok(EntityType::Indicators),
            "initiatives" => Ok(EntityType::Initiatives),
            "values" => Ok(EntityType::Values),
            other => Err(format!("Unknown entity type: {other}")),
        }
    }
}

/// A single business entity write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleEntityRecord {
    pub entity_type: EntityType,
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl SingleEntityRecord {
    pub fn new(entity_type: EntityType, fields: FieldMap) -> Self {
        Self {
            entity_type,
            fields,
            external_id: None,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// Reference from one entity write to an earlier one in the same record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Entity type of the referenced write
    pub entity_type: EntityType,

    /// Position of the referenced write in the record's entity list
    pub index: usize,

    /// Field that receives the referenced id; defaults to `{entity_type}Id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject_field: Option<String>,
}

impl Dependency {
    pub fn new(entity_type: EntityType, index: usize) -> Self {
        Self {
            entity_type,
            index,
            inject_field: None,
        }
    }

    pub fn with_inject_field(mut self, field: impl Into<String>) -> Self {
        self.inject_field = Some(field.into());
        self
    }

    /// Field name the resolved id is written into
    pub fn field_name(&self) -> String {
        self.inject_field
            .clone()
            .unwrap_or_else(|| self.entity_type.default_inject_field())
    }

    /// Key used to look up the referenced id among already-created entities
    pub fn key(&self) -> (EntityType, usize) {
        (self.entity_type, self.index)
    }
}

/// One entry of a multi-entity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityWrite {
    pub entity_type: EntityType,
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Dependency>,
}

impl EntityWrite {
    pub fn new(entity_type: EntityType, fields: FieldMap) -> Self {
        Self {
            entity_type,
            fields,
            external_id: None,
            depends_on: None,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.depends_on = Some(dependency);
        self
    }
}

/// Ordered list of entity writes with dependency declarations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiEntityRecord {
    pub entities: Vec<EntityWrite>,
}

impl MultiEntityRecord {
    pub fn new(entities: Vec<EntityWrite>) -> Self {
        Self { entities }
    }

    /// Reports dependency declarations that can never resolve
    ///
    /// A dependency must point at an earlier entry whose entity type matches
    /// the declared one. Returns one message per offending entry.
    pub fn validate_dependencies(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (position, entity) in self.entities.iter().enumerate() {
            let Some(dep) = &entity.depends_on else {
                continue;
            };

            if dep.index >= position {
                problems.push(format!(
                    "{}[{}] depends on {}[{}], which is not an earlier entity",
                    entity.entity_type, position, dep.entity_type, dep.index
                ));
                continue;
            }

            let target = &self.entities[dep.index];
            if target.entity_type != dep.entity_type {
                problems.push(format!(
                    "{}[{}] depends on {}[{}], but that entry is {}",
                    entity.entity_type, position, dep.entity_type, dep.index, target.entity_type
                ));
            }
        }

        problems
    }
}

/// A normalized record produced by an adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Single(SingleEntityRecord),
    Multi(MultiEntityRecord),
}

impl Record {
    /// Number of entity writes this record will produce
    pub fn write_count(&self) -> usize {
        match self {
            Record::Single(_) => 1,
            Record::Multi(multi) => multi.entities.len(),
        }
    }

    /// Entity type when this is a single-entity record
    pub fn single_entity_type(&self) -> Option<EntityType> {
        match self {
            Record::Single(single) => Some(single.entity_type),
            Record::Multi(_) => None,
        }
    }
}

impl From<SingleEntityRecord> for Record {
    fn from(record: SingleEntityRecord) -> Self {
        Record::Single(record)
    }
}

impl From<MultiEntityRecord> for Record {
    fn from(record: MultiEntityRecord) -> Self {
        Record::Multi(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> FieldMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_entity_type_round_trip_names() {
        assert_eq!(EntityType::Indicators.as_str(), "indicators");
        assert_eq!("values".parse::<EntityType>().unwrap(), EntityType::Values);
        assert!("deals".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_dependency_default_field_name() {
        let dep = Dependency::new(EntityType::Indicators, 0);
        assert_eq!(dep.field_name(), "indicatorsId");

        let dep = dep.with_inject_field("indicatorId");
        assert_eq!(dep.field_name(), "indicatorId");
    }

    #[test]
    fn test_validate_dependencies_accepts_backward_reference() {
        let record = MultiEntityRecord::new(vec![
            EntityWrite::new(EntityType::Indicators, fields(json!({"description": "x"}))),
            EntityWrite::new(EntityType::Values, fields(json!({"value": 1})))
                .depends_on(Dependency::new(EntityType::Indicators, 0)),
        ]);
        assert!(record.validate_dependencies().is_empty());
    }

    #[test]
    fn test_validate_dependencies_reports_forward_and_self_reference() {
        let record = MultiEntityRecord::new(vec![
            EntityWrite::new(EntityType::Values, FieldMap::new())
                .depends_on(Dependency::new(EntityType::Indicators, 1)),
            EntityWrite::new(EntityType::Indicators, FieldMap::new())
                .depends_on(Dependency::new(EntityType::Indicators, 1)),
        ]);
        assert_eq!(record.validate_dependencies().len(), 2);
    }

    #[test]
    fn test_validate_dependencies_reports_type_mismatch() {
        let record = MultiEntityRecord::new(vec![
            EntityWrite::new(EntityType::Initiatives, FieldMap::new()),
            EntityWrite::new(EntityType::Values, FieldMap::new())
                .depends_on(Dependency::new(EntityType::Indicators, 0)),
        ]);
        let problems = record.validate_dependencies();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("initiatives"));
    }

    #[test]
    fn test_record_serialization_tag() {
        let record: Record =
            SingleEntityRecord::new(EntityType::Indicators, fields(json!({"a": 1}))).into();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "single");
        assert_eq!(json["entity_type"], "indicators");
        assert_eq!(record.write_count(), 1);
    }
}
