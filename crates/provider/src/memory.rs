// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory reference drivers.
//!
//! Instances are process-global, keyed by the instance name in their
//! serialized config: a runner reconstructed from config inside a worker
//! resolves to the same tables the coordinator planned against, which is
//! the in-process analogue of a shared external store.

use crate::offline::{
    primary_table_name, transformation_table_name, Materialization, MaterializationId,
    OfflineStore, ResourceTable, TrainingSetDef, TrainingSetIterator, TrainingSetRow,
};
use crate::online::{OnlineStore, OnlineTable};
use crate::{ProviderError, ProviderType, ResourceColumns, ResourceRecord, SerializedConfig, TableSchema};
use async_trait::async_trait;
use parking_lot::Mutex;
use plume_core::{ResourceId, Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

/// Config for a memory driver: the process-global instance to attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub instance: String,
}

impl MemoryConfig {
    pub fn new(instance: impl Into<String>) -> Self {
        Self { instance: instance.into() }
    }

    pub fn serialize(&self) -> SerializedConfig {
        // A struct of one string always serializes.
        SerializedConfig::encode(self).unwrap_or_default()
    }
}

static OFFLINE_INSTANCES: LazyLock<Mutex<HashMap<String, Arc<MemoryOfflineStore>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

static ONLINE_INSTANCES: LazyLock<Mutex<HashMap<String, Arc<MemoryOnlineStore>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Fetch or create the offline instance with the given name.
pub fn memory_offline(instance: &str) -> Arc<MemoryOfflineStore> {
    OFFLINE_INSTANCES
        .lock()
        .entry(instance.to_string())
        .or_insert_with(|| Arc::new(MemoryOfflineStore::new(instance)))
        .clone()
}

/// Fetch or create the online instance with the given name.
pub fn memory_online(instance: &str) -> Arc<MemoryOnlineStore> {
    ONLINE_INSTANCES
        .lock()
        .entry(instance.to_string())
        .or_insert_with(|| Arc::new(MemoryOnlineStore::new(instance)))
        .clone()
}

#[derive(Default)]
struct OfflineState {
    /// Canonical table name -> rows. Holds seeded external tables and the
    /// copies registered under primary-table names.
    tables: HashMap<String, Vec<ResourceRecord>>,
    /// Registered primary tables.
    primaries: HashMap<ResourceId, String>,
    /// Stored transformations: resolved SQL by resource.
    transformations: HashMap<ResourceId, String>,
    /// Feature/label resource tables.
    resources: HashMap<ResourceId, Vec<ResourceRecord>>,
    materializations: HashMap<MaterializationId, Materialization>,
    training_sets: HashMap<ResourceId, Vec<TrainingSetRow>>,
}

/// In-memory offline warehouse.
pub struct MemoryOfflineStore {
    instance: String,
    state: Arc<Mutex<OfflineState>>,
}

impl MemoryOfflineStore {
    fn new(instance: &str) -> Self {
        Self { instance: instance.to_string(), state: Arc::new(Mutex::new(OfflineState::default())) }
    }

    /// Seed a pre-existing warehouse table, as an external system would.
    pub fn seed_external_table(&self, name: &str, rows: Vec<ResourceRecord>) {
        self.state.lock().tables.insert(name.to_string(), rows);
    }

    /// Number of materialization snapshots taken so far.
    pub fn materialization_count(&self) -> usize {
        self.state.lock().materializations.len()
    }

    /// The stored resolved SQL of a transformation, if present.
    pub fn transformation_sql(&self, id: &ResourceId) -> Option<String> {
        self.state.lock().transformations.get(id).cloned()
    }
}

/// Latest record per entity, in entity order.
fn latest_per_entity(rows: &[ResourceRecord]) -> Vec<ResourceRecord> {
    let mut latest: BTreeMap<&str, &ResourceRecord> = BTreeMap::new();
    for row in rows {
        match latest.get(row.entity.as_str()) {
            Some(existing) if existing.ts >= row.ts => {}
            _ => {
                latest.insert(&row.entity, row);
            }
        }
    }
    latest.into_values().cloned().collect()
}

/// Latest value at or before `ts` for the entity, point-in-time correct.
fn value_as_of(rows: &[ResourceRecord], entity: &str, ts: i64) -> Value {
    rows.iter()
        .filter(|r| r.entity == entity && r.ts <= ts)
        .max_by_key(|r| r.ts)
        .map(|r| r.value.clone())
        .unwrap_or(Value::Nil)
}

#[async_trait]
impl OfflineStore for MemoryOfflineStore {
    fn provider_type(&self) -> ProviderType {
        ProviderType::MemoryOffline
    }

    fn config(&self) -> SerializedConfig {
        MemoryConfig::new(self.instance.clone()).serialize()
    }

    async fn create_primary_table(
        &self,
        id: &ResourceId,
        _schema: TableSchema,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        if state.primaries.contains_key(id) {
            return Err(ProviderError::TableAlreadyExists(id.clone()));
        }
        let table = primary_table_name(id);
        state.tables.insert(table.clone(), Vec::new());
        state.primaries.insert(id.clone(), table);
        Ok(())
    }

    async fn register_primary_from_existing(
        &self,
        id: &ResourceId,
        external_name: &str,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        if state.primaries.contains_key(id) {
            return Err(ProviderError::TableAlreadyExists(id.clone()));
        }
        let rows = state
            .tables
            .get(external_name)
            .cloned()
            .ok_or_else(|| ProviderError::ExternalTableNotFound(external_name.to_string()))?;
        let table = primary_table_name(id);
        state.tables.insert(table.clone(), rows);
        state.primaries.insert(id.clone(), table);
        Ok(())
    }

    async fn create_transformation(
        &self,
        id: &ResourceId,
        resolved_sql: &str,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        if state.transformations.contains_key(id) {
            return Err(ProviderError::TableAlreadyExists(id.clone()));
        }
        // The memory driver stores the resolved query as the table
        // definition; it executes no SQL.
        state.tables.insert(transformation_table_name(id), Vec::new());
        state.transformations.insert(id.clone(), resolved_sql.to_string());
        Ok(())
    }

    async fn get_primary_table(&self, id: &ResourceId) -> Result<String, ProviderError> {
        self.state
            .lock()
            .primaries
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::TableNotFound(id.clone()))
    }

    async fn get_transformation_table(&self, id: &ResourceId) -> Result<String, ProviderError> {
        let state = self.state.lock();
        if state.transformations.contains_key(id) {
            Ok(transformation_table_name(id))
        } else {
            Err(ProviderError::TableNotFound(id.clone()))
        }
    }

    async fn create_resource_table(
        &self,
        id: &ResourceId,
        _schema: TableSchema,
    ) -> Result<Arc<dyn ResourceTable>, ProviderError> {
        let mut state = self.state.lock();
        if state.resources.contains_key(id) {
            return Err(ProviderError::TableAlreadyExists(id.clone()));
        }
        state.resources.insert(id.clone(), Vec::new());
        Ok(Arc::new(MemoryResourceTable { id: id.clone(), state: self.state.clone() }))
    }

    async fn register_resource_from_source(
        &self,
        id: &ResourceId,
        source_table: &str,
        _columns: &ResourceColumns,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        let rows = state
            .tables
            .get(source_table)
            .cloned()
            .ok_or_else(|| ProviderError::ExternalTableNotFound(source_table.to_string()))?;
        // Re-registration refreshes the rows; scheduled re-runs rely on it.
        state.resources.insert(id.clone(), rows);
        Ok(())
    }

    async fn create_materialization(
        &self,
        feature: &ResourceId,
    ) -> Result<Materialization, ProviderError> {
        let mut state = self.state.lock();
        let rows = state
            .resources
            .get(feature)
            .ok_or_else(|| ProviderError::TableNotFound(feature.clone()))?;
        let mat = Materialization::new(MaterializationId::generate(), latest_per_entity(rows));
        state.materializations.insert(mat.id().clone(), mat.clone());
        Ok(mat)
    }

    async fn get_materialization(
        &self,
        id: &MaterializationId,
    ) -> Result<Materialization, ProviderError> {
        self.state
            .lock()
            .materializations
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::MaterializationNotFound(id.to_string()))
    }

    async fn create_training_set(&self, def: TrainingSetDef) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        if state.training_sets.contains_key(&def.id) {
            return Err(ProviderError::TableAlreadyExists(def.id.clone()));
        }
        let label_rows = state
            .resources
            .get(&def.label)
            .ok_or_else(|| ProviderError::TableNotFound(def.label.clone()))?;
        let mut examples: Vec<TrainingSetRow> = latest_per_entity(label_rows)
            .into_iter()
            .map(|label_row| {
                let features = def
                    .features
                    .iter()
                    .map(|fid| {
                        state
                            .resources
                            .get(fid)
                            .map(|rows| value_as_of(rows, &label_row.entity, label_row.ts))
                            .unwrap_or(Value::Nil)
                    })
                    .collect();
                TrainingSetRow { entity: label_row.entity, features, label: label_row.value }
            })
            .collect();
        examples.sort_by(|a, b| a.entity.cmp(&b.entity));
        state.training_sets.insert(def.id.clone(), examples);
        Ok(())
    }

    async fn get_training_set(
        &self,
        id: &ResourceId,
    ) -> Result<TrainingSetIterator, ProviderError> {
        self.state
            .lock()
            .training_sets
            .get(id)
            .cloned()
            .map(TrainingSetIterator::new)
            .ok_or_else(|| ProviderError::TableNotFound(id.clone()))
    }
}

struct MemoryResourceTable {
    id: ResourceId,
    state: Arc<Mutex<OfflineState>>,
}

#[async_trait]
impl ResourceTable for MemoryResourceTable {
    async fn write(&self, record: ResourceRecord) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        let rows = state
            .resources
            .get_mut(&self.id)
            .ok_or_else(|| ProviderError::TableNotFound(self.id.clone()))?;
        rows.push(record);
        Ok(())
    }
}

type OnlineKey = (String, String);

#[derive(Default)]
struct OnlineState {
    tables: HashMap<OnlineKey, Arc<MemoryOnlineTable>>,
}

/// In-memory online key-value store.
pub struct MemoryOnlineStore {
    instance: String,
    state: Mutex<OnlineState>,
}

impl MemoryOnlineStore {
    fn new(instance: &str) -> Self {
        Self { instance: instance.to_string(), state: Mutex::new(OnlineState::default()) }
    }
}

#[async_trait]
impl OnlineStore for MemoryOnlineStore {
    fn provider_type(&self) -> ProviderType {
        ProviderType::MemoryOnline
    }

    fn config(&self) -> SerializedConfig {
        MemoryConfig::new(self.instance.clone()).serialize()
    }

    async fn create_table(
        &self,
        name: &str,
        variant: &str,
        _value_type: ValueType,
    ) -> Result<Arc<dyn OnlineTable>, ProviderError> {
        let mut state = self.state.lock();
        let key = (name.to_string(), variant.to_string());
        if state.tables.contains_key(&key) {
            return Err(ProviderError::TableAlreadyExists(ResourceId::new(
                name,
                variant,
                plume_core::ResourceKind::Feature,
            )));
        }
        let table = Arc::new(MemoryOnlineTable::default());
        state.tables.insert(key, table.clone());
        Ok(table)
    }

    async fn get_table(
        &self,
        name: &str,
        variant: &str,
    ) -> Result<Arc<dyn OnlineTable>, ProviderError> {
        let state = self.state.lock();
        state
            .tables
            .get(&(name.to_string(), variant.to_string()))
            .map(|t| t.clone() as Arc<dyn OnlineTable>)
            .ok_or_else(|| {
                ProviderError::TableNotFound(ResourceId::new(
                    name,
                    variant,
                    plume_core::ResourceKind::Feature,
                ))
            })
    }
}

#[derive(Default)]
struct MemoryOnlineTable {
    values: Mutex<HashMap<String, Value>>,
}

#[async_trait]
impl OnlineTable for MemoryOnlineTable {
    async fn get(&self, entity: &str) -> Result<Value, ProviderError> {
        self.values
            .lock()
            .get(entity)
            .cloned()
            .ok_or_else(|| ProviderError::ValueNotFound(entity.to_string()))
    }

    async fn set(&self, entity: &str, value: Value) -> Result<(), ProviderError> {
        self.values.lock().insert(entity.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
