// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Offline warehouse capability set.

use crate::{ProviderError, ProviderType, ResourceColumns, ResourceRecord, SerializedConfig, TableSchema};
use async_trait::async_trait;
use plume_core::{ResourceId, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Opaque identity of an immutable materialization snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterializationId(pub String);

impl MaterializationId {
    /// Generate a fresh snapshot identity.
    pub fn generate() -> Self {
        Self(format!("mat-{}", nanoid::nanoid!(19)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MaterializationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable snapshot of a feature's offline table: the latest value per
/// entity, in entity order, with a known row count.
#[derive(Debug, Clone)]
pub struct Materialization {
    id: MaterializationId,
    rows: Arc<Vec<ResourceRecord>>,
}

impl Materialization {
    pub fn new(id: MaterializationId, rows: Vec<ResourceRecord>) -> Self {
        Self { id, rows: Arc::new(rows) }
    }

    pub fn id(&self) -> &MaterializationId {
        &self.id
    }

    pub fn num_rows(&self) -> u64 {
        self.rows.len() as u64
    }

    /// Rows in the half-open index range `[begin, end)`, clamped to bounds.
    pub fn segment(&self, begin: u64, end: u64) -> &[ResourceRecord] {
        let len = self.rows.len() as u64;
        let begin = begin.min(len) as usize;
        let end = end.min(len) as usize;
        &self.rows[begin..end]
    }
}

/// Definition of a training set: a label joined point-in-time with features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSetDef {
    pub id: ResourceId,
    pub label: ResourceId,
    pub features: Vec<ResourceId>,
}

/// One training example: the feature vector and its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSetRow {
    pub entity: String,
    pub features: Vec<Value>,
    pub label: Value,
}

/// Owned iterator over a stored training set, in entity order.
pub struct TrainingSetIterator {
    rows: std::vec::IntoIter<TrainingSetRow>,
    current: Option<TrainingSetRow>,
}

impl TrainingSetIterator {
    pub fn new(rows: Vec<TrainingSetRow>) -> Self {
        Self { rows: rows.into_iter(), current: None }
    }

    /// Advance to the next example. Returns false when exhausted.
    pub fn next_row(&mut self) -> bool {
        self.current = self.rows.next();
        self.current.is_some()
    }

    /// Feature vector of the current example.
    pub fn features(&self) -> &[Value] {
        self.current.as_ref().map(|r| r.features.as_slice()).unwrap_or(&[])
    }

    /// Label of the current example.
    pub fn label(&self) -> Option<&Value> {
        self.current.as_ref().map(|r| &r.label)
    }
}

impl Iterator for TrainingSetIterator {
    type Item = TrainingSetRow;

    fn next(&mut self) -> Option<TrainingSetRow> {
        self.rows.next()
    }
}

/// A writable resource table handle, as returned by
/// [`OfflineStore::create_resource_table`].
#[async_trait]
pub trait ResourceTable: Send + Sync {
    async fn write(&self, record: ResourceRecord) -> Result<(), ProviderError>;
}

/// Capability set of an offline warehouse.
#[async_trait]
pub trait OfflineStore: Send + Sync {
    /// Driver type tag, for serializing runner configs.
    fn provider_type(&self) -> ProviderType;

    /// Serialized driver config, for reconstructing the store in a worker.
    fn config(&self) -> SerializedConfig;

    /// Create an empty primary table with the given schema.
    async fn create_primary_table(
        &self,
        id: &ResourceId,
        schema: TableSchema,
    ) -> Result<(), ProviderError>;

    /// Register a pre-existing warehouse table as a primary table.
    /// Errors if the external table is absent.
    async fn register_primary_from_existing(
        &self,
        id: &ResourceId,
        external_name: &str,
    ) -> Result<(), ProviderError>;

    /// Store a transformation table defined by already-resolved SQL.
    async fn create_transformation(
        &self,
        id: &ResourceId,
        resolved_sql: &str,
    ) -> Result<(), ProviderError>;

    /// Provider-canonical name of a registered primary table.
    async fn get_primary_table(&self, id: &ResourceId) -> Result<String, ProviderError>;

    /// Provider-canonical name of a stored transformation table.
    async fn get_transformation_table(&self, id: &ResourceId) -> Result<String, ProviderError>;

    /// Create an empty, writable entity/value/ts resource table.
    async fn create_resource_table(
        &self,
        id: &ResourceId,
        schema: TableSchema,
    ) -> Result<Arc<dyn ResourceTable>, ProviderError>;

    /// Bind a feature or label resource table to a source table's rows
    /// through column bindings.
    async fn register_resource_from_source(
        &self,
        id: &ResourceId,
        source_table: &str,
        columns: &ResourceColumns,
    ) -> Result<(), ProviderError>;

    /// Snapshot a feature resource table into an immutable materialization.
    async fn create_materialization(
        &self,
        feature: &ResourceId,
    ) -> Result<Materialization, ProviderError>;

    /// Fetch a previously created materialization by ID.
    async fn get_materialization(
        &self,
        id: &MaterializationId,
    ) -> Result<Materialization, ProviderError>;

    /// Assemble and store a training set from its definition.
    async fn create_training_set(&self, def: TrainingSetDef) -> Result<(), ProviderError>;

    /// Iterate a stored training set in entity order.
    async fn get_training_set(
        &self,
        id: &ResourceId,
    ) -> Result<TrainingSetIterator, ProviderError>;
}

/// Provider-canonical name for a primary table.
pub fn primary_table_name(id: &ResourceId) -> String {
    format!("plume_primary__{}__{}", id.name, id.variant)
}

/// Provider-canonical name for a transformation table.
pub fn transformation_table_name(id: &ResourceId) -> String {
    format!("plume_transformation__{}__{}", id.name, id.variant)
}
