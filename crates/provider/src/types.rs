// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rows, schemas, and serialized driver configs.

use crate::ProviderError;
use plume_core::{Value, ValueType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One row of an offline resource table: an entity keyed value at a point
/// in time (epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub entity: String,
    pub value: Value,
    pub ts: i64,
}

impl ResourceRecord {
    pub fn new(entity: impl Into<String>, value: impl Into<Value>, ts: i64) -> Self {
        Self { entity: entity.into(), value: value.into(), ts }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub value_type: ValueType,
}

/// Schema for a created table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<TableColumn>,
}

impl TableSchema {
    /// The conventional entity/value/ts schema for a resource table.
    pub fn resource(value_type: ValueType) -> Self {
        Self {
            columns: vec![
                TableColumn { name: "entity".to_string(), value_type: ValueType::String },
                TableColumn { name: "value".to_string(), value_type },
                TableColumn { name: "ts".to_string(), value_type: ValueType::Timestamp },
            ],
        }
    }
}

/// Column bindings mapping a source table onto the entity/value/ts shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceColumns {
    pub entity: String,
    pub value: String,
    pub ts: String,
}

impl Default for ResourceColumns {
    fn default() -> Self {
        Self { entity: "entity".to_string(), value: "value".to_string(), ts: "ts".to_string() }
    }
}

/// An opaque serialized driver config, shippable inside a runner config.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedConfig(pub Vec<u8>);

impl SerializedConfig {
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, ProviderError> {
        Ok(Self(serde_json::to_vec(value)?))
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        Ok(serde_json::from_slice(&self.0)?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
