// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Online key-value store capability set.

use crate::{ProviderError, ProviderType, SerializedConfig};
use async_trait::async_trait;
use plume_core::{Value, ValueType};
use std::sync::Arc;

/// A single feature's online table: entity-keyed latest values.
#[async_trait]
pub trait OnlineTable: Send + Sync {
    async fn get(&self, entity: &str) -> Result<Value, ProviderError>;
    async fn set(&self, entity: &str, value: Value) -> Result<(), ProviderError>;
}

impl std::fmt::Debug for dyn OnlineTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn OnlineTable")
    }
}

/// Capability set of an online store.
#[async_trait]
pub trait OnlineStore: Send + Sync {
    /// Driver type tag, for serializing runner configs.
    fn provider_type(&self) -> ProviderType;

    /// Serialized driver config, for reconstructing the store in a worker.
    fn config(&self) -> SerializedConfig;

    /// Create the table for a feature variant.
    ///
    /// Re-creating an existing table returns the typed
    /// [`ProviderError::TableAlreadyExists`]; callers treat it as success.
    async fn create_table(
        &self,
        name: &str,
        variant: &str,
        value_type: ValueType,
    ) -> Result<Arc<dyn OnlineTable>, ProviderError>;

    /// Fetch the table for a feature variant.
    async fn get_table(
        &self,
        name: &str,
        variant: &str,
    ) -> Result<Arc<dyn OnlineTable>, ProviderError>;
}
