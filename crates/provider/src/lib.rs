// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! plume-provider: uniform capability surface over offline warehouses and
//! online key-value stores.
//!
//! A [`Provider`] is a configured driver reference; [`OfflineStore`] and
//! [`OnlineStore`] are the two capability sets a driver may expose. Every
//! store also exposes its type tag and serialized config so a runner can be
//! serialized, shipped to a worker, and reconstructed there via [`get`].
//!
//! Only the in-memory reference drivers ship in this repo; warehouse and
//! cache drivers are external collaborators registered by type tag.

pub mod error;
pub mod memory;
pub mod offline;
pub mod online;
pub mod types;

pub use error::ProviderError;
pub use memory::{memory_offline, memory_online, MemoryConfig, MemoryOfflineStore, MemoryOnlineStore};
pub use offline::{
    primary_table_name, transformation_table_name, Materialization, MaterializationId,
    OfflineStore, ResourceTable, TrainingSetDef, TrainingSetIterator, TrainingSetRow,
};
pub use online::{OnlineStore, OnlineTable};
pub use types::{ResourceColumns, ResourceRecord, SerializedConfig, TableColumn, TableSchema};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Type tag identifying a provider driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "MEMORY_OFFLINE")]
    MemoryOffline,
    #[serde(rename = "MEMORY_ONLINE")]
    MemoryOnline,
    #[serde(rename = "POSTGRES_OFFLINE")]
    PostgresOffline,
    #[serde(rename = "REDIS_ONLINE")]
    RedisOnline,
}

plume_core::simple_display! {
    ProviderType {
        MemoryOffline => "MEMORY_OFFLINE",
        MemoryOnline => "MEMORY_ONLINE",
        PostgresOffline => "POSTGRES_OFFLINE",
        RedisOnline => "REDIS_ONLINE",
    }
}

impl ProviderType {
    /// Parse a provider type tag as stored in metadata definitions.
    pub fn parse(s: &str) -> Result<Self, ProviderError> {
        match s {
            "MEMORY_OFFLINE" => Ok(Self::MemoryOffline),
            "MEMORY_ONLINE" => Ok(Self::MemoryOnline),
            "POSTGRES_OFFLINE" => Ok(Self::PostgresOffline),
            "REDIS_ONLINE" => Ok(Self::RedisOnline),
            other => Err(ProviderError::UnknownType(other.to_string())),
        }
    }
}

/// A configured driver, castable to the capability set it implements.
#[derive(Clone)]
pub struct Provider {
    provider_type: ProviderType,
    offline: Option<Arc<dyn OfflineStore>>,
    online: Option<Arc<dyn OnlineStore>>,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider").field("provider_type", &self.provider_type).finish()
    }
}

impl Provider {
    pub fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    /// Cast to an offline store. Declaring an online provider where an
    /// offline store is required is a hard error, not a fallback.
    pub fn as_offline(&self) -> Result<Arc<dyn OfflineStore>, ProviderError> {
        self.offline.clone().ok_or(ProviderError::NotOfflineStore(self.provider_type))
    }

    /// Cast to an online store.
    pub fn as_online(&self) -> Result<Arc<dyn OnlineStore>, ProviderError> {
        self.online.clone().ok_or(ProviderError::NotOnlineStore(self.provider_type))
    }
}

/// Construct a provider from its type tag and serialized config.
///
/// Memory providers resolve to process-global instances keyed by the
/// instance name in their config, so a runner reconstructed inside a worker
/// observes the same tables. Warehouse and cache types have no in-tree
/// driver and fail with [`ProviderError::NoDriver`].
pub fn get(provider_type: ProviderType, config: &SerializedConfig) -> Result<Provider, ProviderError> {
    match provider_type {
        ProviderType::MemoryOffline => {
            let cfg: MemoryConfig = config.decode()?;
            Ok(Provider {
                provider_type,
                offline: Some(memory_offline(&cfg.instance)),
                online: None,
            })
        }
        ProviderType::MemoryOnline => {
            let cfg: MemoryConfig = config.decode()?;
            Ok(Provider { provider_type, offline: None, online: Some(memory_online(&cfg.instance)) })
        }
        ProviderType::PostgresOffline | ProviderType::RedisOnline => {
            Err(ProviderError::NoDriver(provider_type))
        }
    }
}
