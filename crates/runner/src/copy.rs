// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunk-copy runner: loads one row chunk of a materialization into the
//! online store. Registered as `COPY_TO_ONLINE`; one instance per chunk.

use crate::{sync_watcher, CompletionWatcher, Runner, RunnerError};
use async_trait::async_trait;
use plume_core::ResourceId;
use plume_provider::{MaterializationId, ProviderType, SerializedConfig};
use serde::{Deserialize, Serialize};

/// Chunk descriptor shipped to workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedChunkRunnerConfig {
    pub online_type: ProviderType,
    pub offline_type: ProviderType,
    pub online_config: SerializedConfig,
    pub offline_config: SerializedConfig,
    pub materialization_id: MaterializationId,
    pub resource_id: ResourceId,
    pub chunk_size: u64,
    pub chunk_idx: u64,
}

impl MaterializedChunkRunnerConfig {
    pub fn serialize(&self) -> Result<Vec<u8>, RunnerError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, RunnerError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Copies the rows of one chunk from a materialization into the online
/// table for the resource.
pub struct ChunkRunner {
    config: MaterializedChunkRunnerConfig,
}

impl ChunkRunner {
    pub fn new(config: MaterializedChunkRunnerConfig) -> Self {
        Self { config }
    }

    pub fn from_config(bytes: &[u8]) -> Result<Self, RunnerError> {
        Ok(Self::new(MaterializedChunkRunnerConfig::deserialize(bytes)?))
    }
}

pub(crate) fn factory(bytes: &[u8]) -> Result<Box<dyn Runner>, RunnerError> {
    Ok(Box::new(ChunkRunner::from_config(bytes)?))
}

#[async_trait]
impl Runner for ChunkRunner {
    async fn run(&self) -> Result<Box<dyn CompletionWatcher>, RunnerError> {
        let config = self.config.clone();
        let (watcher, signal) = sync_watcher();
        tokio::spawn(async move {
            let result = copy_chunk(config).await;
            signal.finish(result);
        });
        Ok(Box::new(watcher))
    }
}

async fn copy_chunk(config: MaterializedChunkRunnerConfig) -> Result<(), RunnerError> {
    let offline =
        plume_provider::get(config.offline_type, &config.offline_config)?.as_offline()?;
    let online = plume_provider::get(config.online_type, &config.online_config)?.as_online()?;

    if config.chunk_size == 0 {
        return Ok(());
    }

    let materialization = offline.get_materialization(&config.materialization_id).await?;
    let begin = config.chunk_idx * config.chunk_size;
    let end = begin + config.chunk_size;
    let rows = materialization.segment(begin, end).to_vec();

    let table = online.get_table(&config.resource_id.name, &config.resource_id.variant).await?;
    let copied = rows.len();
    for record in rows {
        table.set(&record.entity, record.value).await?;
    }
    tracing::debug!(
        resource = %config.resource_id,
        chunk = config.chunk_idx,
        rows = copied,
        "chunk copied to online store"
    );
    Ok(())
}

#[cfg(test)]
#[path = "copy_tests.rs"]
mod tests;
