// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feature materialization runner: snapshots the offline table, creates
//! the online table, and fans the snapshot out to chunk workers.

use crate::cluster::{ClusterJobConfig, ClusterJobRunner};
use crate::copy::MaterializedChunkRunnerConfig;
use crate::{
    registry, sync_watcher, CompletionWatcher, Runner, RunnerError, WatcherMultiplex,
    COPY_TO_ONLINE,
};
use async_trait::async_trait;
use plume_core::{ResourceId, ValueType};
use plume_provider::{OfflineStore, OnlineStore, ProviderError, ProviderType, SerializedConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upper bound on rows per chunk.
pub const MAX_CHUNK_ROWS: u64 = 1024;

/// Where chunk workers execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobCloud {
    Cluster,
    Local,
}

plume_core::simple_display! {
    JobCloud {
        Cluster => "cluster",
        Local => "local",
    }
}

/// Chunk arithmetic: `(chunk_size, num_chunks)` for a row count.
///
/// `chunk_size` never exceeds [`MAX_CHUNK_ROWS`]; `num_chunks * chunk_size`
/// covers every row with at most one partial chunk. Zero rows means zero
/// chunks.
pub fn chunk_layout(num_rows: u64) -> (u64, u64) {
    if num_rows == 0 {
        return (0, 0);
    }
    let chunk_size = num_rows.min(MAX_CHUNK_ROWS);
    (chunk_size, num_rows.div_ceil(chunk_size))
}

/// Serialized form of a materialization job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializeRunnerConfig {
    pub online_type: ProviderType,
    pub offline_type: ProviderType,
    pub online_config: SerializedConfig,
    pub offline_config: SerializedConfig,
    pub resource_id: ResourceId,
    pub value_type: ValueType,
    pub cloud: JobCloud,
}

impl MaterializeRunnerConfig {
    pub fn serialize(&self) -> Result<Vec<u8>, RunnerError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, RunnerError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Materializes a feature from its offline table into the online store,
/// in row chunks.
pub struct MaterializeRunner {
    online: Arc<dyn OnlineStore>,
    offline: Arc<dyn OfflineStore>,
    id: ResourceId,
    value_type: ValueType,
    cloud: JobCloud,
}

impl MaterializeRunner {
    pub fn new(
        online: Arc<dyn OnlineStore>,
        offline: Arc<dyn OfflineStore>,
        id: ResourceId,
        value_type: ValueType,
        cloud: JobCloud,
    ) -> Self {
        Self { online, offline, id, value_type, cloud }
    }

    pub fn from_config(bytes: &[u8]) -> Result<Self, RunnerError> {
        let config = MaterializeRunnerConfig::deserialize(bytes)?;
        let online = plume_provider::get(config.online_type, &config.online_config)?.as_online()?;
        let offline =
            plume_provider::get(config.offline_type, &config.offline_config)?.as_offline()?;
        Ok(Self::new(online, offline, config.resource_id, config.value_type, config.cloud))
    }
}

pub(crate) fn factory(bytes: &[u8]) -> Result<Box<dyn Runner>, RunnerError> {
    Ok(Box::new(MaterializeRunner::from_config(bytes)?))
}

#[async_trait]
impl Runner for MaterializeRunner {
    async fn run(&self) -> Result<Box<dyn CompletionWatcher>, RunnerError> {
        let materialization = self.offline.create_materialization(&self.id).await?;

        match self.online.create_table(&self.id.name, &self.id.variant, self.value_type).await {
            Ok(_) | Err(ProviderError::TableAlreadyExists(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let num_rows = materialization.num_rows();
        let (chunk_size, num_chunks) = chunk_layout(num_rows);
        tracing::info!(
            resource = %self.id,
            num_rows,
            chunk_size,
            num_chunks,
            cloud = %self.cloud,
            "materialization planned"
        );

        let chunk_config = MaterializedChunkRunnerConfig {
            online_type: self.online.provider_type(),
            offline_type: self.offline.provider_type(),
            online_config: self.online.config(),
            offline_config: self.offline.config(),
            materialization_id: materialization.id().clone(),
            resource_id: self.id.clone(),
            chunk_size,
            chunk_idx: 0,
        };

        let fanout: Box<dyn CompletionWatcher> = match self.cloud {
            JobCloud::Cluster if num_chunks > 0 => {
                let config = ClusterJobConfig::for_runner(
                    COPY_TO_ONLINE,
                    &chunk_config.serialize()?,
                    &self.id,
                    num_chunks as i32,
                )?;
                ClusterJobRunner::new(config).run().await?
            }
            JobCloud::Local => {
                let mut children: Vec<Box<dyn CompletionWatcher>> =
                    Vec::with_capacity(num_chunks as usize);
                for chunk_idx in 0..num_chunks {
                    let config =
                        MaterializedChunkRunnerConfig { chunk_idx, ..chunk_config.clone() };
                    let chunk_runner = registry::create(COPY_TO_ONLINE, &config.serialize()?)?;
                    children.push(chunk_runner.run().await?);
                }
                Box::new(WatcherMultiplex::new(children))
            }
            // An empty cluster materialization launches no workers.
            JobCloud::Cluster => Box::new(WatcherMultiplex::new(Vec::new())),
        };

        let (watcher, signal) = sync_watcher();
        tokio::spawn(async move {
            signal.finish(fanout.wait().await);
        });
        Ok(Box::new(watcher))
    }
}

#[cfg(test)]
#[path = "materialize_tests.rs"]
mod tests;
