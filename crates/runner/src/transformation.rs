// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transformation runner: stores a resolved SQL transformation table.

use crate::{sync_watcher, CompletionWatcher, Runner, RunnerError};
use async_trait::async_trait;
use plume_core::ResourceId;
use plume_provider::{ProviderType, SerializedConfig};
use serde::{Deserialize, Serialize};

/// Serialized form of a transformation job. The SQL is already resolved:
/// every `{{name.variant}}` placeholder has been rewritten to a quoted
/// provider-canonical table name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransformationRunnerConfig {
    pub offline_type: ProviderType,
    pub offline_config: SerializedConfig,
    pub resource_id: ResourceId,
    pub resolved_sql: String,
}

impl CreateTransformationRunnerConfig {
    pub fn serialize(&self) -> Result<Vec<u8>, RunnerError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, RunnerError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

pub struct CreateTransformationRunner {
    config: CreateTransformationRunnerConfig,
}

impl CreateTransformationRunner {
    pub fn new(config: CreateTransformationRunnerConfig) -> Self {
        Self { config }
    }

    pub fn from_config(bytes: &[u8]) -> Result<Self, RunnerError> {
        Ok(Self::new(CreateTransformationRunnerConfig::deserialize(bytes)?))
    }
}

pub(crate) fn factory(bytes: &[u8]) -> Result<Box<dyn Runner>, RunnerError> {
    Ok(Box::new(CreateTransformationRunner::from_config(bytes)?))
}

#[async_trait]
impl Runner for CreateTransformationRunner {
    async fn run(&self) -> Result<Box<dyn CompletionWatcher>, RunnerError> {
        let config = self.config.clone();
        let (watcher, signal) = sync_watcher();
        tokio::spawn(async move {
            let result = async {
                let offline =
                    plume_provider::get(config.offline_type, &config.offline_config)?.as_offline()?;
                offline.create_transformation(&config.resource_id, &config.resolved_sql).await?;
                Ok(())
            }
            .await;
            signal.finish(result);
        });
        Ok(Box::new(watcher))
    }
}
