// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Training-set runner: assembles a label joined with point-in-time
//! features inside the offline store.

use crate::{sync_watcher, CompletionWatcher, Runner, RunnerError};
use async_trait::async_trait;
use plume_provider::{ProviderType, SerializedConfig, TrainingSetDef};
use serde::{Deserialize, Serialize};

/// Serialized form of a training-set job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTrainingSetRunnerConfig {
    pub offline_type: ProviderType,
    pub offline_config: SerializedConfig,
    pub definition: TrainingSetDef,
}

impl CreateTrainingSetRunnerConfig {
    pub fn serialize(&self) -> Result<Vec<u8>, RunnerError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, RunnerError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

pub struct CreateTrainingSetRunner {
    config: CreateTrainingSetRunnerConfig,
}

impl CreateTrainingSetRunner {
    pub fn new(config: CreateTrainingSetRunnerConfig) -> Self {
        Self { config }
    }

    pub fn from_config(bytes: &[u8]) -> Result<Self, RunnerError> {
        Ok(Self::new(CreateTrainingSetRunnerConfig::deserialize(bytes)?))
    }
}

pub(crate) fn factory(bytes: &[u8]) -> Result<Box<dyn Runner>, RunnerError> {
    Ok(Box::new(CreateTrainingSetRunner::from_config(bytes)?))
}

#[async_trait]
impl Runner for CreateTrainingSetRunner {
    async fn run(&self) -> Result<Box<dyn CompletionWatcher>, RunnerError> {
        let config = self.config.clone();
        let (watcher, signal) = sync_watcher();
        tokio::spawn(async move {
            let result = async {
                let offline =
                    plume_provider::get(config.offline_type, &config.offline_config)?.as_offline()?;
                offline.create_training_set(config.definition).await?;
                Ok(())
            }
            .await;
            signal.finish(result);
        });
        Ok(Box::new(watcher))
    }
}
