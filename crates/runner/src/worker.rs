// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Containerized worker entrypoint.
//!
//! A worker pod receives its runner name and config through the
//! environment, reconstructs the runner from the registry, runs it, and
//! waits on the watcher. Indexed chunk workers additionally receive their
//! shard via `TASK_INDEX`.

use crate::copy::MaterializedChunkRunnerConfig;
use crate::{registry, RunnerError, COPY_TO_ONLINE};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Runner name to execute.
pub const ENV_NAME: &str = "NAME";
/// Base64-encoded serialized runner config.
pub const ENV_CONFIG: &str = "CONFIG";
/// Comma-separated coordination-store endpoints.
pub const ENV_ETCD_ENDPOINTS: &str = "ETCD_ENDPOINTS";
/// Shard index for parallel-sharded jobs.
pub const ENV_TASK_INDEX: &str = "TASK_INDEX";

fn required_env(name: &str) -> Result<String, RunnerError> {
    std::env::var(name).map_err(|_| RunnerError::MissingEnv(name.to_string()))
}

/// Rewrite a chunk config with the shard index from `TASK_INDEX`, if set.
fn apply_task_index(name: &str, config: Vec<u8>) -> Result<Vec<u8>, RunnerError> {
    if name != COPY_TO_ONLINE {
        return Ok(config);
    }
    let Ok(index) = std::env::var(ENV_TASK_INDEX) else {
        return Ok(config);
    };
    let chunk_idx: u64 = index
        .trim()
        .parse()
        .map_err(|_| RunnerError::InvalidConfig(format!("bad {ENV_TASK_INDEX}: {index:?}")))?;
    let mut chunk_config = MaterializedChunkRunnerConfig::deserialize(&config)?;
    chunk_config.chunk_idx = chunk_idx;
    chunk_config.serialize()
}

/// Run one unit of work as described by the worker environment.
pub async fn run_from_env() -> Result<(), RunnerError> {
    let name = required_env(ENV_NAME)?;
    let encoded = required_env(ENV_CONFIG)?;
    let config = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| RunnerError::InvalidConfig(format!("bad {ENV_CONFIG}: {e}")))?;
    let config = apply_task_index(&name, config)?;

    if let Ok(endpoints) = std::env::var(ENV_ETCD_ENDPOINTS) {
        tracing::debug!(%endpoints, "coordination endpoints configured");
    }

    registry::register_builtin();
    let runner = registry::create(&name, &config)?;
    tracing::info!(runner = %name, "worker starting");
    let watcher = runner.run().await?;
    watcher.wait().await
}
