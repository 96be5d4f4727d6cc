// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! plume-runner: executable units of coordinator work.
//!
//! A [`Runner`] is constructed from a name and a serialized config (the
//! factory registry is the dispatch table), runs its work on a background
//! task, and hands back a [`CompletionWatcher`]. The same config travels
//! to containerized workers via the `NAME`/`CONFIG` environment contract.

pub mod cluster;
pub mod copy;
pub mod error;
pub mod materialize;
pub mod registry;
pub mod training_set;
pub mod transformation;
pub mod watcher;
pub mod worker;

pub use cluster::{
    build_cron_job, build_job, cron_job_name, ClusterCronRunner, ClusterJobConfig, ClusterJobRunner,
};
pub use copy::{ChunkRunner, MaterializedChunkRunnerConfig};
pub use error::RunnerError;
pub use materialize::{chunk_layout, JobCloud, MaterializeRunner, MaterializeRunnerConfig};
pub use registry::{create, register_builtin, register_factory, unregister_factory, RunnerFactory};
pub use training_set::{CreateTrainingSetRunner, CreateTrainingSetRunnerConfig};
pub use transformation::{CreateTransformationRunner, CreateTransformationRunnerConfig};
pub use watcher::{sync_watcher, CompletionWatcher, SyncWatcher, WatchSignal, WatcherMultiplex};

use async_trait::async_trait;

/// Registered name of the chunk-copy runner.
pub const COPY_TO_ONLINE: &str = "COPY_TO_ONLINE";
/// Registered name of the feature materialization runner.
pub const MATERIALIZE: &str = "MATERIALIZE";
/// Registered name of the training-set runner.
pub const CREATE_TRAINING_SET: &str = "CREATE_TRAINING_SET";
/// Registered name of the SQL transformation runner.
pub const CREATE_TRANSFORMATION: &str = "CREATE_TRANSFORMATION";

/// An executable unit of work producing a completion watcher.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self) -> Result<Box<dyn CompletionWatcher>, RunnerError>;
}

impl std::fmt::Debug for dyn Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Runner")
    }
}
