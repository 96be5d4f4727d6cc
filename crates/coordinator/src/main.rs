// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `plumed` - the feature-platform coordinator daemon.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use plume_coordinator::{
    Coordinator, CoordinatorConfig, JobSpawner, KubernetesJobSpawner, MemoryJobSpawner,
};
use plume_core::SystemClock;
use plume_metadata::{MemoryStore, MetadataClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plumed", about = "Feature-platform coordinator", version)]
struct Args {
    /// Coordination-store endpoints, comma separated. Handed to cluster
    /// workers as ETCD_ENDPOINTS.
    #[arg(long, env = "PLUME_ETCD_ENDPOINTS", default_value = "localhost:2379")]
    etcd_endpoints: String,

    /// Where runners execute.
    #[arg(long, value_enum, env = "PLUME_SPAWNER", default_value_t = SpawnerMode::Memory)]
    spawner: SpawnerMode,

    /// Lease on per-resource locks, in milliseconds.
    #[arg(long, env = "PLUME_LOCK_TTL_MS", default_value_t = 5000)]
    lock_ttl_ms: u64,

    /// Backoff between retries of dependency-gated jobs, in milliseconds.
    #[arg(long, env = "PLUME_JOB_RETRY_BACKOFF_MS", default_value_t = 1000)]
    job_retry_backoff_ms: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum SpawnerMode {
    /// In-process workers and in-process cron timers.
    Memory,
    /// Kubernetes Jobs and CronJobs running the worker image.
    Kubernetes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PLUME_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    plume_runner::register_builtin();

    let store = Arc::new(MemoryStore::new());
    let metadata = MetadataClient::new(store);
    let spawner: Arc<dyn JobSpawner> = match args.spawner {
        SpawnerMode::Memory => Arc::new(MemoryJobSpawner::new(metadata.clone())),
        SpawnerMode::Kubernetes => Arc::new(KubernetesJobSpawner::new()),
    };
    let config = CoordinatorConfig {
        lock_ttl: Duration::from_millis(args.lock_ttl_ms),
        job_retry_backoff: Duration::from_millis(args.job_retry_backoff_ms),
        endpoints: args.etcd_endpoints.split(',').map(str::to_string).collect(),
    };

    let coordinator = Arc::new(Coordinator::new(metadata, spawner, SystemClock, config));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let loops = tokio::spawn(Arc::clone(&coordinator).run(shutdown_rx));
    tracing::info!("plumed started");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    loops.await.context("coordinator loops panicked")??;
    Ok(())
}
