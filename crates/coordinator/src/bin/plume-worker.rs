// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `plume-worker` - containerized worker entrypoint.
//!
//! Reads NAME, CONFIG, ETCD_ENDPOINTS, and optionally TASK_INDEX from the
//! environment, runs the named runner, and exits non-zero on failure.

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PLUME_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    plume_runner::worker::run_from_env().await?;
    tracing::info!("worker finished");
    Ok(())
}
