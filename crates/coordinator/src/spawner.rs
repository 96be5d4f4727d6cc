// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job spawners: where coordinator work actually executes.
//!
//! The in-process spawner instantiates runners straight from the factory
//! registry. The cluster spawner maps each runner to a Kubernetes Job
//! (and schedules to CronJobs) running the worker image. Unknown runner
//! names error before any submission.

use crate::schedule::{parse_schedule, spawn_local_schedule};
use crate::CoordinatorError;
use async_trait::async_trait;
use plume_core::ResourceId;
use plume_metadata::MetadataClient;
use plume_runner::{
    cron_job_name, ClusterCronRunner, ClusterJobConfig, ClusterJobRunner, CompletionWatcher as _,
    Runner, RunnerError,
};

/// A recurring schedule to install for a ready resource.
pub struct ScheduleParams<'a> {
    pub runner_name: &'a str,
    pub config: &'a [u8],
    pub endpoints: &'a [String],
    pub id: &'a ResourceId,
    pub schedule: &'a str,
}

/// Launches registered runners, either in-process or on a cluster.
#[async_trait]
pub trait JobSpawner: Send + Sync {
    /// Resolve a runner name + serialized config into an executable unit.
    fn get_job_runner(
        &self,
        name: &str,
        config: &[u8],
        endpoints: &[String],
        id: &ResourceId,
    ) -> Result<Box<dyn Runner>, RunnerError>;

    /// Install the recurring schedule for a ready resource.
    async fn schedule_job(&self, params: ScheduleParams<'_>) -> Result<(), CoordinatorError>;

    /// Whether chunk fan-out should target the cluster or stay local.
    fn cloud(&self) -> plume_runner::JobCloud;
}

/// In-process spawner: runners execute inside the coordinator, and
/// schedules run on in-process cron timers.
#[derive(Clone)]
pub struct MemoryJobSpawner {
    metadata: MetadataClient,
}

impl MemoryJobSpawner {
    pub fn new(metadata: MetadataClient) -> Self {
        Self { metadata }
    }
}

#[async_trait]
impl JobSpawner for MemoryJobSpawner {
    fn get_job_runner(
        &self,
        name: &str,
        config: &[u8],
        _endpoints: &[String],
        _id: &ResourceId,
    ) -> Result<Box<dyn Runner>, RunnerError> {
        plume_runner::create(name, config)
    }

    async fn schedule_job(&self, params: ScheduleParams<'_>) -> Result<(), CoordinatorError> {
        let schedule = parse_schedule(params.schedule)?;
        let _ = spawn_local_schedule(
            self.metadata.clone(),
            params.id.clone(),
            schedule,
            params.runner_name.to_string(),
            params.config.to_vec(),
        );
        Ok(())
    }

    fn cloud(&self) -> plume_runner::JobCloud {
        plume_runner::JobCloud::Local
    }
}

/// Cluster spawner: runners become Kubernetes Jobs, schedules become
/// CronJob objects named deterministically from the resource identity.
#[derive(Clone, Default)]
pub struct KubernetesJobSpawner;

impl KubernetesJobSpawner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl JobSpawner for KubernetesJobSpawner {
    fn get_job_runner(
        &self,
        name: &str,
        config: &[u8],
        _endpoints: &[String],
        id: &ResourceId,
    ) -> Result<Box<dyn Runner>, RunnerError> {
        // Fail on unknown names before anything reaches the cluster.
        if !plume_runner::registry::is_registered(name) {
            return Err(RunnerError::UnknownRunner(name.to_string()));
        }
        let cluster_config = ClusterJobConfig::for_runner(name, config, id, 1)?;
        Ok(Box::new(ClusterJobRunner::new(cluster_config)))
    }

    async fn schedule_job(&self, params: ScheduleParams<'_>) -> Result<(), CoordinatorError> {
        crate::schedule::validate_schedule(params.schedule)?;
        if !plume_runner::registry::is_registered(params.runner_name) {
            return Err(RunnerError::UnknownRunner(params.runner_name.to_string()).into());
        }
        let cluster_config =
            ClusterJobConfig::for_runner(params.runner_name, params.config, params.id, 1)?;
        let cron = ClusterCronRunner {
            cron_name: cron_job_name(params.id),
            schedule: params.schedule.to_string(),
            config: cluster_config,
        };
        let watcher = cron.run().await?;
        watcher.wait().await?;
        Ok(())
    }

    fn cloud(&self) -> plume_runner::JobCloud {
        plume_runner::JobCloud::Cluster
    }
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
