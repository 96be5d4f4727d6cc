// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster job submission — runs registered runners in Kubernetes.
//!
//! A [`ClusterJobRunner`] maps a runner name + config to a `batch/v1` Job
//! whose pods run the worker image with the `NAME`/`CONFIG` environment
//! contract. Parallel-sharded jobs use indexed completion mode, with each
//! task reading its shard from `TASK_INDEX`. Schedules map to `CronJob`
//! objects with an identical job template.

use crate::worker::{ENV_CONFIG, ENV_ETCD_ENDPOINTS, ENV_NAME, ENV_TASK_INDEX};
use crate::{sync_watcher, CompletionWatcher, Runner, RunnerError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, Job, JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, EnvVarSource, ObjectFieldSelector, PodSpec, PodTemplateSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
use plume_core::ResourceId;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default worker container image; override with `PLUME_WORKER_IMAGE`.
pub const WORKER_IMAGE: &str = "plume/worker";

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Everything needed to submit a worker job to the cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterJobConfig {
    /// Job object name.
    pub name: String,
    pub image: String,
    pub namespace: String,
    /// Plain env vars for the worker container.
    pub env: Vec<(String, String)>,
    /// Parallel task count; tasks above 1 run in indexed completion mode.
    pub num_tasks: i32,
}

impl ClusterJobConfig {
    /// Build the submission config for a registered runner.
    pub fn for_runner(
        runner_name: &str,
        config: &[u8],
        resource_id: &ResourceId,
        num_tasks: i32,
    ) -> Result<Self, RunnerError> {
        let mut env = vec![
            (ENV_NAME.to_string(), runner_name.to_string()),
            (ENV_CONFIG.to_string(), BASE64.encode(config)),
        ];
        if let Ok(endpoints) = std::env::var("PLUME_ETCD_ENDPOINTS") {
            env.push((ENV_ETCD_ENDPOINTS.to_string(), endpoints));
        }
        Ok(Self {
            name: format!("{}-{}", object_name_slug(resource_id), nanoid::nanoid!(8, &NAME_ALPHABET)),
            image: std::env::var("PLUME_WORKER_IMAGE").unwrap_or_else(|_| WORKER_IMAGE.to_string()),
            namespace: std::env::var("PLUME_K8S_NAMESPACE").unwrap_or_else(|_| "default".to_string()),
            env,
            num_tasks,
        })
    }
}

// Lowercase alphanumerics keep generated names DNS-1123 safe.
const NAME_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Build the `batch/v1` Job object for a config.
pub fn build_job(config: &ClusterJobConfig) -> Job {
    let mut env: Vec<EnvVar> = config
        .env
        .iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: Some(value.clone()),
            ..Default::default()
        })
        .collect();
    let indexed = config.num_tasks > 1;
    if indexed {
        // Each pod learns its shard through the downward API.
        env.push(EnvVar {
            name: ENV_TASK_INDEX.to_string(),
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    field_path: "metadata.annotations['batch.kubernetes.io/job-completion-index']"
                        .to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
    }

    let labels = BTreeMap::from([("app".to_string(), "plume-worker".to_string())]);
    Job {
        metadata: ObjectMeta {
            name: Some(config.name.clone()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(JobSpec {
            parallelism: Some(config.num_tasks.max(1)),
            completions: Some(config.num_tasks.max(1)),
            completion_mode: indexed.then(|| "Indexed".to_string()),
            backoff_limit: Some(2),
            template: PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    restart_policy: Some("Never".to_string()),
                    containers: vec![Container {
                        name: "worker".to_string(),
                        image: Some(config.image.clone()),
                        env: Some(env),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build the `batch/v1` CronJob carrying the same job template on a
/// five-field schedule.
pub fn build_cron_job(name: &str, schedule: &str, config: &ClusterJobConfig) -> CronJob {
    let job = build_job(config);
    CronJob {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: job.metadata.labels.clone(),
            ..Default::default()
        },
        spec: Some(CronJobSpec {
            schedule: schedule.to_string(),
            concurrency_policy: Some("Forbid".to_string()),
            job_template: JobTemplateSpec { metadata: None, spec: job.spec },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn object_name_slug(id: &ResourceId) -> String {
    let raw = format!("plume-{}-{}-{}", id.kind, id.name, id.variant);
    let mut slug: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    slug.truncate(45);
    slug.trim_end_matches('-').to_string()
}

/// Deterministic CronJob object name for a resource, so coordinator reruns
/// reconcile the same object. DNS-1123 safe; a digest suffix keeps
/// truncated names collision-free.
pub fn cron_job_name(id: &ResourceId) -> String {
    let digest = Sha256::digest(format!("{}__{}__{}", id.kind, id.name, id.variant).as_bytes());
    let suffix: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("{}-{}", object_name_slug(id), suffix)
}

/// Submits a Job to the cluster and watches it to completion.
pub struct ClusterJobRunner {
    config: ClusterJobConfig,
}

impl ClusterJobRunner {
    pub fn new(config: ClusterJobConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Runner for ClusterJobRunner {
    async fn run(&self) -> Result<Box<dyn CompletionWatcher>, RunnerError> {
        let client =
            Client::try_default().await.map_err(|e| RunnerError::Cluster(e.to_string()))?;
        let jobs: Api<Job> = Api::namespaced(client, &self.config.namespace);
        let job = build_job(&self.config);
        jobs.create(&PostParams::default(), &job)
            .await
            .map_err(|e| RunnerError::Cluster(format!("job create: {e}")))?;
        tracing::info!(job = %self.config.name, num_tasks = self.config.num_tasks, "cluster job submitted");

        let name = self.config.name.clone();
        let completions = self.config.num_tasks.max(1);
        let (watcher, signal) = sync_watcher();
        tokio::spawn(async move {
            signal.finish(watch_job(jobs, &name, completions).await);
        });
        Ok(Box::new(watcher))
    }
}

async fn watch_job(jobs: Api<Job>, name: &str, completions: i32) -> Result<(), RunnerError> {
    loop {
        let job = jobs
            .get(name)
            .await
            .map_err(|e| RunnerError::Cluster(format!("job poll: {e}")))?;
        if let Some(status) = &job.status {
            if status.succeeded.unwrap_or(0) >= completions {
                return Ok(());
            }
            if let Some(conditions) = &status.conditions {
                if let Some(failed) =
                    conditions.iter().find(|c| c.type_ == "Failed" && c.status == "True")
                {
                    return Err(RunnerError::Failed(format!(
                        "cluster job {}: {}",
                        name,
                        failed.message.clone().unwrap_or_else(|| "worker crashed".to_string())
                    )));
                }
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Submits (or reconciles) a CronJob carrying a runner's job template.
pub struct ClusterCronRunner {
    pub cron_name: String,
    pub schedule: String,
    pub config: ClusterJobConfig,
}

#[async_trait]
impl Runner for ClusterCronRunner {
    async fn run(&self) -> Result<Box<dyn CompletionWatcher>, RunnerError> {
        let client =
            Client::try_default().await.map_err(|e| RunnerError::Cluster(e.to_string()))?;
        let crons: Api<CronJob> = Api::namespaced(client, &self.config.namespace);
        let cron = build_cron_job(&self.cron_name, &self.schedule, &self.config);
        // Server-side apply: reruns of the coordinator reconcile the same
        // object instead of erroring on conflict.
        crons
            .patch(&self.cron_name, &PatchParams::apply("plume-coordinator"), &Patch::Apply(&cron))
            .await
            .map_err(|e| RunnerError::Cluster(format!("cron apply: {e}")))?;
        tracing::info!(cron = %self.cron_name, schedule = %self.schedule, "cron object reconciled");

        let (watcher, signal) = sync_watcher();
        signal.finish(Ok(()));
        Ok(Box::new(watcher))
    }
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod tests;
