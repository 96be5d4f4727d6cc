// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use plume_core::ResourceKind;
use plume_metadata::{MemoryStore, MetadataClient};
use plume_runner::CreateTransformationRunnerConfig;
use std::sync::Arc;

fn metadata() -> MetadataClient {
    MetadataClient::new(Arc::new(MemoryStore::new()))
}

fn resource() -> ResourceId {
    ResourceId::new("r", "v", ResourceKind::Feature)
}

fn transformation_config() -> Vec<u8> {
    CreateTransformationRunnerConfig {
        offline_type: plume_provider::ProviderType::MemoryOffline,
        offline_config: plume_provider::MemoryConfig::new("spawner-test").serialize(),
        resource_id: ResourceId::new("t", "", ResourceKind::Transformation),
        resolved_sql: "SELECT 1".to_string(),
    }
    .serialize()
    .unwrap()
}

#[tokio::test]
async fn memory_spawner_unknown_runner_errors() {
    let spawner = MemoryJobSpawner::new(metadata());
    let err = spawner.get_job_runner("ghost_job", &[], &[], &resource()).unwrap_err();
    assert_eq!(err, RunnerError::UnknownRunner("ghost_job".to_string()));
}

#[tokio::test]
async fn kubernetes_spawner_unknown_runner_errors_before_submission() {
    let spawner = KubernetesJobSpawner::new();
    let err = spawner.get_job_runner("ghost_job", &[], &[], &resource()).unwrap_err();
    assert_eq!(err, RunnerError::UnknownRunner("ghost_job".to_string()));
}

#[tokio::test]
async fn memory_spawner_resolves_registered_runner() {
    plume_runner::register_builtin();
    let spawner = MemoryJobSpawner::new(metadata());
    let runner = spawner.get_job_runner(
        plume_runner::CREATE_TRANSFORMATION,
        &transformation_config(),
        &[],
        &resource(),
    );
    assert!(runner.is_ok());
}

#[tokio::test]
async fn kubernetes_spawner_builds_cluster_runner_without_submitting() {
    plume_runner::register_builtin();
    let spawner = KubernetesJobSpawner::new();
    // Construction never talks to the cluster; only run() submits.
    let runner = spawner.get_job_runner(
        plume_runner::CREATE_TRANSFORMATION,
        &transformation_config(),
        &["localhost:2379".to_string()],
        &resource(),
    );
    assert!(runner.is_ok());
}

#[tokio::test]
async fn kubernetes_spawner_rejects_bad_schedule_before_submission() {
    plume_runner::register_builtin();
    let spawner = KubernetesJobSpawner::new();
    let err = spawner
        .schedule_job(ScheduleParams {
            runner_name: plume_runner::CREATE_TRANSFORMATION,
            config: &transformation_config(),
            endpoints: &[],
            id: &resource(),
            schedule: "not a cron",
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::InvalidSchedule { .. }));
}

#[tokio::test]
async fn memory_spawner_rejects_bad_schedule() {
    let spawner = MemoryJobSpawner::new(metadata());
    let err = spawner
        .schedule_job(ScheduleParams {
            runner_name: plume_runner::CREATE_TRANSFORMATION,
            config: &[],
            endpoints: &[],
            id: &resource(),
            schedule: "* * * *",
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::InvalidSchedule { .. }));
}
