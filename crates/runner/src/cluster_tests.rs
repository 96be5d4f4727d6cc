// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use plume_core::ResourceKind;

fn config(num_tasks: i32) -> ClusterJobConfig {
    ClusterJobConfig {
        name: "plume-feature-f-v-abc123".to_string(),
        image: "plume/worker:test".to_string(),
        namespace: "default".to_string(),
        env: vec![
            ("NAME".to_string(), "COPY_TO_ONLINE".to_string()),
            ("CONFIG".to_string(), "e30=".to_string()),
        ],
        num_tasks,
    }
}

#[test]
fn build_job_single_task_is_not_indexed() {
    let job = build_job(&config(1));
    let spec = job.spec.unwrap();
    assert_eq!(spec.parallelism, Some(1));
    assert_eq!(spec.completions, Some(1));
    assert_eq!(spec.completion_mode, None);

    let container = &spec.template.spec.unwrap().containers[0];
    assert_eq!(container.image.as_deref(), Some("plume/worker:test"));
    let env = container.env.as_ref().unwrap();
    assert!(env.iter().all(|e| e.name != "TASK_INDEX"));
    assert!(env.iter().any(|e| e.name == "NAME" && e.value.as_deref() == Some("COPY_TO_ONLINE")));
}

#[test]
fn build_job_parallel_tasks_are_indexed() {
    let job = build_job(&config(4));
    let spec = job.spec.unwrap();
    assert_eq!(spec.parallelism, Some(4));
    assert_eq!(spec.completions, Some(4));
    assert_eq!(spec.completion_mode.as_deref(), Some("Indexed"));

    let container = &spec.template.spec.unwrap().containers[0];
    let task_index = container
        .env
        .as_ref()
        .unwrap()
        .iter()
        .find(|e| e.name == "TASK_INDEX")
        .expect("indexed jobs carry TASK_INDEX");
    // Shard index comes from the downward API, not a literal value.
    assert!(task_index.value.is_none());
    assert!(task_index.value_from.is_some());
}

#[test]
fn build_cron_job_reuses_job_template() {
    let cron = build_cron_job("plume-cron", "*/5 * * * *", &config(1));
    let spec = cron.spec.unwrap();
    assert_eq!(spec.schedule, "*/5 * * * *");
    assert_eq!(spec.concurrency_policy.as_deref(), Some("Forbid"));
    assert!(spec.job_template.spec.is_some());
}

#[test]
fn cron_job_name_is_deterministic() {
    let id = plume_core::ResourceId::new("Wine_Quality", "v1", ResourceKind::Feature);
    let name = cron_job_name(&id);
    assert_eq!(name, cron_job_name(&id));
    assert!(name.starts_with("plume-feature-wine-quality-v1-"));
    assert!(name.len() <= 63);
    assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
}

#[test]
fn cron_job_name_distinguishes_kinds_and_long_names() {
    let feature = plume_core::ResourceId::new("same_name", "v", ResourceKind::Feature);
    let training_set = plume_core::ResourceId::new("same_name", "v", ResourceKind::TrainingSet);
    assert_ne!(cron_job_name(&feature), cron_job_name(&training_set));

    let long_a = plume_core::ResourceId::new("a".repeat(100), "v1", ResourceKind::Feature);
    let long_b = plume_core::ResourceId::new("a".repeat(100), "v2", ResourceKind::Feature);
    let name_a = cron_job_name(&long_a);
    let name_b = cron_job_name(&long_b);
    assert!(name_a.len() <= 63);
    // Truncated slugs still differ through the digest suffix.
    assert_ne!(name_a, name_b);
}
