// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{sync_watcher, CompletionWatcher, Runner};
use async_trait::async_trait;

struct NoopRunner;

#[async_trait]
impl Runner for NoopRunner {
    async fn run(&self) -> Result<Box<dyn CompletionWatcher>, RunnerError> {
        let (watcher, signal) = sync_watcher();
        signal.finish(Ok(()));
        Ok(Box::new(watcher))
    }
}

fn noop_factory(_config: &[u8]) -> Result<Box<dyn Runner>, RunnerError> {
    Ok(Box::new(NoopRunner))
}

#[test]
fn register_and_create() {
    register_factory("registry_test_noop", noop_factory).unwrap();
    assert!(is_registered("registry_test_noop"));
    assert!(create("registry_test_noop", &[]).is_ok());
    unregister_factory("registry_test_noop");
    assert!(!is_registered("registry_test_noop"));
}

#[test]
fn duplicate_registration_errors() {
    register_factory("registry_test_dup", noop_factory).unwrap();
    let err = register_factory("registry_test_dup", noop_factory).unwrap_err();
    assert_eq!(err, RunnerError::DuplicateRunner("registry_test_dup".to_string()));
    unregister_factory("registry_test_dup");
}

#[test]
fn unknown_runner_errors() {
    let err = create("ghost_job", &[]).unwrap_err();
    assert_eq!(err, RunnerError::UnknownRunner("ghost_job".to_string()));
}

#[test]
fn register_builtin_is_idempotent() {
    register_builtin();
    register_builtin();
    assert!(is_registered(crate::COPY_TO_ONLINE));
    assert!(is_registered(crate::MATERIALIZE));
    assert!(is_registered(crate::CREATE_TRAINING_SET));
    assert!(is_registered(crate::CREATE_TRANSFORMATION));
}
