// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner error kinds.

use plume_provider::ProviderError;
use thiserror::Error;

/// Errors surfaced by runners and their watchers.
///
/// Clonable so a terminal error can be observed through `err()` by any
/// number of watcher handles.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RunnerError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("no runner registered under {0:?}")]
    UnknownRunner(String),

    #[error("runner {0:?} is already registered")]
    DuplicateRunner(String),

    #[error("invalid runner config: {0}")]
    InvalidConfig(String),

    #[error("missing worker environment variable {0}")]
    MissingEnv(String),

    #[error("cluster job submission failed: {0}")]
    Cluster(String),

    #[error("runner failed: {0}")]
    Failed(String),
}

impl From<serde_json::Error> for RunnerError {
    fn from(e: serde_json::Error) -> Self {
        RunnerError::InvalidConfig(e.to_string())
    }
}
