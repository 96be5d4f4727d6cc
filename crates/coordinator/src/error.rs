// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator error kinds.

use plume_core::resource::KeyParseError;
use plume_core::ResourceId;
use plume_metadata::{MetadataError, StoreError};
use plume_provider::ProviderError;
use plume_runner::RunnerError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordinatorError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Key(#[from] KeyParseError),

    #[error("unresolved template reference {0:?}")]
    UnresolvedTemplate(String),

    #[error("invalid resource definition: {0}")]
    InvalidDefinition(String),

    #[error("invalid schedule {schedule:?}: {reason}")]
    InvalidSchedule { schedule: String, reason: String },

    /// Transient: a dependency has not reached a ready state yet. Direct
    /// jobs keep their job key and retry after a backoff.
    #[error("dependency {0} is not ready")]
    DependencyPending(ResourceId),

    #[error("no job routine for resource kind of {0}")]
    UnexpectedKind(ResourceId),
}

impl CoordinatorError {
    /// Whether the failure is the transient dependency-not-ready case.
    pub fn is_dependency_pending(&self) -> bool {
        matches!(self, CoordinatorError::DependencyPending(_))
    }
}
