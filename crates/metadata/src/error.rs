// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata error kinds.

use crate::store::StoreError;
use plume_core::{ResourceId, ResourceStatus};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetadataError {
    #[error("resource {0} not found")]
    NotFound(ResourceId),

    #[error("provider {0:?} not found")]
    ProviderNotFound(String),

    #[error("resource {0} already exists")]
    AlreadyExists(ResourceId),

    #[error("invalid status transition for {id}: {from} -> {to}")]
    InvalidTransition { id: ResourceId, from: ResourceStatus, to: ResourceStatus },

    #[error("cyclic transformation dependency through {0}")]
    CyclicDependency(String),

    #[error("resource {id} is a {actual}, expected {expected}")]
    WrongKind { id: ResourceId, expected: &'static str, actual: &'static str },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("corrupt metadata record: {0}")]
    Encoding(String),
}

impl From<serde_json::Error> for MetadataError {
    fn from(e: serde_json::Error) -> Self {
        MetadataError::Encoding(e.to_string())
    }
}
