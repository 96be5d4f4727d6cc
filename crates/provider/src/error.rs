// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider error kinds.

use crate::ProviderType;
use plume_core::ResourceId;
use thiserror::Error;

/// Errors surfaced by provider drivers.
///
/// `TableAlreadyExists` is a typed success-adjacent signal: callers that
/// re-create a table with the same identity treat it as idempotent success.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("unknown provider type {0:?}")]
    UnknownType(String),

    #[error("no driver available for provider type {0}")]
    NoDriver(ProviderType),

    #[error("provider {0} is not an offline store")]
    NotOfflineStore(ProviderType),

    #[error("provider {0} is not an online store")]
    NotOnlineStore(ProviderType),

    #[error("table for {0} already exists")]
    TableAlreadyExists(ResourceId),

    #[error("table for {0} not found")]
    TableNotFound(ResourceId),

    #[error("external table {0:?} not found")]
    ExternalTableNotFound(String),

    #[error("no online value for entity {0:?}")]
    ValueNotFound(String),

    #[error("materialization {0:?} not found")]
    MaterializationNotFound(String),

    #[error("invalid provider config: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::InvalidConfig(e.to_string())
    }
}
