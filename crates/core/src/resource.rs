// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource identity, the status state machine, and coordination-store keys.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix for enqueued-work keys in the coordination store.
pub const JOB_PREFIX: &str = "JOB__";
/// Prefix for schedule-fired update-event keys.
pub const UPDATE_PREFIX: &str = "UPDATE__";
/// Prefix for lease-bound mutex keys.
pub const LOCK_PREFIX: &str = "LOCK__";

/// The kind of a tracked resource.
///
/// `Source` is the metadata-facing kind for both primary registrations and
/// SQL transformations; `Primary` and `Transformation` are the provider-side
/// kinds their tables are stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Source,
    Primary,
    Transformation,
    Feature,
    Label,
    TrainingSet,
}

crate::simple_display! {
    ResourceKind {
        Source => "SOURCE",
        Primary => "PRIMARY",
        Transformation => "TRANSFORMATION",
        Feature => "FEATURE",
        Label => "LABEL",
        TrainingSet => "TRAINING_SET",
    }
}

impl ResourceKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "SOURCE" => Some(Self::Source),
            "PRIMARY" => Some(Self::Primary),
            "TRANSFORMATION" => Some(Self::Transformation),
            "FEATURE" => Some(Self::Feature),
            "LABEL" => Some(Self::Label),
            "TRAINING_SET" => Some(Self::TrainingSet),
            _ => None,
        }
    }
}

/// A (name, variant) reference to another resource. Variant may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameVariant {
    pub name: String,
    pub variant: String,
}

impl NameVariant {
    pub fn new(name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self { name: name.into(), variant: variant.into() }
    }

    /// The `name.variant` form used as a template-mapping key.
    pub fn key(&self) -> String {
        format!("{}.{}", self.name, self.variant)
    }
}

impl std::fmt::Display for NameVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.name, self.variant)
    }
}

/// Globally unique resource identity: (name, variant, kind).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub name: String,
    pub variant: String,
    pub kind: ResourceKind,
}

impl ResourceId {
    pub fn new(name: impl Into<String>, variant: impl Into<String>, kind: ResourceKind) -> Self {
        Self { name: name.into(), variant: variant.into(), kind }
    }

    pub fn name_variant(&self) -> NameVariant {
        NameVariant::new(self.name.clone(), self.variant.clone())
    }

    /// Same name and variant under a different kind (e.g. the provider-side
    /// `Primary` table backing a metadata `Source`).
    pub fn as_kind(&self, kind: ResourceKind) -> Self {
        Self { name: self.name.clone(), variant: self.variant.clone(), kind }
    }

    /// Coordination-store key signifying enqueued work for this resource.
    pub fn job_key(&self) -> String {
        format!("{}{}__{}__{}", JOB_PREFIX, self.kind, self.name, self.variant)
    }

    /// Coordination-store key signifying a fired scheduled update.
    pub fn update_key(&self) -> String {
        format!("{}{}__{}__{}", UPDATE_PREFIX, self.kind, self.name, self.variant)
    }

    /// Parse a resource identity back out of a `JOB__` key.
    pub fn from_job_key(key: &str) -> Result<Self, KeyParseError> {
        Self::from_prefixed(key, JOB_PREFIX)
    }

    /// Parse a resource identity back out of an `UPDATE__` key.
    pub fn from_update_key(key: &str) -> Result<Self, KeyParseError> {
        Self::from_prefixed(key, UPDATE_PREFIX)
    }

    fn from_prefixed(key: &str, prefix: &str) -> Result<Self, KeyParseError> {
        let rest = key
            .strip_prefix(prefix)
            .ok_or_else(|| KeyParseError::WrongPrefix { key: key.to_string() })?;
        // Resource names never contain a double underscore, so a 3-way
        // split on "__" is unambiguous.
        let mut parts = rest.splitn(3, "__");
        let kind = parts
            .next()
            .and_then(ResourceKind::parse)
            .ok_or_else(|| KeyParseError::Malformed { key: key.to_string() })?;
        let name = parts.next().ok_or_else(|| KeyParseError::Malformed { key: key.to_string() })?;
        let variant =
            parts.next().ok_or_else(|| KeyParseError::Malformed { key: key.to_string() })?;
        Ok(Self::new(name, variant, kind))
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}.{}", self.kind, self.name, self.variant)
    }
}

/// The mutex key guarding a coordination-store key.
pub fn lock_key(guarded: &str) -> String {
    format!("{}{}", LOCK_PREFIX, guarded)
}

/// Failure to map a coordination-store key back to a resource identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("key {key:?} does not carry the expected prefix")]
    WrongPrefix { key: String },
    #[error("key {key:?} is not of the form PREFIX__KIND__NAME__VARIANT")]
    Malformed { key: String },
}

/// Lifecycle status of a resource.
///
/// Transitions are monotone: `created` → `pending` → one of the terminal
/// states. A scheduled update touches `LastUpdated` only, never the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Created,
    Pending,
    Ready,
    ReadyOnline,
    Failed,
}

crate::simple_display! {
    ResourceStatus {
        Created => "created",
        Pending => "pending",
        Ready => "ready",
        ReadyOnline => "ready_online",
        Failed => "failed",
    }
}

impl ResourceStatus {
    /// Whether the resource has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::ReadyOnline | Self::Failed)
    }

    /// Whether the resource completed successfully.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready | Self::ReadyOnline)
    }

    /// Whether the state machine permits moving to `next`.
    ///
    /// Success states admit nothing but themselves. `failed` re-enters
    /// `pending` when a client retries by recreating the job key.
    pub fn can_advance_to(&self, next: ResourceStatus) -> bool {
        match self {
            Self::Created => matches!(next, Self::Pending | Self::Failed),
            Self::Pending => next.is_terminal(),
            Self::Failed => matches!(next, Self::Pending | Self::Failed),
            // Ready states only re-assert themselves (idempotent writes).
            ready => *ready == next,
        }
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
