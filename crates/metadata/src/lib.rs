// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! plume-metadata: typed resource metadata over a coordination store.
//!
//! The coordination store ([`KvStore`]) is the sole source of truth: it
//! holds resource definitions and statuses, the `JOB__`/`UPDATE__` work
//! keys, and the lease-bound locks that serialize concurrent coordinators.
//! [`MetadataClient`] is the typed facade every coordinator goes through.

pub mod client;
pub mod defs;
pub mod error;
pub mod store;

pub use client::{
    FeatureVariant, LabelVariant, MetadataClient, SourceVariant, StoredResource,
    TrainingSetVariant,
};
pub use defs::{
    FeatureDef, LabelDef, ProviderDef, ResourceDef, SourceDef, SourceDefinition, SqlTable,
    TrainingSetDef, UserDef,
};
pub use error::MetadataError;
pub use store::{KvStore, LockGuard, MemoryStore, StoreError, WatchEvent, WatchEventKind};
