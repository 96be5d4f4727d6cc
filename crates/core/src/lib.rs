// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! plume-core: domain vocabulary for the plume feature-platform coordinator.
//!
//! Resource identity, the status state machine, coordination-store key
//! derivation, value types, and the clock abstraction shared by every
//! other crate in the workspace.

pub mod macros;

pub mod clock;
pub mod resource;
pub mod value;

pub use clock::{Clock, FakeClock, SystemClock};
pub use resource::{
    lock_key, KeyParseError, NameVariant, ResourceId, ResourceKind, ResourceStatus, JOB_PREFIX,
    LOCK_PREFIX, UPDATE_PREFIX,
};
pub use value::{Value, ValueType};
