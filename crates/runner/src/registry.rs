// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide runner factory registry.
//!
//! Populated once at startup and read-only thereafter; the registry is the
//! dispatch table mapping runner names to constructors.

use crate::{Runner, RunnerError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Constructor turning a serialized config into a runner.
pub type RunnerFactory = fn(&[u8]) -> Result<Box<dyn Runner>, RunnerError>;

static FACTORIES: LazyLock<RwLock<HashMap<String, RunnerFactory>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Register a factory under a name. Errors on duplicate registration.
pub fn register_factory(name: &str, factory: RunnerFactory) -> Result<(), RunnerError> {
    let mut factories = FACTORIES.write();
    if factories.contains_key(name) {
        return Err(RunnerError::DuplicateRunner(name.to_string()));
    }
    factories.insert(name.to_string(), factory);
    Ok(())
}

/// Remove a registered factory. Test harness hygiene between scenarios.
pub fn unregister_factory(name: &str) {
    FACTORIES.write().remove(name);
}

/// Whether a factory is registered under the name.
pub fn is_registered(name: &str) -> bool {
    FACTORIES.read().contains_key(name)
}

/// Instantiate the runner registered under `name` from its config.
pub fn create(name: &str, config: &[u8]) -> Result<Box<dyn Runner>, RunnerError> {
    let factory =
        FACTORIES.read().get(name).copied().ok_or_else(|| RunnerError::UnknownRunner(name.to_string()))?;
    factory(config)
}

/// Register the four standard runner factories. Called once at startup by
/// the coordinator and the worker; duplicates are ignored so both halves
/// of a test process can call it.
pub fn register_builtin() {
    let builtin: [(&str, RunnerFactory); 4] = [
        (crate::COPY_TO_ONLINE, crate::copy::factory),
        (crate::MATERIALIZE, crate::materialize::factory),
        (crate::CREATE_TRAINING_SET, crate::training_set::factory),
        (crate::CREATE_TRANSFORMATION, crate::transformation::factory),
    ];
    for (name, factory) in builtin {
        let _ = register_factory(name, factory);
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
