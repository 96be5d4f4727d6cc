// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQL template resolution.
//!
//! User transformations reference their dependencies as
//! `{{name.variant}}`; the coordinator rewrites each occurrence to the
//! quoted provider-canonical table name. Resolution fails closed: an
//! occurrence with no mapping errors before any output is produced.

use crate::CoordinatorError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex pattern for {{name.variant}} source references.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static SOURCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_-]+\.[A-Za-z0-9_-]*)\}\}")
        .expect("constant regex pattern is valid")
});

/// Substitute every `{{name.variant}}` in `template` with the mapped
/// identifier wrapped in double quotes.
///
/// Errors with the missing key if any occurrence has no mapping, emitting
/// no partial output. Matching is exact; nested braces are unsupported.
pub fn resolve_template(
    template: &str,
    mapping: &HashMap<String, String>,
) -> Result<String, CoordinatorError> {
    for caps in SOURCE_PATTERN.captures_iter(template) {
        let key = &caps[1];
        if !mapping.contains_key(key) {
            return Err(CoordinatorError::UnresolvedTemplate(key.to_string()));
        }
    }
    let resolved = SOURCE_PATTERN.replace_all(template, |caps: &regex::Captures| {
        // Verified above; substitution is purely textual.
        format!("\"{}\"", mapping[&caps[1]])
    });
    Ok(resolved.into_owned())
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
