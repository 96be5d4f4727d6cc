// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn feature(name: &str, variant: &str) -> ResourceId {
    ResourceId::new(name, variant, ResourceKind::Feature)
}

#[test]
fn job_key_format() {
    let id = feature("wine_quality", "v1");
    assert_eq!(id.job_key(), "JOB__FEATURE__wine_quality__v1");
    assert_eq!(id.update_key(), "UPDATE__FEATURE__wine_quality__v1");
}

#[test]
fn job_key_empty_variant() {
    let id = ResourceId::new("clicks", "", ResourceKind::Source);
    assert_eq!(id.job_key(), "JOB__SOURCE__clicks__");
    assert_eq!(ResourceId::from_job_key(&id.job_key()).unwrap(), id);
}

#[test]
fn job_key_round_trip() {
    for kind in [
        ResourceKind::Source,
        ResourceKind::Feature,
        ResourceKind::Label,
        ResourceKind::TrainingSet,
    ] {
        let id = ResourceId::new("name", "variant", kind);
        assert_eq!(ResourceId::from_job_key(&id.job_key()).unwrap(), id);
        assert_eq!(ResourceId::from_update_key(&id.update_key()).unwrap(), id);
    }
}

#[test]
fn job_key_rejects_wrong_prefix() {
    let err = ResourceId::from_job_key("UPDATE__FEATURE__a__b").unwrap_err();
    assert!(matches!(err, KeyParseError::WrongPrefix { .. }));
}

#[test]
fn job_key_rejects_malformed() {
    let err = ResourceId::from_job_key("JOB__FEATURE").unwrap_err();
    assert!(matches!(err, KeyParseError::Malformed { .. }));
    let err = ResourceId::from_job_key("JOB__GHOST_KIND__a__b").unwrap_err();
    assert!(matches!(err, KeyParseError::Malformed { .. }));
}

#[test]
fn lock_key_wraps_guarded_key() {
    let id = feature("f", "v");
    assert_eq!(lock_key(&id.job_key()), "LOCK__JOB__FEATURE__f__v");
}

#[test]
fn name_variant_key() {
    assert_eq!(NameVariant::new("clicks", "v2").key(), "clicks.v2");
    assert_eq!(NameVariant::new("clicks", "").key(), "clicks.");
}

#[test]
fn status_display() {
    assert_eq!(ResourceStatus::ReadyOnline.to_string(), "ready_online");
    assert_eq!(ResourceStatus::Created.to_string(), "created");
}

#[test]
fn status_machine_is_monotone() {
    use ResourceStatus::*;
    assert!(Created.can_advance_to(Pending));
    assert!(Pending.can_advance_to(Ready));
    assert!(Pending.can_advance_to(ReadyOnline));
    assert!(Pending.can_advance_to(Failed));

    // No path back out of a terminal state.
    for terminal in [Ready, ReadyOnline, Failed] {
        assert!(!terminal.can_advance_to(Created));
        // Re-asserting the same terminal state is permitted.
        assert!(terminal.can_advance_to(terminal));
    }
    for ready in [Ready, ReadyOnline] {
        assert!(!ready.can_advance_to(Pending));
        assert!(!ready.can_advance_to(Failed));
    }
    // A client retry re-enters pending from failed only.
    assert!(Failed.can_advance_to(Pending));
    assert!(!Created.can_advance_to(Ready));
}

#[test]
fn as_kind_preserves_identity() {
    let source = ResourceId::new("clicks", "v1", ResourceKind::Source);
    let primary = source.as_kind(ResourceKind::Primary);
    assert_eq!(primary.name, "clicks");
    assert_eq!(primary.variant, "v1");
    assert_eq!(primary.kind, ResourceKind::Primary);
}

proptest! {
    #[test]
    fn key_round_trip_for_simple_names(
        name in "[a-z][a-z0-9_]{0,20}",
        variant in "[a-z0-9]{0,8}",
    ) {
        // Single underscores are fine; the separator is a double underscore.
        prop_assume!(!name.contains("__"));
        let id = ResourceId::new(name, variant, ResourceKind::TrainingSet);
        prop_assert_eq!(ResourceId::from_job_key(&id.job_key()).unwrap(), id);
    }
}
