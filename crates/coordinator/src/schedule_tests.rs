// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{DateTime, TimeZone};

#[test]
fn five_field_expressions_parse() {
    parse_schedule("*/1 * * * *").unwrap();
    parse_schedule("0 9 * * 1-5").unwrap();
    parse_schedule("30 2 1 * *").unwrap();
}

#[test]
fn wrong_field_count_is_rejected() {
    for bad in ["", "* * * *", "* * * * * *", "hourly"] {
        let err = validate_schedule(bad).unwrap_err();
        assert!(matches!(err, CoordinatorError::InvalidSchedule { .. }), "accepted {bad:?}");
    }
}

#[test]
fn garbage_fields_are_rejected() {
    assert!(validate_schedule("61 * * * *").is_err());
    assert!(validate_schedule("* * * * mars").is_err());
}

#[test]
fn every_minute_fires_on_minute_boundaries() {
    let schedule = parse_schedule("*/1 * * * *").unwrap();
    let start: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 30).unwrap();
    let fires: Vec<_> = schedule.after(&start).take(2).collect();
    assert_eq!(fires[0], Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 0).unwrap());
    assert_eq!(fires[1], Utc.with_ymd_and_hms(2024, 5, 1, 12, 2, 0).unwrap());
}

#[test]
fn until_next_fire_is_bounded_for_every_minute() {
    let schedule = parse_schedule("*/1 * * * *").unwrap();
    let wait = until_next_fire(&schedule).unwrap();
    assert!(wait <= Duration::from_secs(60));
}
