// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn stamp_has_date_time_and_zone() {
    let s = stamp_now();
    // "YYYY-MM-DD HH:MM:SS" prefix plus a zone token
    assert!(s.len() >= 20, "unexpected stamp: {s}");
    assert_eq!(s.as_bytes()[4], b'-');
    assert_eq!(s.as_bytes()[10], b' ');
    assert_eq!(s.as_bytes()[13], b':');
}

#[test]
fn iso_now_round_trips() {
    let s = iso_now();
    assert!(parse_flexible(&s).is_some(), "cannot parse {s}");
}

#[test]
fn parse_flexible_accepts_naive() {
    let dt = parse_flexible("2024-05-01T12:30:00.123456");
    assert!(dt.is_some());
}

#[test]
fn parse_flexible_rejects_garbage() {
    assert!(parse_flexible("not a timestamp").is_none());
}

#[test]
fn secs_since_recent_is_small() {
    let s = iso_now();
    let elapsed = secs_since(&s).unwrap();
    assert!((0.0..5.0).contains(&elapsed), "elapsed={elapsed}");
}

#[test]
fn archive_stamp_shape() {
    let s = archive_stamp();
    assert_eq!(s.len(), 15);
    assert_eq!(s.as_bytes()[8], b'-');
}
