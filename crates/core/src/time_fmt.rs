// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp formatting shared by the journal, queue, and warnings log.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};

/// Journal-entry timestamp: `YYYY-MM-DD HH:MM:SS <tz>`.
pub fn stamp_now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// ISO-8601 timestamp with offset, used by queue jobs and the WSI.
pub fn iso_now() -> String {
    Local::now().to_rfc3339()
}

/// Archive-file timestamp: `YYYYmmdd-HHMMSS`.
pub fn archive_stamp() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Parse an ISO-8601 timestamp, accepting both offset-carrying and naive
/// forms (older state files recorded naive local time).
pub fn parse_flexible(ts: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt);
    }
    let naive = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.fixed_offset())
}

/// Seconds elapsed since `ts`, or `None` when it cannot be parsed.
pub fn secs_since(ts: &str) -> Option<f64> {
    let then = parse_flexible(ts)?;
    let now = Local::now().fixed_offset();
    Some((now - then).num_milliseconds() as f64 / 1000.0)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
