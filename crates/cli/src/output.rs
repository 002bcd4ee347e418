// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured stdout for the non-hook commands.

use serde::Serialize;

/// Print a value as pretty JSON; falls back to an error object so callers
/// always receive valid JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => println!("{{\"ok\": false, \"error\": \"{e}\"}}"),
    }
}
