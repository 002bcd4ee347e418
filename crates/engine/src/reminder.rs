// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Digest reminder: nudge the main agent to request DIGEST blocks after a
//! quiet stretch of Task invocations. Disabled unless
//! `DIGEST_REMINDER_MINUTES` is set above zero.

use std::path::Path;

use scribe_core::{envcfg, time_fmt, HookEvent, HookOutcome, Paths};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct ReminderState {
    last_task_time: Option<String>,
}

pub fn run_reminder(paths: &Paths, event: &HookEvent) -> HookOutcome {
    let minutes: u64 = envcfg::env_parse("DIGEST_REMINDER_MINUTES", 0);
    if minutes == 0 || event.tool() != "Task" {
        return HookOutcome::Allow;
    }

    let state_path = paths.reminder_state_path();
    let last = load_state(&state_path).last_task_time;
    let elapsed = last.as_deref().and_then(time_fmt::secs_since);

    match elapsed {
        Some(secs) if secs >= (minutes * 60) as f64 => {
            save_state(&state_path);
            HookOutcome::Warn(format!(
                "\n💡 Reminder: It's been {minutes} minutes since last Task invocation. \
                 Have you requested DIGEST blocks from subagents? \
                 Subagents should return structured JSON DIGESTs for context efficiency.\n"
            ))
        }
        Some(_) => HookOutcome::Allow,
        None => {
            // First Task invocation: start the timer.
            save_state(&state_path);
            HookOutcome::Allow
        }
    }
}

fn load_state(path: &Path) -> ReminderState {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

fn save_state(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let state = ReminderState {
        last_task_time: Some(time_fmt::iso_now()),
    };
    if let Ok(text) = serde_json::to_string(&state) {
        let _ = std::fs::write(path, text);
    }
}

#[cfg(test)]
#[path = "reminder_tests.rs"]
mod tests;
