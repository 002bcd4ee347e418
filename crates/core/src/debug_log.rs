// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-hook debug trace, gated by `STOP_DEBUG`.
//!
//! Hooks are short-lived processes; the durable trace file is what survives
//! for diagnosis. Writes are best-effort and never fail the hook.

use std::io::Write;
use std::path::PathBuf;

use crate::envcfg;
use crate::paths::Paths;
use crate::time_fmt;

#[derive(Debug, Clone)]
pub struct DebugLog {
    path: Option<PathBuf>,
}

impl DebugLog {
    /// Open the trace for the given hook name when `STOP_DEBUG` is on.
    pub fn for_hook(paths: &Paths, hook: &str) -> Self {
        Self::for_hook_with(paths, hook, envcfg::env_flag("STOP_DEBUG", false))
    }

    pub fn for_hook_with(paths: &Paths, hook: &str, enabled: bool) -> Self {
        Self {
            path: enabled.then(|| paths.debug_log_path(hook)),
        }
    }

    /// A disabled log that drops everything.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Append one line, best-effort.
    pub fn line(&self, msg: impl AsRef<str>) {
        let Some(path) = &self.path else { return };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", msg.as_ref());
        }
    }

    /// Append a line prefixed with the current ISO timestamp.
    pub fn stamped(&self, msg: impl AsRef<str>) {
        self.line(format!("[{}] {}", time_fmt::iso_now(), msg.as_ref()));
    }
}

#[cfg(test)]
#[path = "debug_log_tests.rs"]
mod tests;
