// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Short-lived markdown-creation approvals.
//!
//! The UserPromptSubmit hook records filenames the user explicitly asked
//! for; the PreToolUse markdown gate consumes them. Entries expire five
//! minutes after the recording timestamp. A successful match is single-use,
//! except the permissive sentinel which survives individual writes.

use std::io;
use std::path::{Path, PathBuf};

use scribe_core::time_fmt;
use serde::{Deserialize, Serialize};

/// Sentinel recorded for vague documentation requests.
pub const PERMISSIVE: &str = "*PERMISSIVE*";

/// Seconds an approval stays valid.
pub const TTL_SECS: f64 = 300.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalState {
    #[serde(default)]
    pub approved_files: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Approval {
    /// A vague documentation request armed permissive mode.
    Permissive,
    /// The named entry matched and was consumed.
    Explicit(String),
}

#[derive(Debug, Clone)]
pub struct ApprovalStore {
    path: PathBuf,
}

impl ApprovalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> ApprovalState {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    /// Record approvals with the current timestamp, replacing prior state.
    pub fn record(&self, approved_files: Vec<String>) -> io::Result<()> {
        let state = ApprovalState {
            approved_files,
            timestamp: Some(time_fmt::iso_now()),
        };
        self.save(&state)
    }

    fn save(&self, state: &ApprovalState) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut text = serde_json::to_string_pretty(state).map_err(io::Error::other)?;
        text.push('\n');
        std::fs::write(&self.path, text)
    }

    /// Match `file_path` against unexpired approvals. An explicit match is
    /// removed from the store; the permissive sentinel is left in place.
    pub fn consume(&self, file_path: &str) -> Option<Approval> {
        let mut state = self.load();
        let fresh = state
            .timestamp
            .as_deref()
            .and_then(time_fmt::secs_since)
            .is_some_and(|elapsed| elapsed <= TTL_SECS);
        if !fresh {
            return None;
        }

        if state.approved_files.iter().any(|a| a == PERMISSIVE) {
            return Some(Approval::Permissive);
        }

        let file_name = Path::new(file_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let path_lower = file_path.to_lowercase();

        let index = state.approved_files.iter().position(|approved| {
            file_path.ends_with(approved.as_str())
                || file_name == approved.to_lowercase()
                || path_lower.contains(&approved.to_lowercase())
        })?;
        let matched = state.approved_files.remove(index);
        let _ = self.save(&state);
        Some(Approval::Explicit(matched))
    }
}

#[cfg(test)]
#[path = "approvals_tests.rs"]
mod tests;
