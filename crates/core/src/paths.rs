// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolved filesystem layout for a project's hook state.
//!
//! Everything the pipeline writes lives under the per-project state
//! directory (`<project_root>/.claude`), with the logs directory and the
//! WSI path individually overridable for shared setups.

use std::io;
use std::path::{Path, PathBuf};

use crate::envcfg;

/// Default WSI cap when `WSI_CAP` is unset.
pub const DEFAULT_WSI_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub project_root: PathBuf,
    pub state_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub wsi_path: PathBuf,
    pub queue_dir: PathBuf,
    pub dead_dir: PathBuf,
    pub launchd_dir: PathBuf,
    pub checkpoints_dir: PathBuf,
}

impl Paths {
    /// Resolve from the environment: `CLAUDE_PROJECT_DIR` overrides the
    /// project root (falling back to the working directory), `LOGS_DIR` and
    /// `WSI_PATH` override their defaults.
    pub fn resolve() -> Self {
        let root = envcfg::env_str("CLAUDE_PROJECT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let mut paths = Self::for_root(root);
        if let Some(logs) = envcfg::env_str("LOGS_DIR") {
            paths.logs_dir = PathBuf::from(logs);
            paths.wsi_path = paths.logs_dir.join("wsi.json");
            paths.checkpoints_dir = paths.logs_dir.join("checkpoints");
        }
        if let Some(wsi) = envcfg::env_str("WSI_PATH") {
            paths.wsi_path = PathBuf::from(wsi);
        }
        paths
    }

    /// Default layout under a given project root, ignoring the environment.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let project_root = root.into();
        let state_dir = project_root.join(".claude");
        let logs_dir = state_dir.join("logs");
        let queue_dir = state_dir.join("ingest-queue");
        Self {
            wsi_path: logs_dir.join("wsi.json"),
            dead_dir: queue_dir.join("dead"),
            launchd_dir: state_dir.join("launchd"),
            checkpoints_dir: logs_dir.join("checkpoints"),
            project_root,
            state_dir,
            logs_dir,
            queue_dir,
        }
    }

    /// WSI cap from `WSI_CAP`, default 10.
    pub fn wsi_cap() -> usize {
        envcfg::env_parse("WSI_CAP", DEFAULT_WSI_CAP).max(1)
    }

    pub fn notes_path(&self) -> PathBuf {
        self.logs_dir.join("NOTES.md")
    }

    pub fn notes_archive_dir(&self) -> PathBuf {
        self.logs_dir.join("notes-archive")
    }

    pub fn warnings_path(&self) -> PathBuf {
        self.logs_dir.join("WARNINGS.md")
    }

    pub fn compaction_md_path(&self) -> PathBuf {
        self.logs_dir.join("COMPACTION.md")
    }

    pub fn compaction_json_path(&self) -> PathBuf {
        self.logs_dir.join("compaction-summary.json")
    }

    pub fn counter_path(&self) -> PathBuf {
        self.logs_dir.join("turn_count.txt")
    }

    pub fn hash_cache_path(&self) -> PathBuf {
        self.logs_dir.join("file_hashes.json")
    }

    pub fn approvals_path(&self) -> PathBuf {
        self.logs_dir.join("md_request_state.json")
    }

    pub fn reminder_state_path(&self) -> PathBuf {
        self.logs_dir.join("digest_reminder_state.json")
    }

    pub fn status_health_path(&self) -> PathBuf {
        self.logs_dir.join("project_status_health.json")
    }

    pub fn status_doc_path(&self) -> PathBuf {
        self.project_root.join("CLAUDE.md")
    }

    pub fn setup_marker_path(&self) -> PathBuf {
        self.state_dir.join(".needs_vector_rag_setup")
    }

    /// Per-hook debug trace file, e.g. `logs/stop_hook_debug.log`.
    pub fn debug_log_path(&self, hook: &str) -> PathBuf {
        self.logs_dir.join(format!("{hook}_debug.log"))
    }

    /// Create the base directories every hook relies on.
    pub fn ensure_base_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.logs_dir)?;
        std::fs::create_dir_all(&self.queue_dir)?;
        std::fs::create_dir_all(&self.dead_dir)?;
        std::fs::create_dir_all(&self.launchd_dir)?;
        Ok(())
    }

    /// Whether the project root is the user's global state directory
    /// (`~/.claude`), which status updates must not touch by default.
    pub fn is_global_root(&self, home: Option<&Path>) -> bool {
        let Some(home) = home else { return false };
        let global = home.join(".claude");
        canonical_or(&self.project_root) == canonical_or(&global)
    }
}

fn canonical_or(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
