// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint record persistence with delete-oldest rotation.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Checkpoints kept on disk.
pub const MAX_CHECKPOINTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub id: String,
    pub timestamp: String,
    pub reason: String,
    pub stash_ref: String,
    pub git_root: PathBuf,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub files_changed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
    max: usize,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max: MAX_CHECKPOINTS,
        }
    }

    pub fn with_max(dir: impl Into<PathBuf>, max: usize) -> Self {
        Self {
            dir: dir.into(),
            max,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a record and rotate older ones out.
    pub fn save(&self, record: &CheckpointRecord) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut text = serde_json::to_string_pretty(record).map_err(io::Error::other)?;
        text.push('\n');
        std::fs::write(self.dir.join(format!("{}.json", record.id)), text)?;
        self.rotate();
        Ok(())
    }

    pub fn load(&self, id: &str) -> Option<CheckpointRecord> {
        let text = std::fs::read_to_string(self.dir.join(format!("{id}.json"))).ok()?;
        serde_json::from_str(&text).ok()
    }

    /// All records, newest first (ids sort chronologically).
    pub fn list(&self) -> Vec<CheckpointRecord> {
        let mut files = self.record_files();
        files.sort();
        files.reverse();
        files
            .iter()
            .filter_map(|p| std::fs::read_to_string(p).ok())
            .filter_map(|text| serde_json::from_str(&text).ok())
            .collect()
    }

    /// Delete the oldest records beyond the cap.
    pub fn rotate(&self) {
        let mut files = self.record_files();
        files.sort();
        if files.len() <= self.max {
            return;
        }
        let excess = files.len() - self.max;
        for path in files.into_iter().take(excess) {
            let _ = std::fs::remove_file(path);
        }
    }

    fn record_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect()
    }
}

#[cfg(test)]
#[path = "checkpoints_tests.rs"]
mod tests;
