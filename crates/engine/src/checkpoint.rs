// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint manager: content-addressed snapshots of the working tree.
//!
//! Snapshots use `git stash create` (object-only, the working tree is never
//! touched), store the object under the stash reflog, and reset the index
//! back to its pre-snapshot state. Restore applies the stored object hash.

use std::path::Path;

use scribe_core::{checkpoint_id, time_fmt, Paths};
use scribe_storage::{CheckpointRecord, CheckpointStore};
use serde_json::Value;

use scribe_adapters::git::{Git, Porcelain};

#[derive(Debug, Clone, PartialEq)]
pub enum CheckpointCreate {
    Created(CheckpointRecord),
    /// Nothing uncommitted; no snapshot needed.
    CleanTree,
    NotARepo,
    Failed(String),
}

/// Files restored by a checkpoint apply.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RestoreInfo {
    pub checkpoint_id: String,
    pub restored_files: Vec<String>,
    pub reason: String,
    pub timestamp: String,
}

pub async fn create_checkpoint(
    paths: &Paths,
    cwd: &Path,
    reason: &str,
    metadata: Value,
) -> CheckpointCreate {
    let git = Git;
    let Some(git_root) = git.repo_root(cwd).await else {
        return CheckpointCreate::NotARepo;
    };

    let status = match git.status_porcelain(&git_root).await {
        Ok(status) => status,
        Err(e) => return CheckpointCreate::Failed(e.to_string()),
    };
    if status.trim().is_empty() {
        return CheckpointCreate::CleanTree;
    }

    let timestamp = time_fmt::iso_now();
    let message = format!("CHECKPOINT: {reason} | {timestamp}");

    // Stage everything (including untracked) so the stash object covers the
    // whole tree, then restore the original staging state afterwards.
    if let Err(e) = git.add_all(&git_root).await {
        return CheckpointCreate::Failed(e.to_string());
    }
    let stash_ref = match git.stash_create(&git_root, &message).await {
        Ok(Some(sha)) => sha,
        Ok(None) => {
            let _ = git.reset_index(&git_root).await;
            return CheckpointCreate::Failed("git stash create returned no object".into());
        }
        Err(e) => {
            let _ = git.reset_index(&git_root).await;
            return CheckpointCreate::Failed(e.to_string());
        }
    };
    if let Err(e) = git.stash_store(&git_root, &message, &stash_ref).await {
        let _ = git.reset_index(&git_root).await;
        return CheckpointCreate::Failed(e.to_string());
    }
    if let Err(e) = git.reset_index(&git_root).await {
        return CheckpointCreate::Failed(e.to_string());
    }

    let record = CheckpointRecord {
        id: checkpoint_id(),
        timestamp,
        reason: reason.to_string(),
        stash_ref,
        git_root,
        metadata,
        files_changed: Porcelain::lines(&status),
    };
    let store = CheckpointStore::new(&paths.checkpoints_dir);
    if let Err(e) = store.save(&record) {
        return CheckpointCreate::Failed(format!("failed to persist checkpoint record: {e}"));
    }
    CheckpointCreate::Created(record)
}

pub fn list_checkpoints(paths: &Paths) -> Vec<CheckpointRecord> {
    CheckpointStore::new(&paths.checkpoints_dir).list()
}

pub async fn restore_checkpoint(paths: &Paths, id: &str) -> Result<RestoreInfo, String> {
    let store = CheckpointStore::new(&paths.checkpoints_dir);
    let record = store.load(id).ok_or_else(|| format!("Checkpoint {id} not found"))?;

    Git.stash_apply(&record.git_root, &record.stash_ref)
        .await
        .map_err(|e| format!("Failed to restore checkpoint: {e}"))?;

    Ok(RestoreInfo {
        checkpoint_id: record.id,
        restored_files: record.files_changed,
        reason: record.reason,
        timestamp: record.timestamp,
    })
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
