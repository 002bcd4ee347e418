// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint command handlers

use clap::{Args, Subcommand};
use scribe_core::Paths;
use scribe_engine::checkpoint::{
    create_checkpoint, list_checkpoints, restore_checkpoint, CheckpointCreate,
};
use serde_json::json;

use crate::output::print_json;

#[derive(Args)]
pub struct CheckpointArgs {
    #[command(subcommand)]
    pub command: CheckpointCommand,
}

#[derive(Subcommand)]
pub enum CheckpointCommand {
    /// Snapshot the working tree before a risky operation
    Create {
        /// Human-readable reason recorded with the checkpoint
        reason: String,
        /// Optional metadata JSON object
        metadata: Option<String>,
    },
    /// List available checkpoints, newest first
    List,
    /// Apply a checkpoint's stash back onto the working tree
    Restore {
        /// Checkpoint id (YYYYmmdd-HHMMSS)
        id: String,
    },
}

pub async fn run(args: CheckpointArgs) -> i32 {
    let paths = Paths::resolve();
    match args.command {
        CheckpointCommand::Create { reason, metadata } => {
            let metadata = metadata
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_else(|| json!({}));
            let cwd = std::env::current_dir().unwrap_or_else(|_| paths.project_root.clone());
            match create_checkpoint(&paths, &cwd, &reason, metadata).await {
                CheckpointCreate::Created(record) => {
                    print_json(&json!({
                        "success": true,
                        "checkpoint_id": record.id,
                        "stash_ref": record.stash_ref,
                        "timestamp": record.timestamp,
                        "reason": record.reason,
                    }));
                    0
                }
                CheckpointCreate::CleanTree => {
                    print_json(&json!({
                        "success": true,
                        "skipped": true,
                        "reason": "No uncommitted changes to checkpoint",
                    }));
                    0
                }
                CheckpointCreate::NotARepo => {
                    print_json(&json!({
                        "success": false,
                        "error": "Not a git repository - checkpoints require git",
                        "reason": reason,
                    }));
                    1
                }
                CheckpointCreate::Failed(error) => {
                    print_json(&json!({"success": false, "error": error, "reason": reason}));
                    1
                }
            }
        }
        CheckpointCommand::List => {
            print_json(&list_checkpoints(&paths));
            0
        }
        CheckpointCommand::Restore { id } => match restore_checkpoint(&paths, &id).await {
            Ok(info) => {
                print_json(&json!({
                    "success": true,
                    "checkpoint_id": info.checkpoint_id,
                    "restored_files": info.restored_files,
                    "reason": info.reason,
                    "timestamp": info.timestamp,
                }));
                0
            }
            Err(error) => {
                print_json(&json!({"success": false, "error": error}));
                1
            }
        },
    }
}
