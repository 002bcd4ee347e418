// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint specs: non-intrusive snapshots with restore.

use crate::prelude::*;

fn init_committed_repo(temp: &Project) {
    temp.git_init();
    temp.file("app.txt", "v1\n");
    temp.git(&["add", "-A"]);
    temp.git(&["commit", "-q", "-m", "init"]);
}

#[test]
fn create_outside_repo_fails_cleanly() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["checkpoint", "create", "test"])
        .exits(1)
        .stdout_has("Not a git repository");
}

#[test]
fn clean_tree_is_skipped() {
    let temp = Project::empty();
    init_committed_repo(&temp);
    temp.scribe()
        .args(&["checkpoint", "create", "nothing to save"])
        .passes()
        .stdout_has("\"skipped\": true");
}

#[test]
fn dirty_tree_checkpoint_leaves_files_untouched() {
    let temp = Project::empty();
    init_committed_repo(&temp);
    temp.file("app.txt", "v2\n");
    temp.file("new.txt", "fresh\n");

    temp.scribe()
        .args(&["checkpoint", "create", "Critical config change", r#"{"tool":"Edit"}"#])
        .passes()
        .stdout_has("\"success\": true")
        .stdout_has("checkpoint_id");

    // Working tree is byte-identical after the snapshot.
    assert_eq!(temp.read("app.txt"), "v2\n");
    assert_eq!(temp.read("new.txt"), "fresh\n");

    temp.scribe()
        .args(&["checkpoint", "list"])
        .passes()
        .stdout_has("Critical config change")
        .stdout_has("app.txt");
}

#[test]
fn restore_round_trip_recovers_changes() {
    let temp = Project::empty();
    init_committed_repo(&temp);
    temp.file("app.txt", "dirty\n");

    let stdout = temp
        .scribe()
        .args(&["checkpoint", "create", "before revert"])
        .passes()
        .stdout();
    let created: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let id = created["checkpoint_id"].as_str().unwrap().to_string();

    // Drop the change, then restore the checkpoint.
    temp.git(&["checkout", "--", "app.txt"]);
    assert_eq!(temp.read("app.txt"), "v1\n");

    temp.scribe()
        .args(&["checkpoint", "restore", &id])
        .passes()
        .stdout_has("\"success\": true")
        .stdout_has("restored_files");
    assert_eq!(temp.read("app.txt"), "dirty\n");
}

#[test]
fn restore_unknown_id_fails() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["checkpoint", "restore", "20990101-000000"])
        .exits(1)
        .stdout_has("not found");
}
