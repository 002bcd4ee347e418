// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project status specs: idempotent block maintenance in CLAUDE.md.

use crate::prelude::*;

const DOC: &str = "# Project\n\n<context_engineering>\nrules here\n</context_engineering>\n\nHandwritten body.\n";

#[test]
fn update_inserts_block_after_anchor() {
    let temp = Project::empty();
    temp.file("CLAUDE.md", DOC);
    temp.scribe()
        .args(&["hook", "stop"])
        .stdin(stop_payload("RC", "t-1"))
        .passes();

    temp.scribe()
        .args(&["status", "--update", "--fast-local"])
        .env("DISABLE_CLAUDE_MD_UPDATE", "false")
        .passes()
        .stdout_has("\"ok\": true")
        .stdout_has("\"updated\": true");

    let doc = temp.read("CLAUDE.md");
    let anchor_at = doc.find("</context_engineering>").unwrap();
    let block_at = doc.find("<project_status>").unwrap();
    assert!(block_at > anchor_at);
    assert!(doc.contains("Phase:"));
    assert!(doc.contains("- Components: a.ts"));
    assert!(doc.ends_with("Handwritten body.\n"));
    assert!(temp.state_exists("logs/project_status_health.json"));
}

#[test]
fn second_update_with_same_inputs_is_a_no_write() {
    let temp = Project::empty();
    temp.file("CLAUDE.md", DOC);
    temp.scribe()
        .args(&["hook", "stop"])
        .stdin(stop_payload("RC", "t-1"))
        .passes();

    temp.scribe()
        .args(&["status", "--update", "--fast-local"])
        .env("DISABLE_CLAUDE_MD_UPDATE", "false")
        .passes();
    let first = temp.read("CLAUDE.md");

    temp.scribe()
        .args(&["status", "--update", "--fast-local"])
        .env("DISABLE_CLAUDE_MD_UPDATE", "false")
        .passes()
        .stdout_has("\"updated\": false");
    similar_asserts::assert_eq!(temp.read("CLAUDE.md"), first);
}

#[test]
fn missing_doc_is_reported_not_created() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["status", "--update", "--fast-local"])
        .env("DISABLE_CLAUDE_MD_UPDATE", "false")
        .exits(1)
        .stdout_has("CLAUDE.md not found");
    assert!(!temp.path().join("CLAUDE.md").exists());
}

#[test]
fn env_opt_out_is_honored() {
    let temp = Project::empty();
    temp.file("CLAUDE.md", DOC);
    temp.scribe()
        .args(&["status", "--update", "--fast-local"])
        .env("DISABLE_CLAUDE_MD_UPDATE", "true")
        .passes()
        .stdout_has("env:DISABLE_CLAUDE_MD_UPDATE");
    assert!(!temp.read("CLAUDE.md").contains("<project_status>"));
}

#[test]
fn doc_without_anchor_gets_block_prepended() {
    let temp = Project::empty();
    temp.file("CLAUDE.md", "# Plain doc\n");
    temp.scribe()
        .args(&["status", "--update", "--fast-local"])
        .env("DISABLE_CLAUDE_MD_UPDATE", "false")
        .passes();
    let doc = temp.read("CLAUDE.md");
    assert!(doc.starts_with("<project_status>"));
    assert!(doc.contains("# Plain doc"));
}
