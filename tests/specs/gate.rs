// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PreToolUse gate specs: exit-code semantics for each policy.

use crate::prelude::*;

#[test]
fn ordinary_tools_are_allowed_silently() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin(tool_payload("Glob", serde_json::json!({"pattern": "**/*.rs"})))
        .passes();
}

#[test]
fn empty_payload_is_allowed() {
    let temp = Project::empty();
    temp.scribe().args(&["hook", "pretool"]).passes();
}

#[test]
fn non_json_payload_is_allowed_with_notice() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin("plain text")
        .passes()
        .stderr_has("allowing command");
}

#[test]
fn schema_change_without_dme_is_blocked() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin(tool_payload(
            "Edit",
            serde_json::json!({"file_path": "prisma/schema.prisma"}),
        ))
        .exits(2)
        .stderr_has("SCHEMA CHANGE BLOCKED")
        .stderr_has("prisma/schema.prisma");
}

#[test]
fn schema_change_with_recent_dme_entry_is_allowed() {
    let temp = Project::empty();
    // A DME digest in the journal tail authorizes the edit.
    let payload = serde_json::json!({
        "assistant_text": "```json DIGEST {\"agent\":\"DME\",\"task_id\":\"mig-1\",\"decisions\":[\"{\\\"agent\\\": \\\"DME\\\"} ran migration\"]}```",
    })
    .to_string();
    temp.scribe().args(&["hook", "stop"]).stdin(payload).passes();

    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin(tool_payload(
            "Edit",
            serde_json::json!({"file_path": "prisma/schema.prisma"}),
        ))
        .passes();
}

#[test]
fn duplicate_reads_escalate_warn_warn_block() {
    let temp = Project::empty();
    temp.file("src/x.ts", "export const x = 1;\n");
    let payload = tool_payload(
        "Read",
        serde_json::json!({"file_path": temp.path().join("src/x.ts").to_string_lossy()}),
    );

    temp.scribe().args(&["hook", "pretool"]).stdin(payload.clone()).passes();
    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin(payload.clone())
        .exits(1)
        .stderr_has("Duplicate Read Warning (1/3)");
    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin(payload.clone())
        .exits(1)
        .stderr_has("Duplicate Read Warning (2/3)");
    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin(payload)
        .exits(2)
        .stderr_has("DUPLICATE READ BLOCKED")
        .stderr_has("was already read and hasn't changed")
        .stderr_has("x.ts");
}

#[test]
fn changed_file_resets_duplicate_counter() {
    let temp = Project::empty();
    temp.file("src/x.ts", "v1");
    let payload = tool_payload(
        "Read",
        serde_json::json!({"file_path": temp.path().join("src/x.ts").to_string_lossy()}),
    );
    temp.scribe().args(&["hook", "pretool"]).stdin(payload.clone()).passes();
    temp.file("src/x.ts", "v2");
    temp.scribe().args(&["hook", "pretool"]).stdin(payload).passes();
}

#[test]
fn dependency_removal_without_ids_is_blocked() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin(tool_payload(
            "Bash",
            serde_json::json!({"command": "npm uninstall left-pad"}),
        ))
        .exits(2)
        .stderr_has("DEPENDENCY REMOVAL BLOCKED");
}

#[test]
fn routing_advisory_warns_on_direct_code_edit() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin(tool_payload(
            "Edit",
            serde_json::json!({"file_path": "/work/proj/src/app.ts"}),
        ))
        .exits(1)
        .stderr_has("ROUTING POLICY REMINDER");
}

#[test]
fn unapproved_markdown_write_is_blocked() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin(tool_payload(
            "Write",
            serde_json::json!({"file_path": "docs/design.md"}),
        ))
        .exits(2)
        .stderr_has("MARKDOWN SPAM PREVENTION")
        .stderr_has("docs/design.md");
}

#[test]
fn system_markdown_files_pass_the_gate() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin(tool_payload(
            "Write",
            serde_json::json!({"file_path": "README.md"}),
        ))
        .passes();
}

#[test]
fn prompt_approval_unlocks_one_markdown_write() {
    let temp = Project::empty();

    // The user explicitly asked for this file.
    temp.scribe()
        .args(&["hook", "prompt"])
        .stdin(serde_json::json!({"prompt": "please create docs/design.md"}).to_string())
        .passes();

    let write = tool_payload("Write", serde_json::json!({"file_path": "docs/design.md"}));
    temp.scribe()
        .args(&["hook", "pretool"])
        .stdin(write.clone())
        .passes()
        .stderr_has("MD Creation Approved");

    // Single-use: the second identical write is blocked again.
    temp.scribe().args(&["hook", "pretool"]).stdin(write).exits(2);
}

#[test]
fn turn_counter_advances_per_invocation() {
    let temp = Project::empty();
    for _ in 0..3 {
        temp.scribe()
            .args(&["hook", "pretool"])
            .stdin(tool_payload("Glob", serde_json::json!({})))
            .passes();
    }
    assert_eq!(temp.read_state("logs/turn_count.txt"), "3");
}
