// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stop coordinator specs: DIGEST capture into NOTES, WSI and the queue.

use crate::prelude::*;

#[test]
fn happy_digest_updates_journal_wsi_and_queue() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["hook", "stop"])
        .stdin(stop_payload("RC", "t-1"))
        .passes();

    let notes = temp.read_state("logs/NOTES.md");
    assert!(notes.contains("Subagent Digest — RC — task:t-1"));
    assert!(notes.contains("**Decisions**\n- d1\n- d2\n"));
    assert!(notes.contains("**Files**\n- lib/a.ts — edit\n"));

    let wsi = temp.read_state("logs/wsi.json");
    assert!(wsi.contains("\"path\": \"lib/a.ts\""));
    assert!(wsi.contains("\"reason\": \"edit\""));

    assert_eq!(temp.queued_jobs().len(), 1, "exactly one ingest job enqueued");
    let job: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&temp.queued_jobs()[0]).unwrap()).unwrap();
    assert_eq!(job["type"], "digest");
    assert_eq!(job["status"], "queued");
    assert_eq!(job["attempt_count"], 0);
    assert_eq!(job["payload"]["digest"]["agent"], "RC");
}

#[test]
fn stop_without_digest_creates_placeholders() {
    let temp = Project::empty();
    temp.scribe().args(&["hook", "stop"]).stdin("{}").passes();

    assert!(temp.read_state("logs/NOTES.md").starts_with("# NOTES (living state)"));
    assert!(temp.read_state("logs/wsi.json").contains("\"items\": []"));
    assert!(temp.queued_jobs().is_empty());
}

#[test]
fn empty_stdin_is_treated_as_empty_payload() {
    let temp = Project::empty();
    temp.scribe().args(&["hook", "stop"]).passes();
    assert!(temp.state_exists("logs/NOTES.md"));
}

#[test]
fn invalid_json_payload_warns_user() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["hook", "stop"])
        .stdin("{not json")
        .exits(1)
        .stderr_has("invalid JSON payload");
}

#[test]
fn huge_transcript_digest_found_via_tail_window() {
    let temp = Project::empty();

    // Padding is deliberately unparseable: only the bounded tail read can
    // find this DIGEST, the full parse is disabled by the size limit.
    let mut transcript = String::new();
    while transcript.len() < 64 * 1024 {
        transcript.push_str("pad pad pad pad pad pad pad pad pad pad\n");
    }
    transcript.push_str(&digest_fence("TAIL", "t-tail"));
    temp.file("transcript.jsonl", &transcript);

    let payload = serde_json::json!({
        "transcript_path": temp.path().join("transcript.jsonl").to_string_lossy(),
    })
    .to_string();

    temp.scribe()
        .args(&["hook", "stop"])
        .env("STOP_TAIL_WINDOW_BYTES", "8192")
        .env("STOP_TAIL_FAST_ONLY", "true")
        .env("STOP_HOOK_MAX_TRANSCRIPT_BYTES", "16384")
        .stdin(payload)
        .passes();

    assert!(temp.read_state("logs/NOTES.md").contains("task:t-tail"));
    assert_eq!(temp.queued_jobs().len(), 1);
}

#[test]
fn transcript_scan_prefers_newest_assistant_message() {
    let temp = Project::empty();
    let lines = [
        serde_json::json!({
            "type": "assistant",
            "message": {"content": [{"type": "text", "text": digest_fence("OLD", "t-old")}]}
        }),
        serde_json::json!({
            "type": "assistant",
            "message": {"content": [{"type": "text", "text": digest_fence("NEW", "t-new")}]}
        }),
    ];
    let transcript: String = lines.iter().map(|l| format!("{l}\n")).collect();
    temp.file("transcript.jsonl", &transcript);

    let payload = serde_json::json!({
        "transcript_path": temp.path().join("transcript.jsonl").to_string_lossy(),
    })
    .to_string();
    temp.scribe().args(&["hook", "stop"]).stdin(payload).passes();

    let notes = temp.read_state("logs/NOTES.md");
    assert!(notes.contains("task:t-new"));
    assert!(!notes.contains("task:t-old"));
}

#[test]
fn journal_rotates_at_twenty_entries() {
    let temp = Project::empty();
    for i in 0..23 {
        temp.scribe()
            .args(&["hook", "stop"])
            .stdin(stop_payload("RC", &format!("t-{i}")))
            .passes();
    }

    let notes = temp.read_state("logs/NOTES.md");
    assert_eq!(notes.matches("## [").count(), 20);
    assert!(!notes.contains("task:t-0\n"), "oldest entry should be archived");
    assert!(notes.contains("task:t-22"), "newest entry survives");

    let archive_dir = temp.state_path("logs/notes-archive");
    let archives: Vec<_> = std::fs::read_dir(archive_dir).unwrap().collect();
    assert!(!archives.is_empty());
}

#[test]
fn wsi_dedupes_and_caps_across_turns() {
    let temp = Project::empty();
    for i in 0..12 {
        let payload = serde_json::json!({
            "assistant_text": format!(
                "```json DIGEST {{\"agent\":\"RC\",\"task_id\":\"t-{i}\",\"decisions\":[\"d\"],\"files\":[{{\"path\":\"src/f{i}.rs\",\"reason\":\"edit\"}}]}}```"
            ),
        })
        .to_string();
        temp.scribe().args(&["hook", "stop"]).stdin(payload).passes();
    }

    let wsi: serde_json::Value = serde_json::from_str(&temp.read_state("logs/wsi.json")).unwrap();
    let items = wsi["items"].as_array().unwrap();
    assert_eq!(items.len(), 10);
    assert_eq!(items.last().unwrap()["path"], "src/f11.rs");
    assert_eq!(items.first().unwrap()["path"], "src/f2.rs");
}
