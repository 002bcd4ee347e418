// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn test_config() -> StopConfig {
    StopConfig {
        scan: ScanConfig::default(),
        time_budget_ms: 0,
        drain_on_stop: false,
        refresh_status: false,
    }
}

fn digest_block(agent: &str, task: &str) -> String {
    format!(
        "```json DIGEST {{\"agent\":\"{agent}\",\"task_id\":\"{task}\",\"decisions\":[\"d1\",\"d2\"],\"files\":[{{\"path\":\"lib/a.ts\",\"reason\":\"edit\"}}]}}```"
    )
}

fn stop_event(raw: &str) -> HookEvent {
    serde_json::from_str(raw).unwrap()
}

#[tokio::test]
async fn no_digest_still_creates_placeholders() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::for_root(temp.path());
    let summary = run_stop(&paths, &HookEvent::default(), &test_config()).await;

    assert!(!summary.digest_found);
    let notes = std::fs::read_to_string(paths.notes_path()).unwrap();
    assert!(notes.starts_with("# NOTES (living state)"));
    let wsi = std::fs::read_to_string(&paths.wsi_path).unwrap();
    assert!(wsi.contains("\"items\": []"));
    assert_eq!(std::fs::read_dir(&paths.queue_dir).unwrap().count(), 1); // dead/ only
}

#[tokio::test]
async fn payload_digest_takes_the_fast_path() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::for_root(temp.path());
    let event = stop_event(&serde_json::json!({"assistant_text": digest_block("RC", "t-1")}).to_string());

    let summary = run_stop(&paths, &event, &test_config()).await;
    assert!(summary.digest_found);

    // Journal entry with header, decisions, and files.
    let notes = std::fs::read_to_string(paths.notes_path()).unwrap();
    assert!(notes.contains("Subagent Digest — RC — task:t-1"));
    assert!(notes.contains("- d1\n- d2\n"));
    assert!(notes.contains("- lib/a.ts — edit"));

    // WSI carries the file at the tail.
    let wsi = std::fs::read_to_string(&paths.wsi_path).unwrap();
    assert!(wsi.contains("lib/a.ts"));
    assert!(wsi.contains("\"reason\": \"edit\""));

    // Exactly one job landed in the queue.
    let jobs: Vec<_> = std::fs::read_dir(&paths.queue_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "json"))
        .collect();
    assert_eq!(jobs.len(), 1);
    assert_eq!(
        summary.enqueued.as_deref(),
        jobs[0].file_name().to_str()
    );
}

#[tokio::test]
async fn transcript_tail_supplies_the_digest() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::for_root(temp.path());

    let transcript = temp.path().join("transcript.jsonl");
    let line = serde_json::json!({
        "type": "assistant",
        "message": {"content": [{"type": "text", "text": digest_block("TR", "t-9")}]}
    });
    std::fs::write(&transcript, format!("{line}\n")).unwrap();

    let event = stop_event(
        &serde_json::json!({"transcript_path": transcript.to_string_lossy()}).to_string(),
    );
    let summary = run_stop(&paths, &event, &test_config()).await;
    assert!(summary.digest_found);
    assert!(std::fs::read_to_string(paths.notes_path())
        .unwrap()
        .contains("task:t-9"));
}

#[tokio::test]
async fn payload_digest_wins_over_transcript() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::for_root(temp.path());
    let transcript = temp.path().join("transcript.jsonl");
    std::fs::write(
        &transcript,
        serde_json::json!({
            "type": "assistant",
            "message": {"content": [{"type": "text", "text": digest_block("OLD", "t-old")}]}
        })
        .to_string(),
    )
    .unwrap();

    let event = stop_event(
        &serde_json::json!({
            "assistant_text": digest_block("NEW", "t-new"),
            "transcript_path": transcript.to_string_lossy(),
        })
        .to_string(),
    );
    run_stop(&paths, &event, &test_config()).await;
    let notes = std::fs::read_to_string(paths.notes_path()).unwrap();
    assert!(notes.contains("task:t-new"));
    assert!(!notes.contains("task:t-old"));
}

#[tokio::test]
async fn gated_digest_updates_notes_but_not_queue() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::for_root(temp.path());
    // task_id "untagged" fails the queue quality gates.
    let block = "```json DIGEST {\"agent\":\"RC\",\"decisions\":[\"d\"]}```";
    let event = stop_event(&serde_json::json!({"assistant_text": block}).to_string());

    let summary = run_stop(&paths, &event, &test_config()).await;
    assert!(summary.digest_found);
    assert!(summary.enqueued.is_none());
    assert!(std::fs::read_to_string(paths.notes_path())
        .unwrap()
        .contains("task:untagged"));
}

#[tokio::test]
async fn setup_marker_written_when_vector_disabled() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::for_root(temp.path());
    let event = stop_event(&serde_json::json!({"assistant_text": digest_block("RC", "t-1")}).to_string());

    run_stop(&paths, &event, &test_config()).await;
    assert!(paths.setup_marker_path().exists());
    let warnings = std::fs::read_to_string(paths.warnings_path()).unwrap();
    assert!(warnings.contains("Vector RAG is not configured"));

    // Second capture does not repeat the warning.
    run_stop(&paths, &event, &test_config()).await;
    let warnings = std::fs::read_to_string(paths.warnings_path()).unwrap();
    assert_eq!(warnings.matches("Vector RAG is not configured").count(), 1);
}

#[tokio::test]
async fn repeated_stop_appends_separate_entries() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::for_root(temp.path());
    for i in 0..3 {
        let event = stop_event(
            &serde_json::json!({"assistant_text": digest_block("RC", &format!("t-{i}"))}).to_string(),
        );
        run_stop(&paths, &event, &test_config()).await;
    }
    let journal = Journal::new(&paths);
    assert_eq!(journal.entries().len(), 3);
}
