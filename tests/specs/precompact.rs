// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PreCompact specs: bounded summary emission.

use crate::prelude::*;

#[test]
fn journal_entries_roll_up_into_the_summary() {
    let temp = Project::empty();
    temp.scribe()
        .args(&["hook", "stop"])
        .stdin(stop_payload("RC", "t-1"))
        .passes();
    temp.scribe()
        .args(&["hook", "stop"])
        .stdin(stop_payload("DME", "t-2"))
        .passes();

    temp.scribe().args(&["hook", "precompact"]).stdin("{}").passes();

    let summary: serde_json::Value =
        serde_json::from_str(&temp.read_state("logs/compaction-summary.json")).unwrap();
    let agents: Vec<&str> = summary["agents_seen"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(agents, vec!["DME", "RC"]);
    // d1/d2 repeat in both digests; the roll-up deduplicates.
    assert_eq!(summary["decisions"], serde_json::json!(["d1", "d2"]));
    assert_eq!(summary["owned_artifacts"], serde_json::json!(["lib/a.ts"]));
    assert_eq!(summary["wsi_snapshot"].as_array().unwrap().len(), 1);

    let md = temp.read_state("logs/COMPACTION.md");
    assert!(md.starts_with("# Compaction Summary —"));
    assert!(md.contains("- Agents active: DME, RC"));
    assert!(md.contains("- `lib/a.ts`"));
    assert!(md.contains("<details>"));
}

#[test]
fn payload_digests_are_used_when_journal_is_empty() {
    let temp = Project::empty();
    let payload = serde_json::json!({ "assistant_text": digest_fence("PAY", "t-9") }).to_string();
    temp.scribe().args(&["hook", "precompact"]).stdin(payload).passes();

    let summary: serde_json::Value =
        serde_json::from_str(&temp.read_state("logs/compaction-summary.json")).unwrap();
    assert_eq!(summary["agents_seen"], serde_json::json!(["PAY"]));
}

#[test]
fn empty_world_still_writes_both_files() {
    let temp = Project::empty();
    temp.scribe().args(&["hook", "precompact"]).stdin("{}").passes();
    assert!(temp.state_exists("logs/COMPACTION.md"));
    assert!(temp.state_exists("logs/compaction-summary.json"));
    assert!(temp.read_state("logs/COMPACTION.md").contains("- Agents active: none"));
}

#[test]
fn open_questions_and_risks_are_scraped_from_notes() {
    let temp = Project::empty();
    temp.file(
        ".claude/logs/NOTES.md",
        "# NOTES (living state)\n\n## Open Questions\n- should rotation be atomic?\n\n## Risks\n- tail scan may miss mid-file digests\n",
    );
    temp.scribe().args(&["hook", "precompact"]).stdin("{}").passes();

    let summary: serde_json::Value =
        serde_json::from_str(&temp.read_state("logs/compaction-summary.json")).unwrap();
    assert_eq!(
        summary["open_questions"],
        serde_json::json!(["should rotation be atomic?"])
    );
    assert_eq!(
        summary["risks"],
        serde_json::json!(["tail scan may miss mid-file digests"])
    );
}
