// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn journal_in(temp: &TempDir) -> Journal {
    Journal::at(
        temp.path().join("NOTES.md"),
        temp.path().join("notes-archive"),
    )
}

fn digest(agent: &str, task: &str) -> Digest {
    let mut d = Digest::new(agent, task);
    d.decisions.push(format!("decision by {agent}"));
    d
}

#[test]
fn ensure_writes_preamble_once() {
    let temp = TempDir::new().unwrap();
    let journal = journal_in(&temp);
    journal.ensure().unwrap();
    let first = journal.read();
    assert!(first.starts_with("# NOTES (living state)"));
    journal.ensure().unwrap();
    assert_eq!(journal.read(), first);
}

#[test]
fn append_adds_entry_with_header() {
    let temp = TempDir::new().unwrap();
    let journal = journal_in(&temp);
    journal.append_digest(&digest("RC", "t-1")).unwrap();
    let text = journal.read();
    assert!(text.contains("Subagent Digest — RC — task:t-1"));
    assert_eq!(journal.entries().len(), 1);
}

#[test]
fn rotation_is_noop_at_exactly_cap() {
    let temp = TempDir::new().unwrap();
    let journal = journal_in(&temp);
    for i in 0..MAX_ENTRIES {
        journal.append_digest(&digest("RC", &format!("t-{i}"))).unwrap();
    }
    assert_eq!(journal.entries().len(), MAX_ENTRIES);
    assert!(journal.rotate().unwrap().is_none());
    assert!(!temp.path().join("notes-archive").exists());
}

#[test]
fn overflow_is_archived_and_live_journal_capped() {
    let temp = TempDir::new().unwrap();
    let journal = journal_in(&temp);
    for i in 0..(MAX_ENTRIES + 5) {
        journal.append_digest(&digest("RC", &format!("t-{i}"))).unwrap();
    }

    let entries = journal.entries();
    assert_eq!(entries.len(), MAX_ENTRIES);
    // Newest survive; the oldest five were archived.
    assert!(entries[0].contains("task:t-5"));
    assert!(entries.last().unwrap().contains(&format!("task:t-{}", MAX_ENTRIES + 4)));

    let archive_dir = temp.path().join("notes-archive");
    let archives: Vec<_> = std::fs::read_dir(&archive_dir).unwrap().collect();
    assert!(!archives.is_empty());
    let archived = std::fs::read_to_string(archives[0].as_ref().unwrap().path()).unwrap();
    assert!(archived.starts_with("# Archived NOTES"));
    assert!(archived.contains("task:t-0"));
    assert!(archived.contains("task:t-4"));
    assert!(!archived.contains("task:t-5\n") && !archived.contains("task:t-5 "));
}

#[test]
fn tail_contains_sees_recent_entries_only() {
    let temp = TempDir::new().unwrap();
    let journal = journal_in(&temp);
    journal.ensure().unwrap();

    // Push the marker out of the 500-byte tail with later entries.
    let mut early = digest("DME", "schema-work");
    early.decisions = vec![r#"{"agent": "DME"} ran the migration"#.into()];
    journal.append_digest(&early).unwrap();
    assert!(journal.tail_contains(r#"agent": "DME"#));

    for i in 0..5 {
        journal.append_digest(&digest("RC", &format!("filler-{i}"))).unwrap();
    }
    assert!(!journal.tail_contains(r#"agent": "DME"#));
}

#[test]
fn unreadable_journal_reads_empty() {
    let temp = TempDir::new().unwrap();
    let journal = journal_in(&temp);
    assert_eq!(journal.read(), "");
    assert!(journal.entries().is_empty());
    assert!(!journal.tail_contains("anything"));
}
