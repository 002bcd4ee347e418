// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal entry rendering and scraping.
//!
//! The entry format is a stable external interface: the header regex, the
//! section names and the bullet shapes are consumed by the compaction
//! builder and downstream tooling.

use std::sync::LazyLock;

use regex::Regex;
use scribe_core::{Digest, FileRef};

/// Preamble written to a fresh NOTES.md.
pub const NOTES_HEADER: &str =
    "# NOTES (living state)\n\nLast 20 digests. Older entries archived to logs/notes-archive/.\n";

/// Start of an H2 entry header.
#[allow(clippy::expect_used)]
static ENTRY_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"## \[\d{4}-\d{2}-\d{2}").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^## \[(?P<ts>[^\]]+)\] Subagent Digest — (?P<agent>.*?) — task:(?P<task>.*)$")
        .expect("constant regex pattern is valid")
});

/// Render one journal entry for the digest at the given timestamp.
pub fn render_entry(digest: &Digest, ts: &str) -> String {
    let mut out = format!(
        "## [{ts}] Subagent Digest — {} — task:{}\n\n",
        digest.agent, digest.task_id
    );

    out.push_str(&section("Decisions", &bullets(&digest.decisions)));
    out.push_str(&section("Files", &file_bullets(&digest.files)));
    out.push_str(&section("Contracts Affected", &bullets(&digest.contracts)));
    out.push_str(&section("Next Steps", &bullets(&digest.next)));

    let evidence: Vec<String> = digest
        .evidence
        .iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => format!("{k}: {s}"),
            other => format!("{k}: {other}"),
        })
        .collect();
    out.push_str(&section("Evidence", &bullets(&evidence)));
    out
}

fn section(name: &str, body: &str) -> String {
    format!("**{name}**\n{body}\n")
}

fn bullets(items: &[String]) -> String {
    if items.is_empty() {
        return "- n/a\n".to_string();
    }
    items.iter().map(|i| format!("- {i}\n")).collect()
}

fn file_bullets(files: &[FileRef]) -> String {
    if files.is_empty() {
        return "- n/a\n".to_string();
    }
    files
        .iter()
        .map(|f| {
            let mut line = format!("- {} — {}", f.path, f.reason);
            if !f.anchors.is_empty() {
                line.push_str(&format!(" anchors=[{}]", f.anchors.join(", ")));
            }
            line.push('\n');
            line
        })
        .collect()
}

/// All entries in a journal, in file order.
///
/// Each entry runs from its H2 header to just before the newline that
/// precedes the next header, or to the end of the file for the last entry.
pub fn split_entries(journal: &str) -> Vec<&str> {
    let starts: Vec<usize> = ENTRY_START_RE.find_iter(journal).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = match starts.get(i + 1) {
                Some(&next) => next - 1,
                None => journal.len(),
            };
            &journal[start..end]
        })
        .collect()
}

/// A journal entry parsed back into its structured parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedEntry {
    pub timestamp: String,
    pub agent: String,
    pub task_id: String,
    pub decisions: Vec<String>,
    pub files: Vec<FileRef>,
    pub contracts: Vec<String>,
    pub next: Vec<String>,
}

/// Parse one rendered entry. Returns `None` when the header does not match
/// the digest-entry shape.
pub fn scrape_entry(entry: &str) -> Option<ScrapedEntry> {
    let first_line = entry.lines().next()?;
    let caps = HEADER_RE.captures(first_line)?;

    let mut scraped = ScrapedEntry {
        timestamp: caps["ts"].to_string(),
        agent: caps["agent"].to_string(),
        task_id: caps["task"].trim_end().to_string(),
        decisions: Vec::new(),
        files: Vec::new(),
        contracts: Vec::new(),
        next: Vec::new(),
    };

    let mut current: Option<&str> = None;
    for line in entry.lines().skip(1) {
        if let Some(name) = line.strip_prefix("**").and_then(|l| l.strip_suffix("**")) {
            current = match name {
                "Decisions" | "Files" | "Contracts Affected" | "Next Steps" => Some(name),
                _ => None,
            };
            continue;
        }
        let Some(bullet) = line.trim().strip_prefix("- ") else {
            continue;
        };
        if bullet == "n/a" {
            continue;
        }
        match current {
            Some("Decisions") => scraped.decisions.push(bullet.to_string()),
            Some("Files") => scraped.files.push(parse_file_line(bullet)),
            Some("Contracts Affected") => scraped.contracts.push(bullet.to_string()),
            Some("Next Steps") => scraped.next.push(bullet.to_string()),
            _ => {}
        }
    }
    Some(scraped)
}

fn parse_file_line(line: &str) -> FileRef {
    let (path, rest) = match line.split_once(" — ") {
        Some((p, r)) => (p, r),
        None => (line, ""),
    };
    let (reason, anchors) = match rest.split_once(" anchors=[") {
        Some((reason, anchors)) => (
            reason,
            anchors
                .trim_end_matches(']')
                .split(", ")
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        None => (rest, Vec::new()),
    };
    FileRef {
        path: path.to_string(),
        reason: reason.to_string(),
        anchors,
    }
}

#[cfg(test)]
#[path = "journal_entry_tests.rs"]
mod tests;
