// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PreCompact summary builder.
//!
//! Before the host compacts the conversation, distill the recent DIGEST
//! trail into a bounded snapshot that survives the context reset. Sources,
//! in order: the journal, the stdin payload, and finally local git signals
//! plus the feature map when no digest exists anywhere.

use std::path::Path;

use regex::Regex;
use scribe_adapters::git::{parse_porcelain, parse_recent_log, Git};
use scribe_codec::{extract_all_digests, scrape_entry, split_entries};
use scribe_core::{time_fmt, DebugLog, Digest, FileRef, HookEvent, Paths};
use scribe_storage::{Journal, WsiFile, WsiItem};
use serde::Serialize;
use serde_json::Value;

/// Most recent digests considered (`COMPACT_MAX_DIGESTS`).
const DEFAULT_MAX_DIGESTS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum CompactionError {
    #[error("failed to write summaries: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode summary: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct FileTouch {
    pub path: String,
    pub reason: String,
    pub anchors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompactionSummary {
    pub timestamp: String,
    pub agents_seen: Vec<String>,
    pub decisions: Vec<String>,
    pub open_questions: Vec<String>,
    pub owned_artifacts: Vec<String>,
    pub contracts_touched: Vec<String>,
    pub files_touched: Vec<FileTouch>,
    pub risks: Vec<String>,
    pub next_steps: Vec<String>,
    pub wsi_snapshot: Vec<WsiItem>,
}

pub async fn run_precompact(paths: &Paths, event: &HookEvent) -> Result<(), CompactionError> {
    let debug = DebugLog::for_hook(paths, "precompact_hook");
    let journal = Journal::new(paths);
    let notes_text = journal.read();
    let wsi = WsiFile::new(&paths.wsi_path, Paths::wsi_cap()).load();

    let max_digests = scribe_core::envcfg::env_parse("COMPACT_MAX_DIGESTS", DEFAULT_MAX_DIGESTS);

    let mut digests = digests_from_journal(&notes_text, max_digests);
    if digests.is_empty() {
        digests = digests_from_payload(event, max_digests);
    }
    if digests.is_empty() {
        if let Some(synthetic) = synthesize_from_git(&paths.project_root).await {
            digests.push(synthetic);
        }
    }
    debug.line(format!("compaction sources: {} digest(s)", digests.len()));

    let summary = build_summary(&digests, &notes_text, &wsi.items);
    std::fs::create_dir_all(&paths.logs_dir)?;

    let mut json = serde_json::to_string_pretty(&summary)?;
    json.push('\n');
    std::fs::write(paths.compaction_json_path(), json)?;
    std::fs::write(paths.compaction_md_path(), render_markdown(&summary))?;
    Ok(())
}

/// The last `max` journal entries, parsed back into digests.
fn digests_from_journal(notes_text: &str, max: usize) -> Vec<Digest> {
    let entries = split_entries(notes_text);
    let start = entries.len().saturating_sub(max);
    entries[start..]
        .iter()
        .filter_map(|entry| scrape_entry(entry))
        .map(|scraped| {
            let mut digest = Digest::new(scraped.agent, scraped.task_id);
            digest.decisions = scraped.decisions;
            digest.files = scraped.files;
            digest.contracts = scraped.contracts;
            digest.next = scraped.next;
            digest
        })
        .collect()
}

/// DIGEST fences carried in the payload: flat text fields first, then any
/// messages array.
fn digests_from_payload(event: &HookEvent, max: usize) -> Vec<Digest> {
    let mut digests = Vec::new();
    if let Some(text) = event.inline_text() {
        digests.extend(extract_all_digests(text));
    }
    if let Some(Value::Array(messages)) = &event.messages {
        for message in messages {
            for key in ["text", "content", "message", "assistant_text"] {
                if let Some(text) = message.get(key).and_then(Value::as_str) {
                    digests.extend(extract_all_digests(text));
                }
            }
        }
    }
    let start = digests.len().saturating_sub(max);
    digests.split_off(start)
}

/// Fallback digest from uncommitted changes, recent commits, and the
/// feature map.
async fn synthesize_from_git(project_root: &Path) -> Option<Digest> {
    let git = Git;
    let porcelain = match git.status_porcelain(project_root).await {
        Ok(text) => parse_porcelain(&text),
        Err(_) => Default::default(),
    };

    let (mut modified, mut added) = (porcelain.modified, porcelain.added);
    let mut subjects = Vec::new();
    if modified.is_empty() && added.is_empty() {
        if let Ok(log_text) = git.recent_commits(project_root).await {
            let log = parse_recent_log(&log_text);
            subjects = log.subjects;
            modified = log.modified;
            added = log.added;
        }
    }

    let features = feature_map_entries(project_root);
    if modified.is_empty() && added.is_empty() && features.is_empty() {
        return None;
    }

    let mut digest = Digest::new("Main Agent (Direct Work)", "direct-work");
    digest.decisions = if !features.is_empty() {
        features.into_iter().take(8).collect()
    } else if !subjects.is_empty() {
        subjects.into_iter().take(3).collect()
    } else {
        vec!["Configuration and hook updates".to_string()]
    };
    for path in modified.into_iter().take(10) {
        digest.files.push(FileRef::new(path, "modified"));
    }
    for path in added.into_iter().take(10) {
        digest.files.push(FileRef::new(path, "created"));
    }
    Some(digest)
}

/// Active features from FEATURE_MAP.md, if present.
fn feature_map_entries(project_root: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(project_root.join("FEATURE_MAP.md")) else {
        return Vec::new();
    };
    let mut features = Vec::new();
    let mut in_active = false;
    for line in content.lines() {
        if line.starts_with("##") {
            in_active = line.contains("Active Features");
            continue;
        }
        if in_active && line.trim_start().starts_with('|') && line.contains("✅ Active") {
            let cells: Vec<&str> = line.split('|').map(str::trim).filter(|c| !c.is_empty()).collect();
            if let Some(first) = cells.first() {
                let feature = first.replace("**", "").trim().to_string();
                if !feature.is_empty() && feature != "Feature" {
                    features.push(feature);
                }
            }
        }
    }
    features
}

pub fn build_summary(
    digests: &[Digest],
    notes_text: &str,
    wsi_items: &[WsiItem],
) -> CompactionSummary {
    let mut agents_seen = Vec::new();
    let mut decisions = Vec::new();
    let mut next_steps = Vec::new();
    let mut contracts = Vec::new();
    let mut owned_artifacts = Vec::new();
    let mut files_touched = Vec::new();

    for digest in digests {
        if !agents_seen.contains(&digest.agent) {
            agents_seen.push(digest.agent.clone());
        }
        decisions.extend(digest.decisions.iter().cloned());
        next_steps.extend(digest.next.iter().cloned());
        contracts.extend(digest.contracts.iter().cloned());
        for file in &digest.files {
            owned_artifacts.push(file.path.clone());
            files_touched.push(FileTouch {
                path: file.path.clone(),
                reason: file.reason.clone(),
                anchors: file.anchors.clone(),
            });
        }
    }
    agents_seen.sort();

    CompactionSummary {
        timestamp: time_fmt::stamp_now(),
        agents_seen,
        decisions: dedupe(decisions),
        open_questions: scrape_section(notes_text, "Open Questions"),
        owned_artifacts: dedupe(owned_artifacts),
        contracts_touched: dedupe(contracts),
        files_touched,
        risks: first_nonempty([
            scrape_section(notes_text, "Risks"),
            scrape_section(notes_text, "Risks / Assumptions"),
            scrape_section(notes_text, "Risk/Assumptions"),
        ]),
        next_steps: dedupe(next_steps),
        wsi_snapshot: wsi_items.to_vec(),
    }
}

/// Dedupe preserving first-seen order.
fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

fn first_nonempty<const N: usize>(candidates: [Vec<String>; N]) -> Vec<String> {
    candidates.into_iter().find(|c| !c.is_empty()).unwrap_or_default()
}

/// Bulleted lines of an `## <title>` section in the journal.
pub fn scrape_section(notes_text: &str, title: &str) -> Vec<String> {
    let pattern = format!(r"(?ims)^##\s*{}\s*\n(.*?)(?:\n## |\z)", regex::escape(title));
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    let Some(captures) = re.captures(notes_text) else {
        return Vec::new();
    };
    captures
        .get(1)
        .map(|body| {
            body.as_str()
                .lines()
                .map(|l| l.trim().trim_start_matches(['-', '*', ' ']).trim().to_string())
                .filter(|l| !l.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub fn render_markdown(summary: &CompactionSummary) -> String {
    let mut md = format!("# Compaction Summary — {}\n\n", summary.timestamp);

    md.push_str("## Executive Summary\n");
    md.push_str(&format!(
        "- Agents active: {}\n",
        if summary.agents_seen.is_empty() {
            "none".to_string()
        } else {
            summary.agents_seen.join(", ")
        }
    ));
    md.push_str(&format!("- Files modified: {}\n", summary.owned_artifacts.len()));
    md.push_str(&format!(
        "- Contracts affected: {}\n",
        summary.contracts_touched.len()
    ));
    md.push_str(&format!("- Open questions: {}\n\n", summary.open_questions.len()));

    section(&mut md, "## Key Decisions (retain for context)\n", &summary.decisions[..summary.decisions.len().min(5)], |d| format!("- {d}\n"));
    section(&mut md, "## Next Steps (actionable)\n", &summary.next_steps, |n| format!("- [ ] {n}\n"));
    section(
        &mut md,
        "## Critical Paths (for JIT retrieval)\n",
        &summary.owned_artifacts[..summary.owned_artifacts.len().min(10)],
        |p| format!("- `{p}`\n"),
    );
    section(&mut md, "## Contracts Touched (verify stability)\n", &summary.contracts_touched, |c| format!("- {c}\n"));
    section(&mut md, "## Open Questions (needs resolution)\n", &summary.open_questions, |q| format!("- ❓ {q}\n"));
    section(&mut md, "## Risks / Assumptions\n", &summary.risks, |r| format!("- ⚠️ {r}\n"));

    md.push_str("<details>\n<summary>WSI Snapshot (expand if needed)</summary>\n\n");
    if summary.wsi_snapshot.is_empty() {
        md.push_str("- n/a\n");
    } else {
        for item in &summary.wsi_snapshot {
            md.push_str(&format!("- {} — {}\n", item.path, item.reason));
        }
    }
    md.push_str("</details>\n\n");
    md
}

fn section(md: &mut String, header: &str, items: &[String], line: impl Fn(&String) -> String) {
    md.push_str(header);
    if items.is_empty() {
        md.push_str("- n/a\n");
    } else {
        for item in items {
            md.push_str(&line(item));
        }
    }
    md.push('\n');
}

#[cfg(test)]
#[path = "compaction_tests.rs"]
mod tests;
