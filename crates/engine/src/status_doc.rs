// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project status synthesiser.
//!
//! Regenerates the `<project_status>` block inside the project's CLAUDE.md
//! from the vector memory service when it is fresh, falling back to the
//! journal tail and the WSI. Writes are idempotent: when nothing but the
//! timestamp would change, the file is left untouched.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use scribe_adapters::vector::MemoryService;
use scribe_core::{envcfg, time_fmt, Paths};
use scribe_storage::{Journal, Queue, QueueConfig, WarningsLog, WsiFile};
use serde::Serialize;
use serde_json::{json, Value};

pub const TAG_START: &str = "<project_status>";
pub const TAG_END: &str = "</project_status>";
const ANCHOR: &str = "</context_engineering>";

const LINE_LIMIT: usize = 85;

#[allow(clippy::expect_used)]
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<project_status>.*?</project_status>\n?")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static STAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Last Update: [^|]* \|").expect("constant regex pattern is valid")
});

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub project: String,
    pub updated_at: String,
    pub data_state: String,
    pub queue: usize,
    pub mode: String,
    pub summary: String,
    pub done: Vec<String>,
    pub next: Vec<String>,
    pub decisions: Vec<String>,
    pub risks: Vec<String>,
    pub components: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub ok: bool,
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusSnapshot>,
}

impl StatusReport {
    fn skipped(reason: &str) -> Self {
        Self {
            ok: true,
            updated: false,
            skipped: Some(reason.to_string()),
            error: None,
            status: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            ok: false,
            updated: false,
            skipped: None,
            error: Some(error),
            status: None,
        }
    }
}

/// Update the `<project_status>` block in CLAUDE.md. `service` is consulted
/// only when vector mode is possible; `use_vector=false` is the fast-local
/// path spawned from the Stop hook.
pub async fn update_status_doc(
    paths: &Paths,
    service: Option<&dyn MemoryService>,
    use_vector: bool,
) -> StatusReport {
    if envcfg::env_flag("DISABLE_CLAUDE_MD_UPDATE", false) {
        return StatusReport::skipped("env:DISABLE_CLAUDE_MD_UPDATE");
    }
    if paths.is_global_root(dirs::home_dir().as_deref())
        && !envcfg::env_flag("ALLOW_GLOBAL_CLAUDE_MD_UPDATE", false)
    {
        return StatusReport::skipped("global_root_protected");
    }

    let doc_path = paths.status_doc_path();
    let Ok(before) = std::fs::read_to_string(&doc_path) else {
        return StatusReport::failed(format!("CLAUDE.md not found at {}", doc_path.display()));
    };

    let snapshot = collect_status(paths, service, use_vector).await;
    let block = render_block(&snapshot);
    let after = insert_or_replace(&before, &block);

    // Idempotent: ignore the volatile timestamp when deciding to write.
    let changed = STAMP_RE.replace_all(&after, "Last Update: - |")
        != STAMP_RE.replace_all(&before, "Last Update: - |");
    if changed {
        if let Err(e) = std::fs::write(&doc_path, &after) {
            return StatusReport::failed(format!("failed to write {}: {e}", doc_path.display()));
        }
    }

    write_health(paths, &snapshot, changed);
    StatusReport {
        ok: true,
        updated: changed,
        skipped: None,
        error: None,
        status: Some(snapshot),
    }
}

async fn collect_status(
    paths: &Paths,
    service: Option<&dyn MemoryService>,
    use_vector: bool,
) -> StatusSnapshot {
    let queue = Queue::new(&paths.queue_dir, &paths.dead_dir, QueueConfig::from_env());
    let queued = queue.queued_count();

    let vector_enabled = use_vector
        && envcfg::env_flag("ENABLE_VECTOR_RAG", false)
        && queued == 0
        && service.is_some();

    // Local fallbacks from the journal tail and the WSI.
    let journal = Journal::new(paths);
    let entries = journal.entries();
    let tail_start = entries.len().saturating_sub(3);
    let mut fallback_decisions = Vec::new();
    let mut fallback_components = Vec::new();
    for entry in &entries[tail_start..] {
        if let Some(scraped) = scribe_codec::scrape_entry(entry) {
            fallback_decisions.extend(scraped.decisions.iter().map(|d| compact_line(d)));
            fallback_components.extend(scraped.files.iter().map(|f| basename(&f.path)));
        }
    }
    fallback_decisions.truncate(3);

    let wsi = WsiFile::new(&paths.wsi_path, Paths::wsi_cap()).load();
    let wsi_components: Vec<String> = wsi
        .items
        .iter()
        .map(|i| basename(&i.path))
        .filter(|c| !c.is_empty())
        .collect();

    let mut active_components = fallback_components.clone();
    active_components.extend(wsi_components.iter().take(5).cloned());
    let active_components = dedupe_cap(active_components, 8);

    let (hot_components, hot_focus) = hot_focus(&wsi.items);

    let warnings_text = WarningsLog::new(paths.warnings_path()).read();
    let creds_warning = creds_warning_present(&warnings_text);

    // Vector-derived bullets, ranked; empty in local mode.
    let mut decisions = Vec::new();
    let mut risks = Vec::new();
    let mut next = Vec::new();
    if vector_enabled {
        if let Some(service) = service {
            decisions = ranked_lines(
                service
                    .search(
                        &paths.project_root,
                        "project status decisions recent",
                        6,
                        false,
                        Some(json!({
                            "type": ["decision", "status", "incident"],
                            "stage": ["implemented", "validated"],
                        })),
                    )
                    .await
                    .unwrap_or_default(),
                score_decision,
                &active_components,
                &hot_components,
            );
            risks = ranked_lines(
                service
                    .search(
                        &paths.project_root,
                        "risk blocker incident regression",
                        6,
                        false,
                        Some(json!({
                            "problem_type": ["timeout", "build", "security", "infra"],
                        })),
                    )
                    .await
                    .unwrap_or_default(),
                score_risk,
                &active_components,
                &hot_components,
            );
            let next_hits = service
                .search(&paths.project_root, "milestone next plan", 6, false, None)
                .await
                .unwrap_or_default();
            next = next_steps_from_hits(&next_hits, &active_components, &hot_components);
        }
    }
    if decisions.is_empty() {
        decisions = fallback_decisions;
    }

    let data_state = if vector_enabled && !creds_warning && queued == 0 {
        "fresh"
    } else {
        "stale"
    };
    let phase = infer_phase(&decisions, &risks, &next, data_state, queued, vector_enabled);
    let summary = match &hot_focus {
        Some(focus) => {
            format!("Phase: {phase} — Focus: {focus} — Status snapshot from vector digests + local logs")
        }
        None => format!("Phase: {phase} — Status snapshot from vector digests + local logs"),
    };

    StatusSnapshot {
        project: basename_of_path(&paths.project_root),
        updated_at: time_fmt::stamp_now(),
        data_state: data_state.to_string(),
        queue: queued,
        mode: if vector_enabled { "vector" } else { "local" }.to_string(),
        summary,
        done: decisions.first().cloned().into_iter().collect(),
        next: next.first().cloned().into_iter().collect(),
        decisions,
        risks,
        components: active_components.into_iter().take(5).collect(),
    }
}

pub fn render_block(status: &StatusSnapshot) -> String {
    let mut lines = vec![
        TAG_START.to_string(),
        format!(
            "Project: {} | Last Update: {} | Data: {} (queue={})",
            status.project, status.updated_at, status.data_state, status.queue
        ),
        "Summary:".to_string(),
        format!("- {}", compact_line(&status.summary)),
    ];

    lines.push("Milestones:".to_string());
    if let Some(done) = status.done.first() {
        lines.push(format!("- Done: {}", compact_line(done)));
    }
    if let Some(next) = status.next.first() {
        lines.push(format!("- Next: {}", compact_line(next)));
    }

    if !status.decisions.is_empty() {
        lines.push("Decisions (recent):".to_string());
        for decision in status.decisions.iter().take(3) {
            lines.push(format!("- {}", compact_line(decision)));
        }
    }
    if !status.risks.is_empty() {
        lines.push("Risks/Blockers:".to_string());
        for risk in status.risks.iter().take(3) {
            lines.push(format!("- {}", compact_line(risk)));
        }
    }
    if !status.components.is_empty() {
        lines.push("Activity Snapshot:".to_string());
        lines.push(format!("- Components: {}", status.components.join(", ")));
    }

    lines.push(TAG_END.to_string());
    lines.join("\n") + "\n"
}

/// Replace any existing block; insert after the anchor tag when present,
/// else prepend.
pub fn insert_or_replace(doc: &str, block: &str) -> String {
    let cleaned = BLOCK_RE.replace_all(doc, "").to_string();
    if let Some(idx) = cleaned.find(ANCHOR) {
        let at = idx + ANCHOR.len();
        format!("{}\n\n{}\n{}", &cleaned[..at], block, &cleaned[at..])
    } else {
        format!("{block}\n{cleaned}")
    }
}

fn write_health(paths: &Paths, status: &StatusSnapshot, updated: bool) {
    let health = json!({
        "updated_at": status.updated_at,
        "mode": status.mode,
        "updated": updated,
        "queue": status.queue,
        "data_state": status.data_state,
    });
    if let Ok(mut text) = serde_json::to_string_pretty(&health) {
        text.push('\n');
        let _ = std::fs::write(paths.status_health_path(), text);
    }
}

// --- ranking -------------------------------------------------------------

fn hit_meta(hit: &Value) -> &Value {
    hit.get("meta").unwrap_or(&Value::Null)
}

fn hit_text(hit: &Value) -> &str {
    hit.get("text")
        .or_else(|| hit.get("snippet"))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn hit_age_days(hit: &Value) -> f64 {
    let updated_at = hit
        .get("updated_at")
        .and_then(Value::as_str)
        .or_else(|| hit_meta(hit).get("updated_at").and_then(Value::as_str));
    let Some(ts) = updated_at else { return 0.0 };
    time_fmt::secs_since(ts).map(|s| (s / 86_400.0).max(0.0)).unwrap_or(0.0)
}

/// Exponential age decay, half-life about 14 days.
fn decay(age_days: f64) -> f64 {
    (-0.05 * age_days).exp()
}

fn score_decision(hit: &Value) -> f64 {
    let kind = hit_meta(hit)
        .get("type")
        .or_else(|| hit_meta(hit).get("category"))
        .and_then(Value::as_str)
        .unwrap_or("decision")
        .to_lowercase();
    let weight = match kind.as_str() {
        "decision" => 1.0,
        "incident" => 0.9,
        "status" => 0.8,
        _ => 0.7,
    };
    weight * decay(hit_age_days(hit))
}

fn score_risk(hit: &Value) -> f64 {
    let problem_type = hit_meta(hit)
        .get("problem_type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    let weight = match problem_type.as_str() {
        "security" => 1.0,
        "data" => 0.95,
        "infra" => 0.9,
        "regression" => 0.88,
        "build" => 0.8,
        "timeout" => 0.7,
        _ => 0.75,
    };
    weight * decay(hit_age_days(hit))
}

/// Boost hits that mention a hot (1.25) or active (1.15) component.
fn mention_bonus(hit: &Value, active: &[String], hot: &[String]) -> f64 {
    let mut blob = hit_text(hit).to_lowercase();
    if let Some(meta) = hit_meta(hit).as_object() {
        for value in meta.values() {
            if let Some(s) = value.as_str() {
                blob.push(' ');
                blob.push_str(&s.to_lowercase());
            }
        }
    }
    let mentions = |names: &[String]| {
        names
            .iter()
            .map(|n| n.trim().to_lowercase())
            .any(|n| n.len() >= 3 && blob.contains(&n))
    };
    if mentions(hot) {
        1.25
    } else if mentions(active) {
        1.15
    } else {
        1.0
    }
}

fn make_line(hit: &Value) -> String {
    let title = hit_meta(hit)
        .get("task_id")
        .and_then(Value::as_str)
        .or_else(|| hit.get("path").and_then(Value::as_str))
        .or_else(|| hit_meta(hit).get("category").and_then(Value::as_str))
        .unwrap_or("item");
    compact_line(&format!("{title}: {}", hit_text(hit)))
}

fn ranked_lines(
    mut hits: Vec<Value>,
    score: fn(&Value) -> f64,
    active: &[String],
    hot: &[String],
) -> Vec<String> {
    hits.sort_by(|a, b| {
        let ra = score(a) * mention_bonus(a, active, hot);
        let rb = score(b) * mention_bonus(b, active, hot);
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut seen = std::collections::HashSet::new();
    let mut lines = Vec::new();
    for hit in &hits {
        let line = make_line(hit);
        let key = line.split(':').next().unwrap_or_default().to_string();
        if seen.insert(key) {
            lines.push(line);
        }
        if lines.len() >= 3 {
            break;
        }
    }
    lines
}

fn next_steps_from_hits(hits: &[Value], active: &[String], hot: &[String]) -> Vec<String> {
    let mut ranked: Vec<(f64, &Value)> = hits
        .iter()
        .map(|h| (mention_bonus(h, active, hot), h))
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut steps = Vec::new();
    for (_, hit) in ranked {
        for step in extract_next_steps(hit_text(hit), 3) {
            if !steps.contains(&step) {
                steps.push(step);
            }
        }
        if steps.len() >= 3 {
            break;
        }
    }
    steps.truncate(3);
    steps
}

/// Pull bullet lines from a "Next:" / "Next Steps:" section of a text blob.
pub fn extract_next_steps(text: &str, limit: usize) -> Vec<String> {
    #[allow(clippy::expect_used)]
    static NEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)Next(?:\s*Steps)?\s*:\s*(.*)").expect("constant regex pattern is valid")
    });
    let mut out = Vec::new();
    if let Some(captures) = NEXT_RE.captures(text) {
        for line in captures[1].lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let cleaned = line.trim_start_matches(['-', '*', ' ']);
            let cleaned = cleaned
                .strip_prefix(|c: char| c.is_ascii_digit())
                .map(|r| r.trim_start_matches(['.', ' ']))
                .unwrap_or(cleaned);
            if !cleaned.is_empty() {
                out.push(compact_line(cleaned));
            }
            if out.len() >= limit {
                break;
            }
        }
    }
    out
}

// --- heuristics ----------------------------------------------------------

fn infer_phase(
    decisions: &[String],
    risks: &[String],
    next: &[String],
    data_state: &str,
    queued: usize,
    vector_enabled: bool,
) -> &'static str {
    let d = decisions.join(" \n ").to_lowercase();
    let r = risks.join(" \n ").to_lowercase();
    let n = next.join(" \n ").to_lowercase();

    if (!vector_enabled || data_state != "fresh")
        && (r.contains("credential") || r.contains("enable") || d.contains("setup") || n.contains("setup"))
    {
        return "Onboarding";
    }
    if queued > 0 || d.contains("ingest") || r.contains("ingest") {
        return "Stabilizing Vector RAG";
    }
    if ["migrate", "refactor", "schema", "design"].iter().any(|k| n.contains(k)) {
        return "Implementing";
    }
    if ["integrat", "wire", "router", "cohesion"].iter().any(|k| n.contains(k)) {
        return "Integrating";
    }
    if ["verify", "test", "canary", "readiness", "release"].iter().any(|k| n.contains(k)) {
        return "Verifying";
    }
    if ["security", "incident", "regression"].iter().any(|k| r.contains(k)) {
        return "Hardening";
    }
    "Executing"
}

/// Hot components from the last 20 WSI entries, plus a single focus when
/// one clearly dominates.
fn hot_focus(items: &[scribe_storage::WsiItem]) -> (Vec<String>, Option<String>) {
    let recent = &items[items.len().saturating_sub(20)..];
    let mut freq: Vec<(String, usize)> = Vec::new();
    let mut total = 0usize;
    for item in recent {
        let name = basename(&item.path);
        if name.is_empty() {
            continue;
        }
        total += 1;
        match freq.iter_mut().find(|(n, _)| *n == name) {
            Some((_, count)) => *count += 1,
            None => freq.push((name, 1)),
        }
    }
    freq.sort_by(|a, b| b.1.cmp(&a.1));

    let hot: Vec<String> = freq.iter().take(3).map(|(n, _)| n.clone()).collect();
    let focus = match freq.as_slice() {
        [] => None,
        [(top, top_count), rest @ ..] => {
            let runner_up = rest.first().map(|(_, c)| *c).unwrap_or(0);
            let dominates = *top_count >= 2
                && *top_count >= runner_up + 1
                && total > 0
                && (*top_count as f64 / total as f64) >= 0.34;
            dominates.then(|| top.clone())
        }
    };
    (hot, focus)
}

fn creds_warning_present(warnings_text: &str) -> bool {
    #[allow(clippy::expect_used)]
    static CREDS_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)Vector RAG .*not configured|ENABLE_VECTOR_RAG=false")
            .expect("constant regex pattern is valid")
    });
    CREDS_RE.is_match(warnings_text)
}

fn compact_line(text: &str) -> String {
    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > LINE_LIMIT {
        let truncated: String = collapsed.chars().take(LINE_LIMIT - 1).collect();
        format!("{truncated}…")
    } else {
        collapsed
    }
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn basename_of_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string())
}

fn dedupe_cap(items: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|i| !i.is_empty() && seen.insert(i.clone()))
        .take(cap)
        .collect()
}

#[cfg(test)]
#[path = "status_doc_tests.rs"]
mod tests;
