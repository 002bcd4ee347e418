// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stop coordinator.
//!
//! Runs on every turn end with a tight budget: find the newest DIGEST
//! (payload text first, then a bounded transcript tail, then a full parse),
//! append it to NOTES, refresh the WSI, and enqueue exactly one ingestion
//! job. Everything slow is deferred to the scheduled worker; the optional
//! inline drain is off by default.

use std::time::{Duration, Instant};

use scribe_adapters::VectorClient;
use scribe_codec::transcript::ScanConfig;
use scribe_codec::{extract_digest, scan_transcript};
use scribe_core::{envcfg, DebugLog, Digest, HookEvent, Paths, SystemClock, Clock};
use scribe_storage::{Journal, Queue, QueueConfig, WarningsLog, WsiFile};
use serde::Serialize;

use crate::worker::{self, DrainOptions, DrainSummary};

#[derive(Debug, Clone)]
pub struct StopConfig {
    pub scan: ScanConfig,
    /// Soft budget in milliseconds; 0 disables the early exit.
    pub time_budget_ms: u64,
    /// Drain a few jobs inline (`STOP_DRAIN_QUEUE`); off by default.
    pub drain_on_stop: bool,
    /// Spawn the detached project-status refresher after a capture.
    pub refresh_status: bool,
}

impl StopConfig {
    pub fn from_env() -> Self {
        Self {
            scan: ScanConfig::from_env(),
            time_budget_ms: envcfg::env_parse("STOP_TIME_BUDGET_MS", 0),
            drain_on_stop: envcfg::env_flag("STOP_DRAIN_QUEUE", false),
            refresh_status: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StopSummary {
    pub digest_found: bool,
    pub enqueued: Option<String>,
    pub drained: Option<DrainSummary>,
}

pub async fn run_stop(paths: &Paths, event: &HookEvent, config: &StopConfig) -> StopSummary {
    let debug = DebugLog::for_hook(paths, "stop_hook");
    debug.stamped("Stop hook triggered");
    let started = Instant::now();

    let journal = Journal::new(paths);
    let wsi = WsiFile::new(&paths.wsi_path, Paths::wsi_cap());
    if let Err(e) = paths.ensure_base_dirs() {
        debug.line(format!("failed to create state dirs: {e}"));
    }
    // Placeholders exist even when no DIGEST is captured this turn.
    if let Err(e) = journal.ensure() {
        debug.line(format!("failed to ensure journal: {e}"));
    }
    if let Err(e) = wsi.ensure() {
        debug.line(format!("failed to ensure WSI: {e}"));
    }

    let mut digest = event.inline_text().and_then(extract_digest);
    if digest.is_some() {
        debug.line("fast DIGEST path: found in payload text");
    }

    if digest.is_none() {
        if let Some(transcript_path) = event.transcript_path.as_deref() {
            digest = scan_transcript(transcript_path, &config.scan, &debug);
        }
    }

    if digest.is_none() && config.time_budget_ms > 0 {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if elapsed_ms >= config.time_budget_ms {
            debug.line(format!(
                "exiting early due to time budget ({elapsed_ms}ms >= {}ms)",
                config.time_budget_ms
            ));
            return StopSummary::default();
        }
    }

    let Some(digest) = digest else {
        debug.line("no DIGEST block found this turn");
        return StopSummary::default();
    };
    debug.line(format!(
        "DIGEST found: agent={}, task={}",
        digest.agent, digest.task_id
    ));

    let mut summary = StopSummary {
        digest_found: true,
        ..StopSummary::default()
    };

    if let Err(e) = journal.append_digest(&digest) {
        debug.line(format!("failed to append NOTES entry: {e}"));
        eprintln!("Stop hook: failed to write NOTES: {e}");
        return summary;
    }
    if let Err(e) = wsi.refresh(&digest, &[]) {
        debug.line(format!("failed to refresh WSI: {e}"));
    }

    summary.enqueued = enqueue(paths, &digest, &debug);

    let vector_enabled = envcfg::env_flag("ENABLE_VECTOR_RAG", false);
    if !vector_enabled {
        note_setup_needed(paths, &debug);
    }

    if config.drain_on_stop {
        let queue = Queue::new(&paths.queue_dir, &paths.dead_dir, QueueConfig::from_env());
        let client = VectorClient::from_env();
        let warnings = WarningsLog::new(paths.warnings_path());
        let drained = worker::drain(
            &queue,
            &client,
            &warnings,
            &debug,
            DrainOptions {
                max_jobs: 3,
                budget: Duration::from_secs(5),
                vector_enabled,
            },
        )
        .await;
        summary.drained = Some(drained);
    } else {
        debug.line("queue processing deferred to the scheduled worker");
    }

    if config.refresh_status {
        spawn_status_refresh(paths, &debug);
    }
    spawn_followers(event, &debug);
    summary
}

/// Optional detached followers: an implementation validator, and a PM
/// decision child fed the tail of the assistant's last message. Both are
/// disabled unless their command is configured.
fn spawn_followers(event: &HookEvent, debug: &DebugLog) {
    if let Some(cmd) = envcfg::env_str("STOP_VALIDATOR_CMD") {
        spawn_detached(&cmd, None, debug);
    }
    if let Some(cmd) = envcfg::env_str("STOP_PM_CMD") {
        let tail = event.inline_text().map(|text| {
            let start = text.len().saturating_sub(1000);
            let mut at = start;
            while !text.is_char_boundary(at) {
                at += 1;
            }
            text[at..].to_string()
        });
        spawn_detached(&cmd, tail, debug);
    }
}

fn spawn_detached(command: &str, stdin_text: Option<String>, debug: &DebugLog) {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else { return };
    let mut cmd = std::process::Command::new(program);
    cmd.args(parts)
        .stdin(if stdin_text.is_some() {
            std::process::Stdio::piped()
        } else {
            std::process::Stdio::null()
        })
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());
    match cmd.spawn() {
        Ok(mut child) => {
            if let (Some(text), Some(mut stdin)) = (stdin_text, child.stdin.take()) {
                use std::io::Write;
                let _ = stdin.write_all(text.as_bytes());
            }
            debug.line(format!("spawned detached follower: {program}"));
        }
        Err(e) => debug.line(format!("failed to spawn {program}: {e}")),
    }
}

fn enqueue(paths: &Paths, digest: &Digest, debug: &DebugLog) -> Option<String> {
    let queue = Queue::new(&paths.queue_dir, &paths.dead_dir, QueueConfig::from_env());
    match queue.enqueue(digest, &paths.project_root, SystemClock.epoch_ms()) {
        Ok(path) => {
            let name = path.file_name()?.to_string_lossy().to_string();
            debug.line(format!("enqueued ingest job: {name}"));
            Some(name)
        }
        Err(e) => {
            debug.line(format!("failed to enqueue ingest job: {e}"));
            None
        }
    }
}

/// One-time setup notice when vector ingestion is not enabled.
fn note_setup_needed(paths: &Paths, debug: &DebugLog) {
    let marker = paths.setup_marker_path();
    if marker.exists() {
        return;
    }
    if std::fs::write(&marker, "Vector RAG setup needed - will auto-run on next interaction\n")
        .is_err()
    {
        return;
    }
    debug.line("vector ingestion disabled; queued DIGESTs await setup");
    WarningsLog::new(paths.warnings_path()).append(
        "Vector RAG is not configured. DIGESTs will be queued but not ingested until you set \
         environment variables: `DATABASE_URL_MEMORY`, `REDIS_URL`, `OPENAI_API_KEY`. Then run \
         `scribe stop --process-queue`.",
    );
}

/// Fire-and-forget `scribe status --update --fast-local`, honoring the
/// opt-out and global-root protections.
fn spawn_status_refresh(paths: &Paths, debug: &DebugLog) {
    if envcfg::env_flag("DISABLE_CLAUDE_MD_UPDATE", false) {
        debug.line("skipped status update (env opt-out)");
        return;
    }
    let home = dirs::home_dir();
    if paths.is_global_root(home.as_deref())
        && !envcfg::env_flag("ALLOW_GLOBAL_CLAUDE_MD_UPDATE", false)
    {
        debug.line("skipped status update (global root protected)");
        return;
    }
    let Ok(exe) = std::env::current_exe() else {
        return;
    };
    let spawned = std::process::Command::new(exe)
        .args(["status", "--update", "--fast-local"])
        .env("CLAUDE_PROJECT_DIR", &paths.project_root)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn();
    match spawned {
        Ok(_) => debug.line("triggered project status update (fast-local)"),
        Err(e) => debug.line(format!("failed to trigger status update: {e}")),
    }
}

#[cfg(test)]
#[path = "stop_tests.rs"]
mod tests;
