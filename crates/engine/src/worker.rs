// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue worker: drive queued ingestion jobs to the vector service.
//!
//! Runs out-of-band on a timer, or briefly at Stop time when enabled. One
//! pass walks the queue in mtime order under a wall-clock budget, honours
//! per-job backoff, and quarantines poison jobs in the dead directory.

use std::time::{Duration, Instant};

use scribe_adapters::vector::{is_retryable_error, IngestOutcome, MemoryService};
use scribe_core::{time_fmt, DebugLog};
use scribe_storage::{Queue, WarningsLog};
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct DrainOptions {
    pub max_jobs: usize,
    pub budget: Duration,
    /// `ENABLE_VECTOR_RAG`; when off the drain is a no-op with a notice.
    pub vector_enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_backoff: usize,
    pub skipped_no_creds: usize,
}

pub async fn drain(
    queue: &Queue,
    service: &dyn MemoryService,
    warnings: &WarningsLog,
    debug: &DebugLog,
    options: DrainOptions,
) -> DrainSummary {
    let mut summary = DrainSummary::default();

    if !options.vector_enabled {
        debug.line("skipping queue processing; ENABLE_VECTOR_RAG=false");
        warnings.append(
            "Vector ingestion is disabled (`ENABLE_VECTOR_RAG=false`). DIGESTs are being queued in `.claude/ingest-queue` and will ingest once enabled.",
        );
        return summary;
    }

    let started = Instant::now();
    let mut creds_warned = false;

    for path in queue.jobs_by_mtime() {
        if summary.processed >= options.max_jobs || started.elapsed() > options.budget {
            break;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut job = match queue.read_job(&path) {
            Ok(job) => job,
            Err(e) => {
                queue.remove(&path);
                debug.line(format!("removed corrupt job {name}: {e}"));
                continue;
            }
        };

        if !queue.backoff_elapsed(&job) {
            summary.skipped_backoff += 1;
            continue;
        }

        summary.processed += 1;
        job.last_attempt = Some(time_fmt::iso_now());
        job.attempt_count += 1;

        let outcome = service.ingest(&job.payload.digest, &job.project_root).await;
        match outcome {
            IngestOutcome::Ingested { note } => {
                summary.succeeded += 1;
                queue.remove(&path);
                match note {
                    Some(note) => debug.line(format!("ingested job {name} ({note})")),
                    None => debug.line(format!("ingested and removed job {name}")),
                }
            }
            IngestOutcome::Skipped(message) if message.contains("not configured") => {
                summary.skipped_no_creds += 1;
                // Not a real failure: undo the attempt accounting.
                job.attempt_count -= 1;
                job.last_error = Some(message.clone());
                let _ = queue.persist(&path, &job);
                debug.line(format!("skipped job {name} (missing credentials)"));
                if !creds_warned {
                    creds_warned = true;
                    warnings.append(
                        "Vector RAG credentials are missing. Set `DATABASE_URL_MEMORY`, `REDIS_URL`, and `OPENAI_API_KEY`, then run `scribe stop --process-queue` to ingest queued DIGESTs.",
                    );
                }
            }
            IngestOutcome::Failed(message) if is_retryable_error(&message) => {
                job.attempt_count -= 1;
                job.last_error = Some(message.clone());
                let _ = queue.persist(&path, &job);
                debug.line(format!("retryable ingest error for {name}: {message}"));
            }
            IngestOutcome::Skipped(message) | IngestOutcome::Failed(message) => {
                summary.failed += 1;
                job.last_error = Some(message.clone());
                if job.attempt_count >= queue.config().max_attempts {
                    let _ = queue.move_to_dead(&path, &mut job);
                    debug.line(format!(
                        "moved job to dead: {name} (attempts={})",
                        job.attempt_count
                    ));
                } else {
                    let _ = queue.persist(&path, &job);
                    debug.line(format!(
                        "re-queued job {name}: {message} (attempts={})",
                        job.attempt_count
                    ));
                }
            }
        }
    }

    tracing::debug!(?summary, "queue drain pass finished");
    debug.line(format!(
        "queue summary: processed={}, succeeded={}, failed={}, skipped_backoff={}, skipped_no_creds={}",
        summary.processed,
        summary.succeeded,
        summary.failed,
        summary.skipped_backoff,
        summary.skipped_no_creds
    ));
    summary
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
