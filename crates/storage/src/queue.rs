// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable ingestion queue: one JSON file per job.
//!
//! The queue directory holds live jobs; terminal failures move to the dead
//! directory by atomic rename. Jobs are immutable except for whole-file
//! rewrites during a drain attempt, so overlapping drains can duplicate
//! work but never corrupt state.

use std::path::{Path, PathBuf};

use scribe_core::envcfg;
use scribe_core::{ingest_job_id, retry_suffix, time_fmt, Digest, QualityGate};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue io: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt job file: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error(transparent)]
    Rejected(#[from] QualityGate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Dead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub digest: Digest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestJob {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub project_root: PathBuf,
    pub enqueued_at: String,
    pub attempt_count: u32,
    pub last_attempt: Option<String>,
    pub last_error: Option<String>,
    pub status: JobStatus,
    pub payload: JobPayload,
}

#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    pub max_attempts: u32,
    pub backoff_base: f64,
    pub backoff_cap: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            backoff_base: 5.0,
            backoff_cap: 900.0,
        }
    }
}

impl QueueConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_attempts: envcfg::env_parse("INGEST_MAX_ATTEMPTS", default.max_attempts),
            backoff_base: envcfg::env_parse("INGEST_BACKOFF_BASE", default.backoff_base),
            backoff_cap: envcfg::env_parse("INGEST_BACKOFF_CAP", default.backoff_cap),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeadJobError {
    pub job: String,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub last_attempt: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub queued: usize,
    pub dead: usize,
    pub recent_dead_errors: Vec<DeadJobError>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RetryReport {
    pub moved: usize,
    pub errors: usize,
    pub queued: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Queue {
    dir: PathBuf,
    dead_dir: PathBuf,
    config: QueueConfig,
}

impl Queue {
    pub fn new(dir: impl Into<PathBuf>, dead_dir: impl Into<PathBuf>, config: QueueConfig) -> Self {
        Self {
            dir: dir.into(),
            dead_dir: dead_dir.into(),
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dead_dir(&self) -> &Path {
        &self.dead_dir
    }

    /// Enqueue one digest. The quality gates run here: a digest the vector
    /// service would reject never reaches the queue.
    pub fn enqueue(
        &self,
        digest: &Digest,
        project_root: &Path,
        epoch_ms: u64,
    ) -> Result<PathBuf, QueueError> {
        scribe_codec::render_ingest_text(digest)?;

        let job = IngestJob {
            id: ingest_job_id(epoch_ms),
            kind: "digest".to_string(),
            project_root: project_root.to_path_buf(),
            enqueued_at: time_fmt::iso_now(),
            attempt_count: 0,
            last_attempt: None,
            last_error: None,
            status: JobStatus::Queued,
            payload: JobPayload {
                digest: digest.clone(),
            },
        };

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.json", job.id));
        write_job(&path, &job)?;
        Ok(path)
    }

    /// Live job files sorted by mtime ascending.
    pub fn jobs_by_mtime(&self) -> Vec<PathBuf> {
        list_by_mtime(&self.dir)
    }

    /// Dead job files sorted by mtime ascending.
    pub fn dead_by_mtime(&self) -> Vec<PathBuf> {
        list_by_mtime(&self.dead_dir)
    }

    pub fn queued_count(&self) -> usize {
        self.jobs_by_mtime().len()
    }

    pub fn read_job(&self, path: &Path) -> Result<IngestJob, QueueError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn persist(&self, path: &Path, job: &IngestJob) -> Result<(), QueueError> {
        write_job(path, job)
    }

    pub fn remove(&self, path: &Path) {
        let _ = std::fs::remove_file(path);
    }

    /// Move a job into the dead directory by rename; on rename failure the
    /// job is marked dead in place.
    pub fn move_to_dead(&self, path: &Path, job: &mut IngestJob) -> Result<(), QueueError> {
        std::fs::create_dir_all(&self.dead_dir)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.json", job.id));
        job.status = JobStatus::Dead;
        write_job(path, job)?;
        // Rename is atomic; on failure the job stays in place, already
        // marked dead.
        let dead_path = self.dead_dir.join(file_name);
        let _ = std::fs::rename(path, &dead_path);
        Ok(())
    }

    /// Backoff before the next attempt, in seconds. Exponential in the
    /// attempt count with a deterministic ±12.5% jitter derived from the
    /// job id, clamped to `[base, cap]`. Zero attempts need no backoff.
    pub fn backoff_secs(&self, job: &IngestJob) -> f64 {
        let attempts = job.attempt_count;
        if attempts == 0 {
            return 0.0;
        }
        let base = self.config.backoff_base;
        let expo = base * 2f64.powi(attempts as i32 - 1);
        let jitter = expo * 0.25 * (jitter_fraction(&job.id, attempts) - 0.5);
        (expo + jitter).clamp(base, self.config.backoff_cap)
    }

    /// Whether enough time has passed since the last attempt.
    pub fn backoff_elapsed(&self, job: &IngestJob) -> bool {
        let Some(last) = job.last_attempt.as_deref() else {
            return true;
        };
        match time_fmt::secs_since(last) {
            Some(elapsed) => elapsed >= self.backoff_secs(job),
            None => true,
        }
    }

    /// Move dead jobs back into the live queue with reset metadata.
    pub fn retry_dead(&self, limit: Option<usize>) -> RetryReport {
        let mut report = RetryReport::default();
        for path in self.dead_by_mtime() {
            if limit.is_some_and(|l| report.moved >= l) {
                break;
            }
            let mut job = match self.read_job(&path) {
                Ok(job) => job,
                Err(_) => {
                    report.errors += 1;
                    continue;
                }
            };

            job.status = JobStatus::Queued;
            job.attempt_count = 0;
            job.last_error = None;
            job.last_attempt = None;
            job.enqueued_at = time_fmt::iso_now();

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("{}.json", job.id));
            let mut dest = self.dir.join(&name);
            if dest.exists() {
                let stem = name.trim_end_matches(".json");
                dest = self.dir.join(format!("{stem}-retry-{}.json", retry_suffix()));
            }

            if std::fs::create_dir_all(&self.dir).is_err() || write_job(&dest, &job).is_err() {
                report.errors += 1;
                continue;
            }
            let _ = std::fs::remove_file(&path);
            report.moved += 1;
            report
                .queued
                .push(dest.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default());
        }
        report
    }

    /// Counts plus the most recent dead errors, newest first.
    pub fn status(&self, recent: usize) -> QueueStatus {
        let queued = self.queued_count();
        let dead_files = self.dead_by_mtime();
        let recent_dead_errors = dead_files
            .iter()
            .rev()
            .take(recent)
            .filter_map(|path| {
                let job = self.read_job(path).ok()?;
                Some(DeadJobError {
                    job: path.file_name()?.to_string_lossy().to_string(),
                    attempts: job.attempt_count,
                    last_error: job.last_error,
                    last_attempt: job.last_attempt,
                })
            })
            .collect();
        QueueStatus {
            queued,
            dead: dead_files.len(),
            recent_dead_errors,
        }
    }
}

fn write_job(path: &Path, job: &IngestJob) -> Result<(), QueueError> {
    let mut text = serde_json::to_string_pretty(job)?;
    text.push('\n');
    std::fs::write(path, text)?;
    Ok(())
}

fn list_by_mtime(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<(std::time::SystemTime, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|p| {
            let mtime = std::fs::metadata(&p).and_then(|m| m.modified()).ok()?;
            Some((mtime, p))
        })
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    files.into_iter().map(|(_, p)| p).collect()
}

/// Deterministic pseudo-jitter in `[0, 1)` from the job id and attempt.
fn jitter_fraction(id: &str, attempts: u32) -> f64 {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(attempts.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
