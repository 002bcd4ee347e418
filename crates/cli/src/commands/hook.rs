// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook subcommands: the dispatcher surface of the pipeline.
//!
//! Every hook fails open on internal errors (log, exit 0); only policy
//! gate verdicts and the typecheck block escalate to nonzero codes.

use std::time::Duration;

use clap::{Args, Subcommand};
use scribe_adapters::VectorClient;
use scribe_core::{envcfg, DebugLog, EnvelopeError, HookEvent, HookOutcome, Paths};
use scribe_engine::{
    compaction, gate, prompt, reminder, stop, validator, worker, DrainOptions, GateContext,
    StopConfig,
};
use scribe_storage::{Queue, QueueConfig, WarningsLog};
use serde_json::json;

use crate::output::print_json;
use super::launchd;

#[derive(Args)]
pub struct HookArgs {
    #[command(subcommand)]
    pub command: HookCommand,
}

#[derive(Subcommand)]
pub enum HookCommand {
    /// PreToolUse policy gate
    Pretool,
    /// PostToolUse validator (typecheck + digest reminder)
    Posttool,
    /// Stop coordinator; also hosts the queue operations
    Stop(StopArgs),
    /// PreCompact summary builder
    Precompact,
    /// UserPromptSubmit markdown-request detector
    Prompt,
}

#[derive(Args, Default)]
pub struct StopArgs {
    /// Drain up to 999 queued jobs with a 30 s budget and print a summary
    #[arg(long = "process-queue", short = 'q')]
    pub process_queue: bool,
    /// Print queue/dead counts and the last 5 dead errors
    #[arg(long = "queue-status", short = 's')]
    pub queue_status: bool,
    /// Move up to N dead jobs back to queued (all when N is omitted)
    #[arg(long = "retry-dead", short = 'r', value_name = "N", num_args = 0..=1)]
    pub retry_dead: Option<Option<usize>>,
    /// Write a launchd unit that processes the queue every SEC seconds
    #[arg(long = "emit-launchd-plist", short = 'L', value_name = "SEC", num_args = 0..=1)]
    pub emit_launchd: Option<Option<u64>>,
    /// Unload and remove the launchd unit
    #[arg(long = "uninstall-launchd", short = 'U')]
    pub uninstall_launchd: bool,
}

pub async fn run(args: HookArgs) -> i32 {
    let paths = Paths::resolve();
    match args.command {
        HookCommand::Pretool => pretool(&paths).await,
        HookCommand::Posttool => posttool(&paths).await,
        HookCommand::Stop(stop_args) => stop_command(&paths, stop_args).await,
        HookCommand::Precompact => precompact(&paths).await,
        HookCommand::Prompt => prompt_hook(&paths),
    }
}

async fn pretool(paths: &Paths) -> i32 {
    let event = match HookEvent::from_reader(std::io::stdin()) {
        Ok(event) => event,
        Err(EnvelopeError::Json(_)) => {
            eprintln!("⚠️  PreToolUse: non-JSON payload detected; allowing command.");
            return 0;
        }
        Err(EnvelopeError::Io(_)) => return 0,
    };
    if let Err(e) = paths.ensure_base_dirs() {
        DebugLog::for_hook(paths, "pretool_hook").line(format!("state dir setup failed: {e}"));
        return 0;
    }
    let ctx = GateContext::new(paths.clone());
    gate::run_pretool(&ctx, &event).await.emit()
}

async fn posttool(paths: &Paths) -> i32 {
    let Ok(event) = HookEvent::from_reader(std::io::stdin()) else {
        return 0;
    };
    let outcome = validator::run_posttool(&event, &paths.project_root).await;
    if outcome != HookOutcome::Allow {
        return outcome.emit();
    }
    reminder::run_reminder(paths, &event).emit()
}

async fn stop_command(paths: &Paths, args: StopArgs) -> i32 {
    if let Err(e) = paths.ensure_base_dirs() {
        eprintln!("Stop hook: cannot create state directories: {e}");
        return 0;
    }
    let queue = Queue::new(&paths.queue_dir, &paths.dead_dir, QueueConfig::from_env());

    if args.process_queue {
        let summary = worker::drain(
            &queue,
            &VectorClient::from_env(),
            &WarningsLog::new(paths.warnings_path()),
            &DebugLog::for_hook(paths, "stop_hook"),
            DrainOptions {
                max_jobs: 999,
                budget: Duration::from_secs(30),
                vector_enabled: envcfg::env_flag("ENABLE_VECTOR_RAG", false),
            },
        )
        .await;
        print_json(&json!({"ok": true, "summary": summary}));
        return 0;
    }

    if args.queue_status {
        let status = queue.status(5);
        let config = queue.config();
        print_json(&json!({
            "ok": true,
            "queue_dir": paths.queue_dir,
            "dead_dir": paths.dead_dir,
            "queued": status.queued,
            "dead": status.dead,
            "recent_dead_errors": status.recent_dead_errors,
            "config": {
                "ENABLE_VECTOR_RAG": envcfg::env_flag("ENABLE_VECTOR_RAG", false),
                "INGEST_MAX_ATTEMPTS": config.max_attempts,
                "INGEST_BACKOFF_BASE": config.backoff_base,
                "INGEST_BACKOFF_CAP": config.backoff_cap,
            },
        }));
        return 0;
    }

    if let Some(limit) = args.retry_dead {
        let report = queue.retry_dead(limit);
        print_json(&json!({"ok": true, "result": report}));
        return 0;
    }

    if let Some(interval) = args.emit_launchd {
        return match launchd::emit(paths, interval.unwrap_or(launchd::DEFAULT_INTERVAL_SEC)) {
            Ok((label, path)) => {
                print_json(&json!({
                    "ok": true,
                    "label": label,
                    "plist_path": path,
                    "interval_sec": interval.unwrap_or(launchd::DEFAULT_INTERVAL_SEC),
                }));
                0
            }
            Err(e) => {
                print_json(&json!({"ok": false, "error": format!("Failed to write plist: {e}")}));
                0
            }
        };
    }

    if args.uninstall_launchd {
        let result = launchd::uninstall(paths).await;
        print_json(&result);
        return 0;
    }

    // Plain Stop hook: capture the turn's DIGEST.
    let event = match HookEvent::from_reader(std::io::stdin()) {
        Ok(event) => event,
        Err(EnvelopeError::Json(_)) => {
            eprintln!("Stop hook: invalid JSON payload");
            return 1;
        }
        Err(EnvelopeError::Io(_)) => return 0,
    };
    stop::run_stop(paths, &event, &StopConfig::from_env()).await;
    0
}

async fn precompact(paths: &Paths) -> i32 {
    let event = HookEvent::from_reader(std::io::stdin()).unwrap_or_default();
    match compaction::run_precompact(paths, &event).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("PreCompact hook: {e}");
            1
        }
    }
}

fn prompt_hook(paths: &Paths) -> i32 {
    let event = HookEvent::from_reader(std::io::stdin()).unwrap_or_default();
    prompt::run_prompt(paths, &event).emit()
}
