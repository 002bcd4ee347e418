// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PreToolUse policy gate.
//!
//! Gates run in declared order; the first hard block wins. Checkpoint
//! triggers and WSI pruning are maintenance steps that never decide the
//! outcome. A gate that cannot read its own state fails open.

mod markdown;
mod messages;
mod routing;
mod triggers;

use scribe_core::{DebugLog, HookEvent, HookOutcome, Paths};
use scribe_storage::{
    ApprovalStore, Journal, ReadCache, ReadCheck, TurnCounter, WsiFile,
};

use crate::checkpoint;

/// Typecheck cadence in turns.
const TYPECHECK_INTERVAL: u64 = 20;

/// WSI prune cadence in turns.
const WSI_PRUNE_INTERVAL: u64 = 10;

/// Duplicate reads blocked at this attempt count.
const DUPLICATE_READ_LIMIT: u32 = 3;

pub struct GateContext {
    pub paths: Paths,
    pub journal: Journal,
    pub counter: TurnCounter,
    pub read_cache: ReadCache,
    pub approvals: ApprovalStore,
    pub wsi: WsiFile,
    pub debug: DebugLog,
}

impl GateContext {
    pub fn new(paths: Paths) -> Self {
        let debug = DebugLog::for_hook(&paths, "pretool_hook");
        Self {
            journal: Journal::new(&paths),
            counter: TurnCounter::new(paths.counter_path()),
            read_cache: ReadCache::new(paths.hash_cache_path()),
            approvals: ApprovalStore::new(paths.approvals_path()),
            wsi: WsiFile::new(&paths.wsi_path, Paths::wsi_cap()),
            debug,
            paths,
        }
    }
}

pub async fn run_pretool(ctx: &GateContext, event: &HookEvent) -> HookOutcome {
    let turn = match ctx.counter.increment() {
        Ok(turn) => turn,
        Err(e) => {
            ctx.debug.stamped(format!("turn counter failed: {e}"));
            0
        }
    };

    if turn > 0 && turn % WSI_PRUNE_INTERVAL == 0 {
        prune_wsi(ctx);
    }

    if let Some(trigger) = triggers::checkpoint_trigger(event, turn) {
        fire_checkpoint(ctx, event, &trigger).await;
    }

    if let Some(block) = schema_change_gate(ctx, event) {
        return block;
    }

    if turn > 0 && turn % TYPECHECK_INTERVAL == 0 {
        if let Some(warn) = periodic_typecheck(ctx, event, turn).await {
            return warn;
        }
    }

    if event.tool() == "Read" {
        if let Some(outcome) = duplicate_read_gate(ctx, event) {
            return outcome;
        }
    }

    if let Some(block) = dependency_removal_gate(ctx, event) {
        return block;
    }

    if let Some(warn) = routing::routing_advisory(event) {
        return warn;
    }

    if let Some(block) = markdown::markdown_gate(ctx, event) {
        return block;
    }

    HookOutcome::Allow
}

fn prune_wsi(ctx: &GateContext) {
    match ctx.wsi.prune_with_archive(&ctx.paths.logs_dir) {
        Ok(Some(archive)) => {
            ctx.debug
                .stamped(format!("WSI pruned, overflow archived to {}", archive.display()));
            eprintln!("   📦 WSI pruned: overflow archived");
        }
        Ok(None) => {}
        Err(e) => ctx.debug.stamped(format!("WSI prune failed: {e}")),
    }
}

async fn fire_checkpoint(ctx: &GateContext, event: &HookEvent, trigger: &triggers::Trigger) {
    let metadata = serde_json::json!({
        "tool": event.tool(),
        "details": trigger.details,
    });
    match checkpoint::create_checkpoint(
        &ctx.paths,
        &ctx.paths.project_root,
        &trigger.reason,
        metadata,
    )
    .await
    {
        checkpoint::CheckpointCreate::Created(record) => {
            eprintln!("\n🔄 Checkpoint created: {}", record.id);
            eprintln!("   Reason: {}", trigger.reason);
            eprintln!("   Details: {}", trigger.details);
            eprintln!("   Restore: scribe checkpoint restore {}\n", record.id);
        }
        checkpoint::CheckpointCreate::CleanTree => {}
        checkpoint::CheckpointCreate::NotARepo => {
            ctx.debug.stamped("checkpoint skipped: not a git repository");
        }
        checkpoint::CheckpointCreate::Failed(e) => {
            eprintln!("⚠️  Checkpoint failed: {e}");
        }
    }
}

/// Hard block on schema/migration edits unless the journal tail shows
/// recent DME-agent activity.
fn schema_change_gate(ctx: &GateContext, event: &HookEvent) -> Option<HookOutcome> {
    if !event.is_file_edit() {
        return None;
    }
    let path = event.file_path().unwrap_or_default().to_lowercase();
    if !path.contains("schema.prisma") && !path.contains("/migrations/") {
        return None;
    }
    if ctx.journal.tail_contains(r#"agent": "DME"#) {
        return None;
    }
    Some(HookOutcome::Block(messages::schema_change_blocked(
        event.file_path().unwrap_or_default(),
    )))
}

async fn periodic_typecheck(ctx: &GateContext, event: &HookEvent, turn: u64) -> Option<HookOutcome> {
    let edited_source = event.is_file_edit()
        && event.file_path().is_some_and(|p| {
            scribe_adapters::typecheck::is_node_source(p) || scribe_adapters::typecheck::is_python_source(p)
        });
    if !edited_source && turn % (TYPECHECK_INTERVAL * 2) != 0 {
        return None;
    }

    eprintln!("\n📋 Periodic typecheck (turn {turn})");
    let cwd = &ctx.paths.project_root;

    let outcome = if cwd.join("package.json").exists() {
        scribe_adapters::typecheck::node_typecheck(cwd).await
    } else if cwd.join("pyproject.toml").exists() || cwd.join("setup.py").exists() {
        scribe_adapters::typecheck::python_typecheck(cwd, std::path::Path::new(".")).await
    } else {
        scribe_adapters::TypecheckOutcome::Unavailable
    };

    match outcome {
        scribe_adapters::TypecheckOutcome::Failed { tool, output } => Some(HookOutcome::Warn(
            format!("\n❌ Typecheck errors found ({tool}):\n{output}\n\nFix these before continuing."),
        )),
        scribe_adapters::TypecheckOutcome::TimedOut { .. } => {
            eprintln!("   ⏱️ Typecheck timed out");
            None
        }
        scribe_adapters::TypecheckOutcome::Passed => {
            eprintln!("   ✅ Typecheck passed");
            None
        }
        scribe_adapters::TypecheckOutcome::Unavailable => None,
    }
}

/// Warn twice, then hard-block repeat reads of unchanged content.
fn duplicate_read_gate(ctx: &GateContext, event: &HookEvent) -> Option<HookOutcome> {
    let file_path = event.file_path()?;
    let content = std::fs::read(file_path).ok()?;
    let turn = ctx.counter.load();

    match ctx.read_cache.check(file_path, &content, turn) {
        ReadCheck::FirstRead | ReadCheck::Changed => None,
        ReadCheck::Duplicate(attempts) if attempts >= DUPLICATE_READ_LIMIT => Some(
            HookOutcome::Block(messages::duplicate_read_blocked(file_path, attempts)),
        ),
        ReadCheck::Duplicate(attempts) => Some(HookOutcome::Warn(
            messages::duplicate_read_warning(file_path, attempts, DUPLICATE_READ_LIMIT),
        )),
    }
}

/// Hard block on dependency removal unless the journal tail shows recent
/// IDS-agent review.
fn dependency_removal_gate(ctx: &GateContext, event: &HookEvent) -> Option<HookOutcome> {
    if event.tool() != "Bash" {
        return None;
    }
    let command = event.command().unwrap_or_default().to_lowercase();
    let is_removal = ["npm uninstall", "pip uninstall", "pnpm remove"]
        .iter()
        .any(|c| command.contains(c));
    if !is_removal {
        return None;
    }
    if ctx.journal.tail_contains(r#"agent": "IDS"#) {
        return None;
    }
    Some(HookOutcome::Block(messages::dependency_removal_blocked(&command)))
}

#[cfg(test)]
#[path = "../gate_tests.rs"]
mod tests;
