// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Markdown-creation gate.
//!
//! New `.md` files are blocked unless the basename is on the system
//! allow-list or a short-lived approval (recorded by the UserPromptSubmit
//! detector) matches.

use scribe_core::{HookEvent, HookOutcome};
use scribe_storage::Approval;

use super::messages;
use super::GateContext;

/// Always-permitted system files, matched case-insensitively against the
/// basename.
const ALLOWED_SYSTEM_FILES: [&str; 6] = [
    "feature_map.md",
    "notes.md",
    "compaction.md",
    "changelog.md",
    "readme.md",
    "claude.md",
];

pub(super) fn markdown_gate(ctx: &GateContext, event: &HookEvent) -> Option<HookOutcome> {
    if event.tool() != "Write" {
        return None;
    }
    let file_path = event.file_path()?;
    if !file_path.to_lowercase().ends_with(".md") {
        return None;
    }

    let file_name = std::path::Path::new(file_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ALLOWED_SYSTEM_FILES.iter().any(|allowed| file_name.contains(allowed)) {
        return None;
    }

    match ctx.approvals.consume(file_path) {
        Some(Approval::Permissive) => {
            eprintln!("\n✅ MD Creation Approved (permissive mode): {file_path}");
            None
        }
        Some(Approval::Explicit(_)) => {
            eprintln!("\n✅ MD Creation Approved (explicit request): {file_path}");
            None
        }
        None => Some(HookOutcome::Block(messages::markdown_blocked(file_path))),
    }
}

#[cfg(test)]
#[path = "markdown_tests.rs"]
mod tests;
