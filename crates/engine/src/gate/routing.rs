// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routing advisory: direct edits on project code files surface a reminder
//! to delegate to subagents. Infrastructure paths are exempt.

use scribe_core::{HookEvent, HookOutcome};

use super::messages;

const CODE_EXTENSIONS: [&str; 11] = [
    ".ts", ".tsx", ".js", ".jsx", ".py", ".java", ".cpp", ".c", ".rs", ".go", ".rb",
];

const PROJECT_CODE_DIRS: [&str; 5] = ["/lib/", "/app/", "/components/", "/src/", "/packages/"];

const INFRA_DIRS: [&str; 3] = ["/claude-hooks/", "/.claude/", "/scripts/"];

pub(super) fn routing_advisory(event: &HookEvent) -> Option<HookOutcome> {
    if !event.is_file_edit() {
        return None;
    }
    let file_path = event.file_path()?;

    let is_code = CODE_EXTENSIONS.iter().any(|ext| file_path.ends_with(ext));
    let in_project_code = PROJECT_CODE_DIRS.iter().any(|dir| file_path.contains(dir));
    let in_infra = INFRA_DIRS.iter().any(|dir| file_path.contains(dir));

    if is_code && in_project_code && !in_infra {
        return Some(HookOutcome::Warn(messages::routing_reminder(file_path)));
    }
    None
}

#[cfg(test)]
#[path = "routing_tests.rs"]
mod tests;
