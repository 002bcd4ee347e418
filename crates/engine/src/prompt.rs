// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UserPromptSubmit hook: detect explicit markdown-creation requests.
//!
//! Named files arm the approval store for the PreToolUse markdown gate;
//! vague documentation requests arm the short-lived permissive sentinel.

use std::sync::LazyLock;

use regex::Regex;
use scribe_core::{DebugLog, HookEvent, HookOutcome, Paths};
use scribe_storage::approvals::PERMISSIVE;
use scribe_storage::ApprovalStore;

#[allow(clippy::expect_used)]
static NAMED_MD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:create|write|make|add|generate)\s+(?:a\s+)?(?:new\s+)?([A-Za-z0-9_./-]+\.md)\b")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static DOCUMENT_IN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bdocument\s+(?:this|it|that)\s+in\s+([A-Za-z0-9_./-]+\.md)\b")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static NAMED_MD_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:create|write|make)\s+a\s+new\s+(\w+)\.md\s+file\b")
        .expect("constant regex pattern is valid")
});

const VAGUE_DOC_PHRASES: [&str; 7] = [
    "create documentation for",
    "write documentation for",
    "make documentation for",
    "document the",
    "add documentation about",
    "write a new",
    "create a new",
];

const MD_HINTS: [&str; 3] = [".md", "markdown", "md file"];

/// Markdown files the prompt explicitly asks for, or the permissive
/// sentinel for a vague documentation request.
pub fn detect_md_requests(prompt: &str) -> Vec<String> {
    let mut requested: Vec<String> = Vec::new();
    let mut push = |name: String| {
        let name = name.trim_matches(['.', ',', ';', ':', '!', '?', '"', '\'']).to_string();
        if !name.is_empty() && name != ".md" && !requested.contains(&name) {
            requested.push(name);
        }
    };

    for re in [&*NAMED_MD_RE, &*DOCUMENT_IN_RE] {
        for captures in re.captures_iter(prompt) {
            if let Some(m) = captures.get(1) {
                push(m.as_str().to_string());
            }
        }
    }
    for captures in NAMED_MD_FILE_RE.captures_iter(prompt) {
        if let Some(m) = captures.get(1) {
            push(format!("{}.md", m.as_str()));
        }
    }

    if requested.is_empty() {
        let lowered = prompt.to_lowercase();
        let vague = VAGUE_DOC_PHRASES.iter().any(|p| lowered.contains(p));
        let hinted = MD_HINTS.iter().any(|h| lowered.contains(h));
        if vague && hinted {
            return vec![PERMISSIVE.to_string()];
        }
    }
    requested
}

pub fn run_prompt(paths: &Paths, event: &HookEvent) -> HookOutcome {
    let debug = DebugLog::for_hook(paths, "md_request_hook");
    let Some(prompt) = event.prompt_text() else {
        return HookOutcome::Allow;
    };
    let requested = detect_md_requests(prompt);
    if requested.is_empty() {
        return HookOutcome::Allow;
    }
    debug.stamped(format!("markdown approvals armed: {requested:?}"));
    let store = ApprovalStore::new(paths.approvals_path());
    if let Err(e) = store.record(requested) {
        debug.line(format!("failed to record approvals: {e}"));
    }
    HookOutcome::Allow
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
