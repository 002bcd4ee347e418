// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing policy messages. Every hard block names the rule, the
//! offending input, and the remediation.

use scribe_core::outcome::bordered;

pub fn schema_change_blocked(file_path: &str) -> String {
    bordered(
        "🚫 SCHEMA CHANGE BLOCKED",
        &[
            format!("Attempting to modify: {file_path}"),
            String::new(),
            "Schema/migration changes REQUIRE using the DME agent.".into(),
            String::new(),
            "Main Agent should:".into(),
            "1. Invoke Task(dme-schema-migration) for schema changes".into(),
            "2. Let DME handle migrations, rollback plans, backfills".into(),
            "3. Never edit schema files directly".into(),
        ],
    )
}

pub fn dependency_removal_blocked(command: &str) -> String {
    let shown: String = command.chars().take(100).collect();
    bordered(
        "🚫 DEPENDENCY REMOVAL BLOCKED",
        &[
            format!("Command: {shown}"),
            String::new(),
            "Dependency removal requires IDS agent review:".into(),
            "1. Invoke Task(ids-interface-dependency-steward)".into(),
            "2. Let IDS analyze impact on contracts/interfaces".into(),
            "3. Only proceed if IDS approves".into(),
        ],
    )
}

pub fn duplicate_read_blocked(file_path: &str, attempts: u32) -> String {
    bordered(
        "🚫 DUPLICATE READ BLOCKED",
        &[
            format!("File: {file_path}"),
            format!("Duplicate read attempts: {attempts}"),
            String::new(),
            "This file was already read and hasn't changed.".into(),
            String::new(),
            "Main Agent should:".into(),
            "1. Reference the previous read content".into(),
            "2. Use Grep to search for specific patterns".into(),
            "3. Use Read with offset/limit for specific sections".into(),
        ],
    )
}

pub fn duplicate_read_warning(file_path: &str, attempts: u32, limit: u32) -> String {
    format!(
        "\n⚠️  Duplicate Read Warning ({attempts}/{limit})\n   File: {file_path}\n   Content unchanged - reference previous read instead\n   Will BLOCK after {} more attempts\n",
        limit - attempts
    )
}

pub fn markdown_blocked(file_path: &str) -> String {
    bordered(
        "🚫 MARKDOWN SPAM PREVENTION",
        &[
            format!("BLOCKED: Attempt to create: {file_path}"),
            String::new(),
            "NO MD SPAM POLICY (enforced by PreToolUse):".into(),
            "   NEVER create new .md files unless explicitly requested".into(),
            String::new(),
            "REQUIRED ALTERNATIVES:".into(),
            "   1. Update existing docs (README.md, CLAUDE.md, etc.)".into(),
            "   2. Add code comments in source files".into(),
            "   3. Explain in conversation only".into(),
            String::new(),
            "IF USER EXPLICITLY WANTS THIS FILE:".into(),
            "   Ask again naming the file, e.g. \"create docs/api.md\"".into(),
        ],
    )
}

pub fn routing_reminder(file_path: &str) -> String {
    bordered(
        "⚠️  ROUTING POLICY REMINDER",
        &[
            format!("Direct edit detected on: {file_path}"),
            String::new(),
            "Main Agent should delegate code changes to subagents:".into(),
            "• Code changes → Task(code-navigator-impact) + Task(implementation-engineer)".into(),
            "• Bug fixes → Task(requirements-clarifier) first".into(),
            "• New features → Task(implementation-planner-sprint-architect) first".into(),
            String::new(),
            "Exceptions (direct work allowed):".into(),
            "• Hook/script files (claude-hooks/, .claude/, scripts/)".into(),
            "• Documentation files (.md)".into(),
            "• Configuration files (.json, .env, .yaml)".into(),
            String::new(),
            "Proceeding with direct edit (warning only)...".into(),
        ],
    )
}
