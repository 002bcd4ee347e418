// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint trigger detection (advisory; never blocks).

use scribe_core::HookEvent;

const SCHEMA_PATTERNS: [&str; 6] = [
    "schema.prisma",
    "migrations/",
    ".sql",
    "alembic",
    "models.py",
    "models.ts",
];

const CONFIG_PATTERNS: [&str; 6] = [
    "package.json",
    "pyproject.toml",
    "requirements.txt",
    ".env",
    "config.json",
    "settings.json",
];

const DESTRUCTIVE_COMMANDS: [&str; 8] = [
    "rm -rf",
    "drop table",
    "drop database",
    "delete from",
    "truncate",
    "prisma migrate",
    "sudo",
    "chmod 777",
];

const REMOVAL_COMMANDS: [&str; 6] = [
    "npm uninstall",
    "pip uninstall",
    "pnpm remove",
    "yarn remove",
    "apt remove",
    "brew uninstall",
];

/// Bash commands that are read-only or reversible; triggers skip them.
const SAFE_COMMANDS: [&str; 5] = ["git", "ls", "cat", "grep", "find"];

const PERIODIC_INTERVAL: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub reason: String,
    pub details: String,
}

/// Decide whether this tool call warrants a snapshot before it runs.
pub fn checkpoint_trigger(event: &HookEvent, turn: u64) -> Option<Trigger> {
    let command = event.command().unwrap_or_default();
    if !command.is_empty() && SAFE_COMMANDS.iter().any(|safe| command.contains(safe)) {
        return None;
    }

    if event.is_file_edit() {
        let path = event.file_path().unwrap_or_default().to_lowercase();
        if SCHEMA_PATTERNS.iter().any(|p| path.contains(p)) {
            return Some(Trigger {
                reason: "Schema/migration change".into(),
                details: format!("Modifying {}", event.file_path().unwrap_or_default()),
            });
        }
        if CONFIG_PATTERNS.iter().any(|p| path.contains(p)) {
            return Some(Trigger {
                reason: "Critical config change".into(),
                details: format!("Modifying {}", event.file_path().unwrap_or_default()),
            });
        }
    }

    if event.tool() == "Bash" {
        let lowered = command.to_lowercase();
        if DESTRUCTIVE_COMMANDS.iter().any(|d| lowered.contains(d)) {
            return Some(Trigger {
                reason: "Destructive command".into(),
                details: truncate(&lowered, 100),
            });
        }
        if REMOVAL_COMMANDS.iter().any(|r| lowered.contains(r)) {
            return Some(Trigger {
                reason: "Dependency removal".into(),
                details: truncate(&lowered, 100),
            });
        }
    }

    if turn > 0 && turn % PERIODIC_INTERVAL == 0 {
        return Some(Trigger {
            reason: "Periodic checkpoint".into(),
            details: format!("Turn {turn}"),
        });
    }

    None
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
#[path = "triggers_tests.rs"]
mod tests;
