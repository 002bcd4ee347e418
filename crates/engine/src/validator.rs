// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PostToolUse validator: typecheck edited files in the project toolchain.
//!
//! A failing typecheck is a hard block (the edit already landed; the caller
//! must fix or revert); a timeout is only advisory.

use std::path::Path;

use scribe_adapters::typecheck::{
    is_node_source, is_python_source, node_typecheck, python_typecheck,
};
use scribe_adapters::TypecheckOutcome;
use scribe_core::outcome::bordered;
use scribe_core::{HookEvent, HookOutcome};

pub async fn run_posttool(event: &HookEvent, cwd: &Path) -> HookOutcome {
    if !event.is_file_edit() {
        return HookOutcome::Allow;
    }
    let Some(file_path) = event.file_path() else {
        return HookOutcome::Allow;
    };

    let outcome = if is_node_source(file_path) && cwd.join("package.json").exists() {
        node_typecheck(cwd).await
    } else if is_python_source(file_path) {
        python_typecheck(cwd, Path::new(file_path)).await
    } else {
        return HookOutcome::Allow;
    };

    let file_name = Path::new(file_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.to_string());

    match outcome {
        TypecheckOutcome::Passed | TypecheckOutcome::Unavailable => HookOutcome::Allow,
        TypecheckOutcome::TimedOut { tool } => {
            HookOutcome::Warn(format!("⚠️  Typecheck timed out (>10s): {tool}"))
        }
        TypecheckOutcome::Failed { tool, output } => HookOutcome::Block(bordered(
            &format!("❌ Typecheck FAILED ({tool}) after editing {file_name}"),
            &[
                output,
                String::new(),
                "🚫 BLOCKED: Fix type errors before continuing".into(),
                String::new(),
                "Main Agent should:".into(),
                "1. Review the type errors above".into(),
                "2. Either revert the change OR".into(),
                "3. Fix the type issues immediately".into(),
            ],
        )),
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
