// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typecheck runners for the project's own toolchain.
//!
//! Node projects are probed through their script runner (`type-check`,
//! `typecheck`, `tsc`, in that order); Python files go through `mypy` then
//! `pyright`. A missing toolchain is not an error.

use std::path::Path;

use tokio::process::Command;

use crate::subprocess::{run_with_timeout, SubprocessError, TYPECHECK_TIMEOUT};

/// Captured output is truncated to this many bytes for stderr reporting.
const OUTPUT_CAP: usize = 500;

const NODE_SCRIPTS: [&str; 3] = ["type-check", "typecheck", "tsc"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypecheckOutcome {
    Passed,
    Failed { tool: String, output: String },
    TimedOut { tool: String },
    /// No usable typecheck toolchain in this project.
    Unavailable,
}

/// Whether the path has an extension the node typecheck covers.
pub fn is_node_source(path: &str) -> bool {
    [".ts", ".tsx", ".js", ".jsx"].iter().any(|ext| path.ends_with(ext))
}

pub fn is_python_source(path: &str) -> bool {
    path.ends_with(".py")
}

/// Run the project's npm typecheck script, trying the common names.
pub async fn node_typecheck(cwd: &Path) -> TypecheckOutcome {
    if !cwd.join("package.json").exists() {
        return TypecheckOutcome::Unavailable;
    }
    for script in NODE_SCRIPTS {
        let mut cmd = Command::new("npm");
        cmd.args(["run", script]).current_dir(cwd);
        match run_with_timeout(cmd, TYPECHECK_TIMEOUT, "npm run").await {
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if stderr.contains("Missing script") {
                    continue;
                }
                if output.status.success() {
                    return TypecheckOutcome::Passed;
                }
                return TypecheckOutcome::Failed {
                    tool: format!("npm run {script}"),
                    output: capture(&output),
                };
            }
            Err(SubprocessError::Timeout { .. }) => {
                return TypecheckOutcome::TimedOut {
                    tool: format!("npm run {script}"),
                };
            }
            // npm itself is missing; no point trying other script names.
            Err(SubprocessError::Spawn { .. }) => return TypecheckOutcome::Unavailable,
        }
    }
    TypecheckOutcome::Unavailable
}

/// Typecheck one Python file with the first available tool.
pub async fn python_typecheck(cwd: &Path, file: &Path) -> TypecheckOutcome {
    for tool in ["mypy", "pyright"] {
        let mut cmd = Command::new(tool);
        cmd.arg(file).current_dir(cwd);
        match run_with_timeout(cmd, TYPECHECK_TIMEOUT, tool).await {
            Ok(output) => {
                if output.status.success() {
                    return TypecheckOutcome::Passed;
                }
                return TypecheckOutcome::Failed {
                    tool: tool.to_string(),
                    output: capture(&output),
                };
            }
            Err(SubprocessError::Timeout { .. }) => {
                return TypecheckOutcome::TimedOut {
                    tool: tool.to_string(),
                };
            }
            Err(SubprocessError::Spawn { .. }) => continue,
        }
    }
    TypecheckOutcome::Unavailable
}

fn capture(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout)
    } else {
        stderr
    };
    let mut text = text.into_owned();
    if text.len() > OUTPUT_CAP {
        let mut cut = OUTPUT_CAP;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

#[cfg(test)]
#[path = "typecheck_tests.rs"]
mod tests;
