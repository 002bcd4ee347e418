// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook outcomes and their process exit-code semantics.
//!
//! Exit codes are a contract with the host: 0 allows silently, 1 allows and
//! surfaces stderr to the user, 2 aborts the pending operation. A rewrite
//! outcome prints the modified tool input on stdout and exits 1.

use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// Proceed silently (exit 0).
    Allow,
    /// Proceed, surfacing the message to the user (exit 1).
    Warn(String),
    /// Abort the pending operation (exit 2).
    Block(String),
    /// Replace the pending tool input (stdout JSON, exit 1).
    Rewrite { tool_name: String, tool_input: Value },
}

impl HookOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Allow => 0,
            Self::Warn(_) | Self::Rewrite { .. } => 1,
            Self::Block(_) => 2,
        }
    }

    /// Write the user-visible parts to stderr/stdout and return the exit
    /// code for the process to use.
    pub fn emit(&self) -> i32 {
        match self {
            Self::Allow => {}
            Self::Warn(message) | Self::Block(message) => {
                eprintln!("{message}");
            }
            Self::Rewrite {
                tool_name,
                tool_input,
            } => {
                let payload = json!({ "tool_name": tool_name, "tool_input": tool_input });
                println!("{payload}");
            }
        }
        self.exit_code()
    }
}

/// Render a bordered policy message: a header line framed by `=` rules,
/// followed by the body lines. All hard blocks use this shape.
pub fn bordered(header: &str, body: &[String]) -> String {
    let rule = "=".repeat(61);
    let mut out = String::new();
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    out.push_str(header);
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    for line in body {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&rule);
    out.push('\n');
    out
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
