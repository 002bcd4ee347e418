// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook event envelope read from stdin.
//!
//! The host sends one JSON object per invocation; the key set varies by
//! lifecycle event, so every field is optional and unknown keys are ignored.

use std::io::Read;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("failed to read hook input: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// One hook invocation's input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookEvent {
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default)]
    pub tool_output: Option<Value>,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub assistant_text: Option<String>,
    #[serde(default)]
    pub final_message: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<PathBuf>,
    #[serde(default)]
    pub stop_hook_active: bool,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub messages: Option<Value>,
}

impl HookEvent {
    /// Read one JSON object from the reader. Empty input is an empty event;
    /// malformed JSON is an error the caller maps to its own fail-open or
    /// fail-closed policy.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, EnvelopeError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn tool(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("")
    }

    /// `tool_input.file_path`, when present.
    pub fn file_path(&self) -> Option<&str> {
        self.tool_input.get("file_path").and_then(Value::as_str)
    }

    /// `tool_input.command`, when present.
    pub fn command(&self) -> Option<&str> {
        self.tool_input.get("command").and_then(Value::as_str)
    }

    /// Inline assistant text, preferring the most specific key.
    pub fn inline_text(&self) -> Option<&str> {
        self.assistant_text
            .as_deref()
            .or(self.final_message.as_deref())
            .or(self.content.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Prompt text for UserPromptSubmit payloads.
    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .or(self.content.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// True for the file-editing tools the gates care about.
    pub fn is_file_edit(&self) -> bool {
        matches!(self.tool(), "Edit" | "Write" | "MultiEdit" | "NotebookEdit")
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
