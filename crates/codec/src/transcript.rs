// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transcript scanning.
//!
//! Session transcripts can reach tens of megabytes; the scanner stats the
//! file, tries a bounded tail window first, and only falls back to a full
//! parse (JSON array, then line-delimited JSON) when the tail held no
//! DIGEST and the configuration permits it. All IO failures degrade to
//! "no DIGEST".

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use scribe_core::envcfg;
use scribe_core::{Digest, DebugLog};
use serde_json::Value;

use crate::extract::extract_digest;

const DEFAULT_TAIL_WINDOW: u64 = 512 * 1024;

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Bytes read from the end of the file for the fast pass.
    pub tail_window_bytes: u64,
    /// Above this size, `tail_fast_only` suppresses the full parse.
    pub max_transcript_bytes: u64,
    pub tail_fast_only: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tail_window_bytes: DEFAULT_TAIL_WINDOW,
            max_transcript_bytes: DEFAULT_TAIL_WINDOW,
            tail_fast_only: false,
        }
    }
}

impl ScanConfig {
    pub fn from_env() -> Self {
        Self {
            tail_window_bytes: envcfg::env_parse("STOP_TAIL_WINDOW_BYTES", DEFAULT_TAIL_WINDOW),
            max_transcript_bytes: envcfg::env_parse(
                "STOP_HOOK_MAX_TRANSCRIPT_BYTES",
                DEFAULT_TAIL_WINDOW,
            ),
            tail_fast_only: envcfg::env_flag("STOP_TAIL_FAST_ONLY", false),
        }
    }
}

/// Scan a transcript file per the configured contract.
pub fn scan_transcript(path: &Path, config: &ScanConfig, debug: &DebugLog) -> Option<Digest> {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    if let Some(digest) = scan_tail(path, size, config.tail_window_bytes) {
        debug.line(format!(
            "fast DIGEST path: found in tail (size={size} bytes, window={})",
            config.tail_window_bytes
        ));
        return Some(digest);
    }

    if config.tail_fast_only && size > config.max_transcript_bytes {
        debug.line(format!(
            "skipping full transcript parse (size={size} > limit={})",
            config.max_transcript_bytes
        ));
        return None;
    }

    scan_full(path, debug)
}

/// Read the last `window` bytes (or the whole file when smaller), decode
/// lossily, and look for a DIGEST.
pub fn scan_tail(path: &Path, size: u64, window: u64) -> Option<Digest> {
    let mut file = std::fs::File::open(path).ok()?;
    if size > window {
        file.seek(SeekFrom::Start(size - window)).ok()?;
    }
    let mut bytes = Vec::with_capacity(size.min(window) as usize);
    file.read_to_end(&mut bytes).ok()?;
    extract_digest(&String::from_utf8_lossy(&bytes))
}

/// Full parse: JSON array first, then line-delimited JSON with unparseable
/// lines skipped; assistant messages are searched newest-first.
pub fn scan_full(path: &Path, debug: &DebugLog) -> Option<Digest> {
    let content = std::fs::read_to_string(path).ok()?;
    let messages = parse_messages(content.trim());
    debug.line(format!("read transcript: {} messages", messages.len()));

    for (idx, message) in messages.iter().rev().enumerate() {
        let Some(text) = assistant_text(message) else {
            continue;
        };
        if let Some(digest) = extract_digest(&text) {
            debug.line(format!("DIGEST found in assistant message index {idx} (from end)"));
            return Some(digest);
        }
    }
    debug.line("no DIGEST found across assistant messages in transcript");
    None
}

fn parse_messages(content: &str) -> Vec<Value> {
    if let Ok(Value::Array(messages)) = serde_json::from_str(content) {
        return messages;
    }
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect()
}

/// Joined text blocks of an assistant message, or `None` for other types.
fn assistant_text(message: &Value) -> Option<String> {
    if message.get("type").and_then(Value::as_str) != Some("assistant") {
        return None;
    }
    let blocks = message.get("message")?.get("content")?.as_array()?;
    let parts: Vec<&str> = blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("\n"))
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
