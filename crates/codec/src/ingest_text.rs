// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical ingestion text.
//!
//! The vector service indexes one flat Problem/Root-Cause/Solution/Outcome
//! document per digest; the section order here is part of the external
//! contract and must not change.

use scribe_core::digest::MIN_INGEST_LEN;
use scribe_core::{Digest, QualityGate};
use serde_json::Value;

/// Render the canonical ingestion text, enforcing the quality gates and the
/// minimum length.
pub fn render_ingest_text(digest: &Digest) -> Result<String, QualityGate> {
    digest.quality()?;

    let mut parts: Vec<String> = Vec::new();
    parts.push(format!(
        "Session Summary: {} agent completed task '{}'",
        digest.agent, digest.task_id
    ));
    parts.push(String::new());

    if let Some(summary) = digest.summary_text() {
        parts.push(format!("Summary: {summary}"));
        parts.push(String::new());
    }

    if let Some(problem) = digest.problem_text() {
        parts.push(format!("Problem: {problem}"));
    } else if let Some(first) = digest.decisions.first() {
        parts.push(format!("Problem: {first}"));
    }

    if let Some(root_cause) = digest.root_cause_text() {
        parts.push(format!("Root Cause: {root_cause}"));
    }

    if let Some(solution) = digest.solution_text() {
        parts.push(format!("Solution: {solution}"));
    } else if !digest.decisions.is_empty() {
        parts.push("Solution:".to_string());
        for (i, decision) in digest.decisions.iter().enumerate() {
            parts.push(format!("  {}. {decision}", i + 1));
        }
    }

    if let Some(outcome) = digest.outcome_text() {
        parts.push(format!("Outcome: {outcome}"));
    } else if !digest.evidence.is_empty() {
        let pairs: Vec<String> = digest
            .evidence
            .iter()
            .map(|(k, v)| format!("{k}: {}", value_text(v)))
            .collect();
        parts.push(format!("Outcome: {}", pairs.join(", ")));
    }

    if let Some(lesson) = digest.lesson_text() {
        parts.push(format!("\nCross-Project Lesson: {lesson}"));
    }

    if !digest.files.is_empty() {
        let mentions: Vec<&str> = digest.files.iter().take(3).map(|f| basename(&f.path)).collect();
        parts.push(format!("\nProject Context: Modified {}", mentions.join(", ")));
        if digest.files.len() > 3 {
            parts.push(format!("  (and {} more files)", digest.files.len() - 3));
        }
    }

    if !digest.contracts.is_empty() {
        parts.push("\nAPI Contracts Affected:".to_string());
        for contract in digest.contracts.iter().take(3) {
            parts.push(format!("  - {contract}"));
        }
    }

    if !digest.next.is_empty() {
        parts.push("\nRecommended Next Steps:".to_string());
        for (i, step) in digest.next.iter().take(3).enumerate() {
            parts.push(format!("  {}. {step}", i + 1));
        }
    }

    let text = parts.join("\n");
    if text.len() < MIN_INGEST_LEN {
        return Err(QualityGate::InsufficientLength {
            len: text.len(),
            min: MIN_INGEST_LEN,
        });
    }
    Ok(text)
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "ingest_text_tests.rs"]
mod tests;
