// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The DIGEST record: one unit of subagent work, captured at Stop time.
//!
//! The schema is closed over the recognised fields below; anything else the
//! subagent emitted is preserved verbatim in `extra`. Several narrative
//! fields come in one-of families (`problem`/`symptom`/`question`, …); the
//! coalescing accessors pick the first populated member.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum canonical ingestion text length accepted by the queue.
pub const MIN_INGEST_LEN: usize = 50;

/// Agent placeholder for digests that never named one.
pub const UNKNOWN_AGENT: &str = "UNKNOWN";

/// Task placeholder rejected by the quality gates.
pub const UNTAGGED_TASK: &str = "untagged";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestKind {
    #[default]
    Decision,
    Investigation,
    Incident,
    Experiment,
    Design,
    Status,
    Knowledge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Observed,
    Proposed,
    #[default]
    Implemented,
    Validated,
    Deprecated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    #[default]
    None,
    Expected,
    Partial,
    Success,
    Failed,
}

/// A file touched during the unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,
}

impl FileRef {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
            anchors: Vec::new(),
        }
    }
}

/// Quality gates a digest must pass before the queue accepts it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QualityGate {
    #[error("Quality gate failed: DIGEST must have summary, problem+solution, or decisions")]
    InsufficientContent,
    #[error("Quality gate failed: DIGEST must specify agent")]
    MissingAgent,
    #[error("Quality gate failed: DIGEST must have meaningful task_id")]
    MissingTaskId,
    #[error("Quality gate failed: DIGEST text too short ({len} < {min} chars)")]
    InsufficientLength { len: usize, min: usize },
}

impl QualityGate {
    /// Short machine tag used in skip reporting.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InsufficientContent => "insufficient_content",
            Self::MissingAgent => "missing_agent",
            Self::MissingTaskId => "missing_task_id",
            Self::InsufficientLength { .. } => "insufficient_length",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    #[serde(rename = "type", default)]
    pub kind: DigestKind,
    #[serde(default = "unknown_agent")]
    pub agent: String,
    #[serde(default = "untagged_task")]
    pub task_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_project_lesson: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contracts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub evidence: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tech_stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub stage: Stage,
    #[serde(default)]
    pub outcome_status: OutcomeStatus,
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Unrecognised fields, preserved round-trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn unknown_agent() -> String {
    UNKNOWN_AGENT.to_string()
}

fn untagged_task() -> String {
    UNTAGGED_TASK.to_string()
}

fn default_confidence() -> f64 {
    0.95
}

impl Default for Digest {
    fn default() -> Self {
        Self {
            kind: DigestKind::default(),
            agent: unknown_agent(),
            task_id: untagged_task(),
            summary: None,
            problem: None,
            symptom: None,
            question: None,
            root_cause: None,
            cause: None,
            solution: None,
            fix: None,
            outcome: None,
            results: None,
            impact: None,
            cross_project_lesson: None,
            lesson: None,
            decisions: Vec::new(),
            files: Vec::new(),
            contracts: Vec::new(),
            next: Vec::new(),
            evidence: IndexMap::new(),
            problem_type: None,
            solution_pattern: None,
            tech_stack: Vec::new(),
            keywords: Vec::new(),
            stage: Stage::default(),
            outcome_status: OutcomeStatus::default(),
            confidence: default_confidence(),
            extra: serde_json::Map::new(),
        }
    }
}

impl Digest {
    pub fn new(agent: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            task_id: task_id.into(),
            ..Self::default()
        }
    }

    pub fn problem_text(&self) -> Option<&str> {
        first_filled([&self.problem, &self.symptom, &self.question])
    }

    pub fn root_cause_text(&self) -> Option<&str> {
        first_filled([&self.root_cause, &self.cause])
    }

    pub fn solution_text(&self) -> Option<&str> {
        first_filled([&self.solution, &self.fix])
    }

    pub fn outcome_text(&self) -> Option<&str> {
        first_filled([&self.outcome, &self.results, &self.impact])
    }

    pub fn lesson_text(&self) -> Option<&str> {
        first_filled([&self.cross_project_lesson, &self.lesson])
    }

    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.is_empty())
    }

    /// Gate a digest for ingestion: it must name an agent and a task, and
    /// carry at least one of summary, problem+solution, or decisions. The
    /// length gate lives in the codec, which owns the canonical text.
    pub fn quality(&self) -> Result<(), QualityGate> {
        let has_content = self.summary_text().is_some()
            || (self.problem_text().is_some() && self.solution_text().is_some())
            || !self.decisions.is_empty();
        if !has_content {
            return Err(QualityGate::InsufficientContent);
        }
        if self.agent == UNKNOWN_AGENT || self.agent.is_empty() {
            return Err(QualityGate::MissingAgent);
        }
        if self.task_id.is_empty() || self.task_id == UNTAGGED_TASK {
            return Err(QualityGate::MissingTaskId);
        }
        Ok(())
    }
}

fn first_filled<'a, const N: usize>(fields: [&'a Option<String>; N]) -> Option<&'a str> {
    fields
        .into_iter()
        .filter_map(|f| f.as_deref())
        .find(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "digest_tests.rs"]
mod tests;
