// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec fixture: a temp project plus a fluent runner for the `scribe`
//! binary with a hermetic environment.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use std::sync::Once;

use tempfile::TempDir;

static BUILD: Once = Once::new();

/// Make sure the binary under test exists, whatever subset of the
/// workspace the current invocation built.
fn ensure_binary_built() {
    BUILD.call_once(|| {
        let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
        let status = StdCommand::new(cargo)
            .args(["build", "-p", "scribe-cli", "--bin", "scribe", "--quiet"])
            .status()
            .expect("run cargo build for the scribe binary");
        assert!(status.success(), "failed to build the scribe binary");
    });
}

/// Environment variables cleared for every spec invocation so the host
/// machine's configuration cannot leak in.
const SCRUBBED_ENV: [&str; 12] = [
    "CLAUDE_PROJECT_DIR",
    "LOGS_DIR",
    "WSI_PATH",
    "WSI_CAP",
    "ENABLE_VECTOR_RAG",
    "DATABASE_URL_MEMORY",
    "REDIS_URL",
    "OPENAI_API_KEY",
    "VECTOR_BRIDGE_CMD",
    "STOP_TAIL_WINDOW_BYTES",
    "STOP_TAIL_FAST_ONLY",
    "STOP_HOOK_MAX_TRANSCRIPT_BYTES",
];

pub struct Project {
    temp: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            temp: TempDir::new().expect("create temp project"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn state_path(&self, rel: &str) -> PathBuf {
        self.temp.path().join(".claude").join(rel)
    }

    pub fn file(&self, rel: &str, content: &str) {
        let path = self.temp.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, content).expect("write fixture file");
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.temp.path().join(rel))
            .unwrap_or_else(|e| panic!("read {rel}: {e}"))
    }

    pub fn read_state(&self, rel: &str) -> String {
        std::fs::read_to_string(self.state_path(rel))
            .unwrap_or_else(|e| panic!("read .claude/{rel}: {e}"))
    }

    pub fn state_exists(&self, rel: &str) -> bool {
        self.state_path(rel).exists()
    }

    /// Names of the queued job files.
    pub fn queued_jobs(&self) -> Vec<PathBuf> {
        let dir = self.state_path("ingest-queue");
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut jobs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|x| x == "json"))
            .collect();
        jobs.sort();
        jobs
    }

    pub fn dead_jobs(&self) -> Vec<PathBuf> {
        let dir = self.state_path("ingest-queue/dead");
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|x| x == "json"))
            .collect()
    }

    pub fn git_init(&self) {
        for args in [
            vec!["init", "-q"],
            vec!["config", "user.email", "dev@example.com"],
            vec!["config", "user.name", "Dev"],
        ] {
            let status = StdCommand::new("git")
                .arg("-C")
                .arg(self.path())
                .args(&args)
                .status()
                .expect("run git");
            assert!(status.success(), "git {args:?} failed");
        }
    }

    pub fn git(&self, args: &[&str]) {
        let status = StdCommand::new("git")
            .arg("-C")
            .arg(self.path())
            .args(args)
            .status()
            .expect("run git");
        assert!(status.success(), "git {args:?} failed");
    }

    /// A `scribe` invocation rooted at this project.
    pub fn scribe(&self) -> Cmd {
        ensure_binary_built();
        let mut inner = assert_cmd::Command::cargo_bin("scribe").expect("scribe binary");
        for var in SCRUBBED_ENV {
            inner.env_remove(var);
        }
        inner.env("CLAUDE_PROJECT_DIR", self.path());
        inner.env("HOME", self.path());
        // Keep specs hermetic: no detached status refreshers racing the
        // assertions. Status specs opt back in per invocation.
        inner.env("DISABLE_CLAUDE_MD_UPDATE", "true");
        inner.current_dir(self.path());
        Cmd { inner }
    }
}

pub struct Cmd {
    inner: assert_cmd::Command,
}

impl Cmd {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.inner.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.inner.env(key, value);
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.inner.write_stdin(input.into());
        self
    }

    pub fn passes(mut self) -> Run {
        Run(self.inner.assert().success())
    }

    pub fn exits(mut self, code: i32) -> Run {
        Run(self.inner.assert().code(code))
    }
}

pub struct Run(assert_cmd::assert::Assert);

impl Run {
    pub fn stdout(self) -> String {
        String::from_utf8_lossy(&self.0.get_output().stdout).to_string()
    }

    pub fn stderr(self) -> String {
        String::from_utf8_lossy(&self.0.get_output().stderr).to_string()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        let text = String::from_utf8_lossy(&self.0.get_output().stdout).to_string();
        assert!(text.contains(needle), "stdout missing {needle:?}:\n{text}");
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let text = String::from_utf8_lossy(&self.0.get_output().stderr).to_string();
        assert!(text.contains(needle), "stderr missing {needle:?}:\n{text}");
        self
    }
}

/// A DIGEST fence as assistants emit it.
pub fn digest_fence(agent: &str, task: &str) -> String {
    format!(
        "```json DIGEST {{\"agent\":\"{agent}\",\"task_id\":\"{task}\",\"decisions\":[\"d1\",\"d2\"],\"files\":[{{\"path\":\"lib/a.ts\",\"reason\":\"edit\"}}]}}```"
    )
}

/// Stop-hook payload carrying assistant text inline.
pub fn stop_payload(agent: &str, task: &str) -> String {
    serde_json::json!({ "assistant_text": digest_fence(agent, task) }).to_string()
}

pub fn tool_payload(tool: &str, input: serde_json::Value) -> String {
    serde_json::json!({ "tool_name": tool, "tool_input": input }).to_string()
}
