// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git as an external collaborator.
//!
//! Only the porcelain commands the pipeline needs: status, object-only
//! stash creation/storage, index reset, stash apply, a short name-status
//! log, and the remote URL. All calls carry explicit budgets.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::subprocess::{run_with_timeout, SubprocessError, GIT_SLOW_TIMEOUT, GIT_TIMEOUT};

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
    #[error("git {op} failed: {stderr}")]
    Failed { op: &'static str, stderr: String },
}

#[derive(Debug, Clone, Default)]
pub struct Git;

impl Git {
    fn command(root: &Path) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(root);
        cmd.env_remove("GIT_DIR").env_remove("GIT_WORK_TREE");
        cmd
    }

    /// Repository toplevel for `cwd`, or `None` outside a repository.
    pub async fn repo_root(&self, cwd: &Path) -> Option<PathBuf> {
        let mut cmd = Self::command(cwd);
        cmd.args(["rev-parse", "--show-toplevel"]);
        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git rev-parse").await.ok()?;
        if !output.status.success() {
            return None;
        }
        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!root.is_empty()).then(|| PathBuf::from(root))
    }

    pub async fn status_porcelain(&self, root: &Path) -> Result<String, GitError> {
        let mut cmd = Self::command(root);
        cmd.args(["status", "--porcelain"]);
        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git status").await?;
        if !output.status.success() {
            return Err(failed("status", &output.stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    pub async fn add_all(&self, root: &Path) -> Result<(), GitError> {
        let mut cmd = Self::command(root);
        cmd.args(["add", "-A"]);
        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git add").await?;
        if !output.status.success() {
            return Err(failed("add -A", &output.stderr));
        }
        Ok(())
    }

    /// `git stash create`: returns the stash object hash without touching
    /// the working tree, or `None` when git produced no object.
    pub async fn stash_create(&self, root: &Path, message: &str) -> Result<Option<String>, GitError> {
        let mut cmd = Self::command(root);
        cmd.args(["stash", "create", message]);
        let output = run_with_timeout(cmd, GIT_SLOW_TIMEOUT, "git stash create").await?;
        if !output.status.success() {
            return Err(failed("stash create", &output.stderr));
        }
        let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!sha.is_empty()).then_some(sha))
    }

    /// Store a created stash object under the stash reflog.
    pub async fn stash_store(&self, root: &Path, message: &str, sha: &str) -> Result<(), GitError> {
        let mut cmd = Self::command(root);
        cmd.args(["stash", "store", "-m", message, sha]);
        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git stash store").await?;
        if !output.status.success() {
            return Err(failed("stash store", &output.stderr));
        }
        Ok(())
    }

    /// `git reset HEAD`: restore the pre-snapshot staging state.
    pub async fn reset_index(&self, root: &Path) -> Result<(), GitError> {
        let mut cmd = Self::command(root);
        cmd.args(["reset", "HEAD"]);
        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git reset").await?;
        if !output.status.success() {
            return Err(failed("reset HEAD", &output.stderr));
        }
        Ok(())
    }

    pub async fn stash_apply(&self, root: &Path, sha: &str) -> Result<(), GitError> {
        let mut cmd = Self::command(root);
        cmd.args(["stash", "apply", sha]);
        let output = run_with_timeout(cmd, GIT_SLOW_TIMEOUT, "git stash apply").await?;
        if !output.status.success() {
            return Err(failed("stash apply", &output.stderr));
        }
        Ok(())
    }

    /// Last three commits with name-status, subjects prefixed `COMMIT:`.
    pub async fn recent_commits(&self, root: &Path) -> Result<String, GitError> {
        let mut cmd = Self::command(root);
        cmd.args(["log", "-3", "--name-status", "--pretty=format:COMMIT:%s"]);
        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git log").await?;
        if !output.status.success() {
            return Err(failed("log", &output.stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    pub async fn remote_origin_url(&self, root: &Path) -> Option<String> {
        let mut cmd = Self::command(root);
        cmd.args(["config", "--get", "remote.origin.url"]);
        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git config").await.ok()?;
        if !output.status.success() {
            return None;
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!url.is_empty()).then_some(url)
    }
}

fn failed(op: &'static str, stderr: &[u8]) -> GitError {
    GitError::Failed {
        op,
        stderr: String::from_utf8_lossy(stderr).trim().to_string(),
    }
}

/// Parsed `status --porcelain` output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Porcelain {
    pub modified: Vec<String>,
    pub added: Vec<String>,
}

impl Porcelain {
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.added.is_empty()
    }

    /// Raw lines, as recorded in checkpoint `files_changed`.
    pub fn lines(text: &str) -> Vec<String> {
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub fn parse_porcelain(text: &str) -> Porcelain {
    let mut porcelain = Porcelain::default();
    for line in text.lines() {
        if line.len() < 3 {
            continue;
        }
        let status = line[..2].trim();
        let path = line[3..].trim().to_string();
        match status {
            "M" => porcelain.modified.push(path),
            "A" | "??" => porcelain.added.push(path),
            _ => {}
        }
    }
    porcelain
}

/// Parsed `log -3 --name-status --pretty=format:COMMIT:%s` output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentLog {
    pub subjects: Vec<String>,
    pub modified: Vec<String>,
    pub added: Vec<String>,
}

pub fn parse_recent_log(text: &str) -> RecentLog {
    let mut log = RecentLog::default();
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(subject) = line.strip_prefix("COMMIT:") {
            let subject = subject.trim().to_string();
            if !subject.is_empty() && !log.subjects.contains(&subject) {
                log.subjects.push(subject);
            }
            continue;
        }
        let Some((status, path)) = line.split_once('\t') else {
            continue;
        };
        let path = path.trim().to_string();
        match status.trim() {
            "M" if !log.modified.contains(&path) => log.modified.push(path),
            "A" if !log.added.contains(&path) => log.added.push(path),
            _ => {}
        }
    }
    log
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
