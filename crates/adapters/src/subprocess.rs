// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process execution with mandatory wall-clock budgets.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Budget for quick git operations (status, add, reset, store).
pub const GIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for heavier git operations (stash create, stash apply).
pub const GIT_SLOW_TIMEOUT: Duration = Duration::from_secs(10);

/// Budget for typecheck runs.
pub const TYPECHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum SubprocessError {
    #[error("{label} failed to start: {source}")]
    Spawn {
        label: String,
        source: std::io::Error,
    },
    #[error("{label} timed out after {}s", budget.as_secs())]
    Timeout { label: String, budget: Duration },
}

/// Run the command to completion within `budget`. The child is killed when
/// the budget expires or the caller drops the future.
pub async fn run_with_timeout(
    mut cmd: Command,
    budget: Duration,
    label: &str,
) -> Result<std::process::Output, SubprocessError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|source| SubprocessError::Spawn {
        label: label.to_string(),
        source,
    })?;

    match tokio::time::timeout(budget, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(SubprocessError::Spawn {
            label: label.to_string(),
            source,
        }),
        Err(_) => Err(SubprocessError::Timeout {
            label: label.to_string(),
            budget,
        }),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
