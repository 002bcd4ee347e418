// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Vector memory service client: JSON-RPC 2.0 over a child's stdio.
//!
//! Each call spawns the bridge process, sends an `initialize` request
//! (id 1) followed by one `tools/call` (id 2), and reads line-delimited
//! responses under a wall-clock budget. On timeout the child is killed and
//! its captured stderr is inspected for completion markers: the remote is
//! known to occasionally finish the work without flushing the RPC reply.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use regex::RegexBuilder;
use scribe_core::envcfg;
use scribe_core::Digest;
use serde_json::{json, Value};
use sha2::{Digest as _, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::git::Git;

/// Skip message for unconfigured credentials; the worker matches on
/// "not configured".
pub const SKIP_NOT_CONFIGURED: &str = "Vector RAG not configured yet (setup in progress)";

const DEFAULT_RETRYABLE_PATTERN: &str =
    "timed out|ECONN|ENETUNREACH|ETIMEDOUT|EAI_AGAIN|connection reset|timeout";

const STDERR_SUCCESS_MARKERS: [&str; 2] = ["Total ingestion time:", "All chunks were duplicates"];

/// Outcome of one ingestion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Ingested { note: Option<String> },
    /// Deliberately not attempted (credentials, quality gate).
    Skipped(String),
    Failed(String),
}

/// Seam between the queue worker and the vector service.
#[async_trait]
pub trait MemoryService: Send + Sync {
    async fn ingest(&self, digest: &Digest, project_root: &Path) -> IngestOutcome;

    async fn search(
        &self,
        project_root: &Path,
        query: &str,
        k: usize,
        global: bool,
        filters: Option<Value>,
    ) -> Result<Vec<Value>, String>;
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            database_url: envcfg::env_str("DATABASE_URL_MEMORY"),
            redis_url: envcfg::env_str("REDIS_URL"),
            openai_api_key: envcfg::env_str("OPENAI_API_KEY"),
        }
    }

    pub fn complete(&self) -> bool {
        self.database_url.is_some() && self.redis_url.is_some() && self.openai_api_key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct VectorClient {
    command: Vec<String>,
    ingest_timeout: Duration,
    search_timeout: Duration,
    credentials: Credentials,
}

impl VectorClient {
    pub fn new(
        command: Vec<String>,
        ingest_timeout: Duration,
        search_timeout: Duration,
        credentials: Credentials,
    ) -> Self {
        Self {
            command,
            ingest_timeout,
            search_timeout,
            credentials,
        }
    }

    /// Command from `VECTOR_BRIDGE_CMD` (whitespace-split), defaulting to
    /// the node bridge under the user's global state directory; budgets
    /// from `INGEST_MCP_TIMEOUT_SEC`.
    pub fn from_env() -> Self {
        let command = envcfg::env_str("VECTOR_BRIDGE_CMD")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_else(default_command);
        let ingest_secs: u64 = envcfg::env_parse("INGEST_MCP_TIMEOUT_SEC", 60);
        Self::new(
            command,
            Duration::from_secs(ingest_secs.max(1)),
            Duration::from_secs(8),
            Credentials::from_env(),
        )
    }

    async fn rpc_call(&self, tool: &str, arguments: Value, budget: Duration) -> RpcReply {
        let init = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "scribe-hooks", "version": env!("CARGO_PKG_VERSION")}
            }
        });
        let call = json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {"name": tool, "arguments": arguments}
        });
        let requests = format!("{init}\n{call}\n");

        let Some((program, args)) = self.command.split_first() else {
            return RpcReply::Error("vector bridge command is empty".to_string());
        };
        let mut cmd = Command::new(program);
        cmd.args(args)
            .env(
                "DATABASE_URL_MEMORY",
                self.credentials.database_url.clone().unwrap_or_default(),
            )
            .env("REDIS_URL", self.credentials.redis_url.clone().unwrap_or_default())
            .env(
                "OPENAI_API_KEY",
                self.credentials.openai_api_key.clone().unwrap_or_default(),
            )
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(tool, budget_secs = budget.as_secs(), "vector bridge call");
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return RpcReply::Error(format!("failed to spawn vector bridge: {e}")),
        };

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(requests.as_bytes()).await {
                return RpcReply::Error(format!("failed to write to vector bridge: {e}"));
            }
            // Dropping stdin closes the pipe so the bridge sees EOF.
        }

        let stdout_buf = Arc::new(Mutex::new(String::new()));
        let stderr_buf = Arc::new(Mutex::new(String::new()));
        let out_task = drain_pipe(child.stdout.take(), Arc::clone(&stdout_buf));
        let err_task = drain_pipe(child.stderr.take(), Arc::clone(&stderr_buf));

        let timed_out = match tokio::time::timeout(budget, child.wait()).await {
            Ok(_) => false,
            Err(_) => {
                let _ = child.kill().await;
                true
            }
        };
        let _ = out_task.await;
        let _ = err_task.await;

        if timed_out {
            let stderr = stderr_buf.lock().clone();
            if STDERR_SUCCESS_MARKERS.iter().any(|m| stderr.contains(m)) {
                return RpcReply::CompletedDespiteTimeout;
            }
            return RpcReply::Error(format!("MCP call timed out after {}s", budget.as_secs()));
        }

        let stdout = stdout_buf.lock().clone();
        parse_tool_response(&stdout)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RpcReply {
    Result(Value),
    CompletedDespiteTimeout,
    Error(String),
}

fn drain_pipe<R: tokio::io::AsyncRead + Unpin + Send + 'static>(
    pipe: Option<R>,
    buf: Arc<Mutex<String>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        use tokio::io::AsyncReadExt;
        let Some(mut pipe) = pipe else { return };
        let mut text = String::new();
        let _ = pipe.read_to_string(&mut text).await;
        *buf.lock() = text;
    })
}

/// Find the tool-call response (id 2) among line-delimited JSON replies.
pub(crate) fn parse_tool_response(stdout: &str) -> RpcReply {
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if value.get("id").and_then(Value::as_i64) != Some(2) {
            continue;
        }
        if let Some(error) = value.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return RpcReply::Error(message);
        }
        return RpcReply::Result(value.get("result").cloned().unwrap_or(Value::Null));
    }
    RpcReply::Error("no response for tool call (id=2)".to_string())
}

/// Whether an error message matches the configured transient pattern
/// (`INGEST_NONFATAL_ERRORS_PATTERN`).
pub fn is_retryable_error(message: &str) -> bool {
    let pattern = envcfg::env_str("INGEST_NONFATAL_ERRORS_PATTERN")
        .unwrap_or_else(|| DEFAULT_RETRYABLE_PATTERN.to_string());
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(message))
        .unwrap_or(false)
}

/// Stable project id: first 16 hex chars of SHA-256 over the normalized
/// git remote URL, falling back to the absolute project root.
pub async fn project_id_hash(project_root: &Path) -> String {
    let source = match Git.remote_origin_url(project_root).await {
        Some(url) => normalize_remote_url(&url),
        None => project_root
            .canonicalize()
            .unwrap_or_else(|_| project_root.to_path_buf())
            .to_string_lossy()
            .to_string(),
    };
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

/// Drop a `.git` suffix and rewrite SSH remotes to HTTPS form so the hash
/// is stable across checkout styles.
pub fn normalize_remote_url(url: &str) -> String {
    let url = url.trim().trim_end_matches(".git");
    if let Some(rest) = url.strip_prefix("git@") {
        if let Some((host, path)) = rest.split_once(':') {
            return format!("https://{host}/{path}");
        }
    }
    url.to_string()
}

fn default_command() -> Vec<String> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    vec![
        "node".to_string(),
        home.join(".claude/mcp-servers/vector-bridge/dist/index.js")
            .to_string_lossy()
            .to_string(),
    ]
}

fn ingest_meta(digest: &Digest, project_root: &Path, id_hash: String) -> Value {
    let project_name = project_root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let mut meta = json!({
        "source": "digest",
        "agent": digest.agent,
        "task_id": digest.task_id,
        "component": "orchestration",
        "category": "digest",
        "type": digest.kind,
        "stage": digest.stage,
        "outcome_status": digest.outcome_status,
        "confidence": digest.confidence,
        "project_root": project_root,
        "project_name": project_name,
        "project_id_hash": id_hash,
        "status": "valid",
    });
    let map = meta.as_object_mut();
    if let Some(map) = map {
        if let Some(problem_type) = &digest.problem_type {
            map.insert("problem_type".into(), json!(problem_type));
        }
        if let Some(solution_pattern) = &digest.solution_pattern {
            map.insert("solution_pattern".into(), json!(solution_pattern));
        }
        if !digest.tech_stack.is_empty() {
            map.insert("tech_stack".into(), json!(digest.tech_stack));
        }
        if !digest.keywords.is_empty() {
            map.insert("keywords".into(), json!(digest.keywords));
        }
    }
    meta
}

#[async_trait]
impl MemoryService for VectorClient {
    async fn ingest(&self, digest: &Digest, project_root: &Path) -> IngestOutcome {
        if !self.credentials.complete() {
            return IngestOutcome::Skipped(SKIP_NOT_CONFIGURED.to_string());
        }
        let text = match scribe_codec::render_ingest_text(digest) {
            Ok(text) => text,
            Err(gate) => return IngestOutcome::Failed(gate.to_string()),
        };
        let meta = ingest_meta(digest, project_root, project_id_hash(project_root).await);
        let arguments = json!({
            "project_root": project_root,
            "path": format!("NOTES.md#digest-{}", digest.task_id),
            "text": text,
            "meta": meta,
        });

        match self.rpc_call("memory_ingest", arguments, self.ingest_timeout).await {
            RpcReply::Result(result) => {
                if let Some(error) = result.get("error").and_then(Value::as_str) {
                    return IngestOutcome::Failed(error.to_string());
                }
                if let Some(skipped) = result.get("skipped").and_then(Value::as_str) {
                    return IngestOutcome::Skipped(skipped.to_string());
                }
                IngestOutcome::Ingested {
                    note: result.get("note").and_then(Value::as_str).map(str::to_string),
                }
            }
            RpcReply::CompletedDespiteTimeout => IngestOutcome::Ingested {
                note: Some("completed_but_mcp_timeout".to_string()),
            },
            RpcReply::Error(message) => IngestOutcome::Failed(message),
        }
    }

    async fn search(
        &self,
        project_root: &Path,
        query: &str,
        k: usize,
        global: bool,
        filters: Option<Value>,
    ) -> Result<Vec<Value>, String> {
        if !self.credentials.complete() {
            return Err(SKIP_NOT_CONFIGURED.to_string());
        }
        let mut arguments = json!({
            "project_root": project_root,
            "query": query,
            "k": k,
            "global": global,
        });
        if let (Some(map), Some(filters)) = (arguments.as_object_mut(), filters) {
            map.insert("filters".into(), filters);
        }

        match self.rpc_call("memory_search", arguments, self.search_timeout).await {
            RpcReply::Result(result) => Ok(parse_search_results(&result)),
            RpcReply::CompletedDespiteTimeout => Ok(Vec::new()),
            RpcReply::Error(message) => Err(message),
        }
    }
}

/// Search results arrive as a JSON body inside `content[0].text`.
pub(crate) fn parse_search_results(result: &Value) -> Vec<Value> {
    let content = match result.get("content") {
        Some(Value::Array(items)) => items.first().cloned().unwrap_or(Value::Null),
        Some(other) => other.clone(),
        None => return Vec::new(),
    };
    let text = match &content {
        Value::Object(_) => content.get("text").and_then(Value::as_str).unwrap_or_default(),
        Value::String(s) => s.as_str(),
        _ => return Vec::new(),
    };
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| body.get("results").and_then(Value::as_array).cloned())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "vector_tests.rs"]
mod tests;
