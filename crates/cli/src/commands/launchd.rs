// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launchd scheduler unit for periodic queue processing.

use std::io;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scribe_core::{envcfg, Paths};
use serde_json::{json, Value};

pub const DEFAULT_INTERVAL_SEC: u64 = 300;

#[allow(clippy::expect_used)]
static LABEL_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9.-]+").expect("constant regex pattern is valid"));
#[allow(clippy::expect_used)]
static LABEL_COLLAPSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.-]{2,}").expect("constant regex pattern is valid"));

/// Project name reduced to launchd's label alphabet.
pub fn sanitize_label(name: &str) -> String {
    let cleaned = LABEL_STRIP_RE.replace_all(name, "-");
    let cleaned = LABEL_COLLAPSE_RE.replace_all(&cleaned, "-");
    let cleaned = cleaned.trim_matches(['.', '-']);
    if cleaned.is_empty() {
        "project".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn project_label(paths: &Paths) -> String {
    let name = paths
        .project_root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string());
    format!("com.scribe.queue.{}", sanitize_label(&name))
}

/// Render the plist for a unit that runs `scribe stop --process-queue`
/// every `interval_sec` seconds with the credential env baked in.
pub fn build_plist(paths: &Paths, interval_sec: u64) -> (String, String, String) {
    let label = project_label(paths);
    let program = std::env::current_exe()
        .unwrap_or_else(|_| PathBuf::from("scribe"))
        .to_string_lossy()
        .to_string();
    let out_log = paths.logs_dir.join("launchd.queue.out.log");
    let err_log = paths.logs_dir.join("launchd.queue.err.log");

    let env_pairs = [
        (
            "ENABLE_VECTOR_RAG",
            envcfg::env_str("ENABLE_VECTOR_RAG").unwrap_or_else(|| "true".into()),
        ),
        ("DATABASE_URL_MEMORY", envcfg::env_str("DATABASE_URL_MEMORY").unwrap_or_default()),
        ("REDIS_URL", envcfg::env_str("REDIS_URL").unwrap_or_default()),
        ("OPENAI_API_KEY", envcfg::env_str("OPENAI_API_KEY").unwrap_or_default()),
        ("WSI_CAP", Paths::wsi_cap().to_string()),
        ("LOGS_DIR", paths.logs_dir.to_string_lossy().to_string()),
        (
            "CLAUDE_PROJECT_DIR",
            paths.project_root.to_string_lossy().to_string(),
        ),
    ];
    let env_items: String = env_pairs
        .iter()
        .map(|(k, v)| format!("<key>{}</key><string>{}</string>", xml_escape(k), xml_escape(v)))
        .collect();

    let plist = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
  <dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
      <string>{program}</string>
      <string>stop</string>
      <string>--process-queue</string>
    </array>
    <key>WorkingDirectory</key>
    <string>{working_dir}</string>
    <key>StartInterval</key>
    <integer>{interval_sec}</integer>
    <key>RunAtLoad</key>
    <true/>
    <key>StandardOutPath</key>
    <string>{out_log}</string>
    <key>StandardErrorPath</key>
    <string>{err_log}</string>
    <key>EnvironmentVariables</key>
    <dict>
      {env_items}
    </dict>
  </dict>
</plist>
"#,
        label = xml_escape(&label),
        program = xml_escape(&program),
        working_dir = xml_escape(&paths.project_root.to_string_lossy()),
        out_log = xml_escape(&out_log.to_string_lossy()),
        err_log = xml_escape(&err_log.to_string_lossy()),
    );
    let filename = format!("{label}.plist");
    (label, plist, filename)
}

/// Write the unit under the state directory; returns (label, path).
pub fn emit(paths: &Paths, interval_sec: u64) -> io::Result<(String, PathBuf)> {
    let (label, plist, filename) = build_plist(paths, interval_sec);
    std::fs::create_dir_all(&paths.launchd_dir)?;
    let path = paths.launchd_dir.join(filename);
    std::fs::write(&path, plist)?;
    Ok((label, path))
}

/// Best-effort unload and removal of the unit, both the LaunchAgents copy
/// and the local one.
pub async fn uninstall(paths: &Paths) -> Value {
    let (label, _, filename) = build_plist(paths, DEFAULT_INTERVAL_SEC);
    let agents_copy = dirs::home_dir()
        .unwrap_or_default()
        .join("Library/LaunchAgents")
        .join(&filename);

    let mut cmd = tokio::process::Command::new("launchctl");
    cmd.args(["unload", "-w"]).arg(&agents_copy);
    let _ = scribe_adapters::run_with_timeout(cmd, Duration::from_secs(5), "launchctl unload").await;

    let removed_from_agents = std::fs::remove_file(&agents_copy).is_ok();
    let _ = std::fs::remove_file(paths.launchd_dir.join(&filename));

    json!({
        "ok": true,
        "unloaded": true,
        "removed_from_LaunchAgents": removed_from_agents,
        "label": label,
        "plist_filename": filename,
    })
}

#[cfg(test)]
#[path = "launchd_tests.rs"]
mod tests;
