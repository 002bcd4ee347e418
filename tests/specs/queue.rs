// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue worker specs: drain classification, retry-dead, status, launchd.

use serial_test::serial;

use crate::prelude::*;

fn seed_one_job(temp: &Project) {
    temp.scribe()
        .args(&["hook", "stop"])
        .stdin(stop_payload("RC", "t-1"))
        .passes();
    assert_eq!(temp.queued_jobs().len(), 1);
}

#[test]
fn queue_status_reports_counts_and_config() {
    let temp = Project::empty();
    seed_one_job(&temp);
    temp.scribe()
        .args(&["hook", "stop", "--queue-status"])
        .passes()
        .stdout_has("\"queued\": 1")
        .stdout_has("\"dead\": 0")
        .stdout_has("\"INGEST_MAX_ATTEMPTS\": 6");
}

#[test]
fn drain_with_vector_disabled_is_a_noop_with_warning() {
    let temp = Project::empty();
    seed_one_job(&temp);
    temp.scribe()
        .args(&["hook", "stop", "--process-queue"])
        .passes()
        .stdout_has("\"processed\": 0");
    assert_eq!(temp.queued_jobs().len(), 1);
    assert!(temp.read_state("logs/WARNINGS.md").contains("ENABLE_VECTOR_RAG=false"));
}

#[test]
fn drain_without_credentials_skips_and_warns() {
    let temp = Project::empty();
    seed_one_job(&temp);

    temp.scribe()
        .args(&["hook", "stop", "--process-queue"])
        .env("ENABLE_VECTOR_RAG", "true")
        .passes()
        .stdout_has("\"skipped_no_creds\": 1")
        .stdout_has("\"succeeded\": 0");

    // The job stays queued and the attempt was not counted.
    let jobs = temp.queued_jobs();
    assert_eq!(jobs.len(), 1);
    let job: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&jobs[0]).unwrap()).unwrap();
    assert_eq!(job["attempt_count"], 0);
    assert_eq!(job["status"], "queued");
    assert!(temp.read_state("logs/WARNINGS.md").contains("credentials are missing"));
}

#[test]
#[serial]
fn drain_timeout_is_classified_retryable() {
    let temp = Project::empty();
    seed_one_job(&temp);

    temp.scribe()
        .args(&["hook", "stop", "--process-queue"])
        .env("ENABLE_VECTOR_RAG", "true")
        .env("DATABASE_URL_MEMORY", "postgres://memory")
        .env("REDIS_URL", "redis://cache")
        .env("OPENAI_API_KEY", "sk-test")
        .env("VECTOR_BRIDGE_CMD", "sleep 60")
        .env("INGEST_MCP_TIMEOUT_SEC", "1")
        .passes()
        .stdout_has("\"processed\": 1")
        .stdout_has("\"failed\": 0");

    let jobs = temp.queued_jobs();
    assert_eq!(jobs.len(), 1, "retryable job stays queued");
    let job: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&jobs[0]).unwrap()).unwrap();
    assert_eq!(job["attempt_count"], 0, "attempt increment reverted");
    assert!(job["last_error"].as_str().unwrap().contains("timed out"));
    assert!(job["last_attempt"].is_string());
}

#[test]
#[serial]
fn drain_success_removes_the_job() {
    let temp = Project::empty();
    seed_one_job(&temp);

    // Stub bridge: consume stdin, answer the tool call.
    temp.file(
        "bridge.sh",
        "#!/bin/sh\ncat > /dev/null\necho '{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}'\necho '{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"chunks\":2}}'\n",
    );

    temp.scribe()
        .args(&["hook", "stop", "--process-queue"])
        .env("ENABLE_VECTOR_RAG", "true")
        .env("DATABASE_URL_MEMORY", "postgres://memory")
        .env("REDIS_URL", "redis://cache")
        .env("OPENAI_API_KEY", "sk-test")
        .env(
            "VECTOR_BRIDGE_CMD",
            &format!("sh {}", temp.path().join("bridge.sh").display()),
        )
        .passes()
        .stdout_has("\"succeeded\": 1");

    assert!(temp.queued_jobs().is_empty());
    assert!(temp.dead_jobs().is_empty());
}

#[test]
fn retry_dead_moves_jobs_back_to_queue() {
    let temp = Project::empty();
    seed_one_job(&temp);

    // Manufacture a dead job out of the queued one.
    let queued = temp.queued_jobs();
    let mut job: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&queued[0]).unwrap()).unwrap();
    job["status"] = serde_json::json!("dead");
    job["attempt_count"] = serde_json::json!(6);
    job["last_error"] = serde_json::json!("invalid payload shape");
    let name = queued[0].file_name().unwrap().to_string_lossy().to_string();
    std::fs::create_dir_all(temp.state_path("ingest-queue/dead")).unwrap();
    std::fs::write(
        temp.state_path(&format!("ingest-queue/dead/{name}")),
        serde_json::to_string_pretty(&job).unwrap(),
    )
    .unwrap();
    std::fs::remove_file(&queued[0]).unwrap();

    temp.scribe()
        .args(&["hook", "stop", "--retry-dead"])
        .passes()
        .stdout_has("\"moved\": 1");

    assert!(temp.dead_jobs().is_empty());
    let revived = temp.queued_jobs();
    assert_eq!(revived.len(), 1);
    let job: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&revived[0]).unwrap()).unwrap();
    assert_eq!(job["status"], "queued");
    assert_eq!(job["attempt_count"], 0);
    assert!(job["last_error"].is_null());
}

#[test]
fn launchd_unit_round_trip() {
    let temp = Project::empty();
    let stdout = temp
        .scribe()
        .args(&["hook", "stop", "--emit-launchd-plist", "600"])
        .passes()
        .stdout_has("\"ok\": true")
        .stdout_has("\"interval_sec\": 600")
        .stdout();

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let plist_path = parsed["plist_path"].as_str().unwrap();
    let plist = std::fs::read_to_string(plist_path).unwrap();
    assert!(plist.contains("--process-queue"));
    assert!(plist.contains("<integer>600</integer>"));

    temp.scribe()
        .args(&["hook", "stop", "--uninstall-launchd"])
        .passes()
        .stdout_has("\"ok\": true");
    assert!(!std::path::Path::new(plist_path).exists());
}
