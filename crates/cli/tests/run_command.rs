// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for `herd run`

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use common::{quick_run, Scratch};
use predicates::prelude::*;

#[test]
fn prints_summary_for_single_attempt_herd() {
    quick_run()
        .args(["--actors", "3", "--capacity", "1", "--max-retries", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("THUNDERING HERD SIMULATION SUMMARY"))
        .stdout(predicate::str::contains("Total Actors           : 3"))
        .stdout(predicate::str::contains("Semaphore Capacity     : 1"))
        .stdout(predicate::str::contains("Successful Entrants    : 1"))
        .stdout(predicate::str::contains("Failed                 : 2"))
        .stdout(predicate::str::contains("(attempts=1)"));
}

#[test]
fn failures_do_not_change_exit_status() {
    quick_run()
        .args(["--actors", "4", "--capacity", "1", "--max-retries", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed                 : 3"));
}

#[test]
fn json_report_accounts_for_every_actor() {
    let output = quick_run()
        .args([
            "--actors",
            "6",
            "--capacity",
            "2",
            "--max-retries",
            "50",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["actor_count"], 6);
    assert_eq!(report["capacity"], 2);
    let successes = report["successes"].as_array().unwrap();
    let failures = report["failures"].as_array().unwrap();
    assert_eq!(successes.len() + failures.len(), 6);
    assert_eq!(successes.len(), 6);
    assert!(successes.iter().all(|o| o["released"] == true));
}

#[test]
fn config_file_supplies_parameters() {
    let scratch = Scratch::new();
    let config = scratch.file(
        "herd.toml",
        r#"
[semaphore]
key = "file-lock"
capacity = 2

[simulation]
actors = 2
work_duration = "10ms"

[retry]
max_retries = 1
"#,
    );

    common::herd()
        .args(["run", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Actors           : 2"))
        .stdout(predicate::str::contains("Successful Entrants    : 2"));
}

#[test]
fn flags_override_config_file() {
    let scratch = Scratch::new();
    let config = scratch.file(
        "herd.toml",
        "[simulation]\nactors = 9\nwork_duration = \"10ms\"\n",
    );

    quick_run()
        .arg("--config")
        .arg(&config)
        .args(["--actors", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Actors           : 1"));
}

#[test]
fn log_file_receives_run_logs() {
    let scratch = Scratch::new();
    let log = scratch.path().join("logs").join("herd.log");

    quick_run()
        .env("RUST_LOG", "info")
        .args(["--actors", "2", "--capacity", "2"])
        .arg("--log-file")
        .arg(&log)
        .assert()
        .success()
        .stderr(predicate::str::contains("acquired").not());

    let logs = std::fs::read_to_string(&log).unwrap();
    assert!(logs.contains("thundering herd simulation started"));
    assert!(logs.contains("acquired"));
}
