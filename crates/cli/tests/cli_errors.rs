// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for fatal errors and help output

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use common::{herd, quick_run, Scratch};
use predicates::prelude::*;

#[test]
fn zero_capacity_is_fatal() {
    quick_run()
        .args(["--capacity", "0"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("error: Invalid configuration"))
        .stderr(predicate::str::contains("capacity must be positive"));
}

#[test]
fn unknown_config_key_is_fatal() {
    let scratch = Scratch::new();
    let config = scratch.file("herd.toml", "[simulation]\nactorz = 3\n");

    herd()
        .args(["run", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown field"));
}

#[test]
fn missing_config_file_is_fatal() {
    herd()
        .args(["run", "--config", "/nonexistent/herd.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read config"));
}

#[test]
fn postgres_without_url_is_fatal() {
    herd()
        .args(["run", "--backend", "postgres"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "postgres backend requires a database url",
        ));
}

#[test]
fn malformed_database_url_is_fatal() {
    herd()
        .args(["run", "--backend", "postgres", "--database-url", "invalid-url"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("postgres semaphore backend"));
}

#[test]
fn bad_duration_flag_is_rejected() {
    herd()
        .args(["run", "--work-duration", "forever"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--work-duration"));
}

#[test]
fn help_lists_subcommands() {
    herd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("schema"));
}
