// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]
#![allow(deprecated)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory for config and log files
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the scratch root and return its path
    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }
}

/// `herd` with a clean environment: quiet logs, no database
pub fn herd() -> Command {
    let mut cmd = Command::cargo_bin("herd").expect("herd binary should be built");
    cmd.env("RUST_LOG", "warn").env_remove("DATABASE_URL");
    cmd
}

/// `herd run` on the in-memory backend with sub-second timings
pub fn quick_run() -> Command {
    let mut cmd = herd();
    cmd.args([
        "run",
        "--backend",
        "memory",
        "--work-duration",
        "20ms",
        "--backoff-base",
        "5ms",
        "--jitter",
        "5ms",
        "--seed",
        "7",
    ]);
    cmd
}
