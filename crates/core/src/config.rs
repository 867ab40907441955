// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run configuration
//!
//! Every knob of a run is fixed before the first actor starts and is read-only
//! afterwards. Defaults reproduce the reference scenario: five actors racing
//! for two slots.

use crate::backoff::BackoffPolicy;
use crate::token::SemaphoreKey;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Parameters passed to the semaphore service on every acquire
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SemaphoreConfig {
    pub key: SemaphoreKey,
    /// How long an unreleased token stays valid
    pub ttl_seconds: u32,
    /// Maximum concurrently outstanding tokens
    pub capacity: u32,
    /// Identifies the caller to the service; diagnostic only
    pub client_label: String,
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self {
            key: SemaphoreKey::new("my-test-lock"),
            ttl_seconds: 60,
            capacity: 2,
            client_label: "concurrency-test".to_string(),
        }
    }
}

impl SemaphoreConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl_seconds))
    }
}

/// Size of the herd and length of the critical section
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub actors: u32,
    #[serde(with = "humantime_serde")]
    pub work_duration: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            actors: 5,
            work_duration: Duration::from_millis(2000),
        }
    }
}

/// Retry budget and backoff shape
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_retries: u32,
    #[serde(with = "humantime_serde")]
    pub backoff_base: Duration,
    #[serde(with = "humantime_serde")]
    pub jitter: Duration,
    /// Seeds per-actor jitter for reproducible runs
    pub seed: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base: Duration::from_millis(200),
            jitter: Duration::from_millis(200),
            seed: None,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.backoff_base, self.jitter)
    }
}

/// Which semaphore service to run against
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process TTL semaphore
    #[default]
    Memory,
    /// Stored procedures in a PostgreSQL database
    Postgres,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Memory => f.write_str("memory"),
            BackendKind::Postgres => f.write_str("postgres"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// PostgreSQL connection string
    pub url: Option<String>,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            url: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Complete configuration of a run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HerdConfig {
    pub semaphore: SemaphoreConfig,
    pub simulation: SimulationConfig,
    pub retry: RetryConfig,
    pub backend: BackendConfig,
}

impl HerdConfig {
    /// Parse configuration from TOML; missing fields take their defaults
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Check the invariants the coordinator relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.semaphore.key.as_str().is_empty() {
            return Err(ConfigError::Invalid("semaphore key must not be empty".into()));
        }
        if self.semaphore.ttl_seconds == 0 {
            return Err(ConfigError::Invalid("ttl_seconds must be positive".into()));
        }
        if self.semaphore.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be positive".into()));
        }
        if self.simulation.actors == 0 {
            return Err(ConfigError::Invalid("actors must be positive".into()));
        }
        if self.retry.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be positive".into()));
        }
        if self.backend.kind == BackendKind::Postgres
            && self.backend.url.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Invalid(
                "postgres backend requires a database url".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
