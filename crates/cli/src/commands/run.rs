// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `herd run` - Run a thundering herd against a semaphore service

use crate::error::HerdError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::{Args, ValueEnum};
use herd_adapters::{
    MemorySemaphoreService, PostgresSemaphore, SemaphoreConnector, TracedSemaphoreConnector,
};
use herd_core::{BackendKind, ConfigError, HerdConfig, RunReport, SemaphoreKey};
use herd_engine::{Coordinator, StartupError};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// In-process TTL semaphore
    Memory,
    /// Stored procedures in PostgreSQL
    Postgres,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Memory => BackendKind::Memory,
            BackendArg::Postgres => BackendKind::Postgres,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// TOML config file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Semaphore service to run against
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// PostgreSQL connection string [env: DATABASE_URL]
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Semaphore key every actor contends for
    #[arg(long)]
    pub key: Option<String>,

    /// Token lifetime in seconds
    #[arg(long, value_name = "SECS")]
    pub ttl: Option<u32>,

    /// Maximum concurrently held tokens
    #[arg(long)]
    pub capacity: Option<u32>,

    /// Label sent with every acquire
    #[arg(long)]
    pub client_label: Option<String>,

    /// Number of concurrent actors
    #[arg(long)]
    pub actors: Option<u32>,

    /// Time spent inside the critical section (e.g. "2s", "500ms")
    #[arg(long, value_name = "DUR", value_parser = humantime::parse_duration)]
    pub work_duration: Option<Duration>,

    /// Acquire attempts per actor before giving up
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Backoff after attempt k is k times this
    #[arg(long, value_name = "DUR", value_parser = humantime::parse_duration)]
    pub backoff_base: Option<Duration>,

    /// Upper bound of random extra backoff
    #[arg(long, value_name = "DUR", value_parser = humantime::parse_duration)]
    pub jitter: Option<Duration>,

    /// Seed for reproducible jitter
    #[arg(long)]
    pub seed: Option<u64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl RunArgs {
    /// Merge defaults, the config file, `env_url`, and flags, in rising precedence
    pub fn resolve(&self, env_url: Option<String>) -> Result<HerdConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => HerdConfig::load(path)?,
            None => HerdConfig::default(),
        };

        if let Some(url) = env_url.filter(|u| !u.is_empty()) {
            config.backend.url = Some(url);
        }

        if let Some(backend) = self.backend {
            config.backend.kind = backend.into();
        }
        if let Some(url) = &self.database_url {
            config.backend.url = Some(url.clone());
        }
        if let Some(key) = &self.key {
            config.semaphore.key = SemaphoreKey::new(key.as_str());
        }
        if let Some(ttl) = self.ttl {
            config.semaphore.ttl_seconds = ttl;
        }
        if let Some(capacity) = self.capacity {
            config.semaphore.capacity = capacity;
        }
        if let Some(label) = &self.client_label {
            config.semaphore.client_label = label.clone();
        }
        if let Some(actors) = self.actors {
            config.simulation.actors = actors;
        }
        if let Some(work) = self.work_duration {
            config.simulation.work_duration = work;
        }
        if let Some(max_retries) = self.max_retries {
            config.retry.max_retries = max_retries;
        }
        if let Some(base) = self.backoff_base {
            config.retry.backoff_base = base;
        }
        if let Some(jitter) = self.jitter {
            config.retry.jitter = jitter;
        }
        if self.seed.is_some() {
            config.retry.seed = self.seed;
        }

        config.validate()?;
        Ok(config)
    }
}

pub async fn run(args: RunArgs) -> Result<()> {
    let config = args
        .resolve(std::env::var("DATABASE_URL").ok())
        .map_err(HerdError::invalid_config)?;

    let report = match config.backend.kind {
        BackendKind::Memory => {
            let (report, _) = execute(MemorySemaphoreService::new(), &config).await;
            report
        }
        BackendKind::Postgres => {
            let url = config
                .backend
                .url
                .as_deref()
                .ok_or_else(HerdError::missing_database_url)?;
            let pool = PostgresSemaphore::open(
                url,
                config.simulation.actors,
                config.backend.connect_timeout,
            )
            .await
            .map_err(HerdError::backend_unavailable)?;
            let (report, pool) = execute(pool, &config).await;
            pool.close().await;
            report
        }
    }
    .map_err(HerdError::startup_failed)?;

    output::print(&report, args.format)?;
    Ok(())
}

/// Run the herd through a traced connector, handing the connector back
async fn execute<K: SemaphoreConnector>(
    connector: K,
    config: &HerdConfig,
) -> (Result<RunReport, StartupError>, K) {
    tracing::info!(backend = %config.backend.kind, "using semaphore backend");
    let coordinator = Coordinator::from_config(TracedSemaphoreConnector::new(connector), config);
    let report = coordinator.run().await;
    (report, coordinator.into_connector().into_inner())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
