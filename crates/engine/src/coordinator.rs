// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator: spawns the herd, joins it, and builds the report

use crate::actor::{Actor, RunPlan};
use crate::error::StartupError;
use crate::work::{CriticalSection, SleepWork};
use herd_adapters::SemaphoreConnector;
use herd_core::{ActorId, ActorOutcome, HerdConfig, ResultSet, RunReport};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Drives one run of `actors` concurrent contenders
pub struct Coordinator<K, W = SleepWork> {
    connector: K,
    work: Arc<W>,
    plan: Arc<RunPlan>,
    actors: u32,
    work_duration: Duration,
}

impl<K: SemaphoreConnector> Coordinator<K, SleepWork> {
    /// Coordinator whose actors hold their slot for the configured work duration
    pub fn from_config(connector: K, config: &HerdConfig) -> Self {
        let work = SleepWork::new(config.simulation.work_duration);
        Self::new(connector, config, work)
    }
}

impl<K: SemaphoreConnector, W: CriticalSection> Coordinator<K, W> {
    pub fn new(connector: K, config: &HerdConfig, work: W) -> Self {
        Self {
            connector,
            work: Arc::new(work),
            plan: Arc::new(RunPlan::from_config(config)),
            actors: config.simulation.actors,
            work_duration: config.simulation.work_duration,
        }
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    pub fn into_connector(self) -> K {
        self.connector
    }

    /// Run every actor to a terminal state and report.
    ///
    /// All connections are opened before the first actor starts; failing to
    /// open any of them aborts the run without partial results.
    pub async fn run(&self) -> Result<RunReport, StartupError> {
        tracing::info!(
            actors = self.actors,
            capacity = self.plan.capacity,
            max_retries = self.plan.max_retries,
            work_ms = self.work_duration.as_millis() as u64,
            backoff_base_ms = self.plan.backoff.base().as_millis() as u64,
            jitter_ms = self.plan.backoff.jitter().as_millis() as u64,
            key = %self.plan.key,
            "thundering herd simulation started"
        );

        let mut clients = Vec::with_capacity(self.actors as usize);
        for n in 1..=self.actors {
            let actor = ActorId(n);
            let client = self
                .connector
                .connect()
                .await
                .map_err(|source| StartupError::Connect { actor, source })?;
            clients.push((actor, client));
        }

        let results = ResultSet::new();
        let started = Instant::now();

        let handles: Vec<_> = clients
            .into_iter()
            .map(|(id, client)| {
                let actor = Actor::new(id, client, Arc::clone(&self.plan), Arc::clone(&self.work));
                let attempts = actor.attempt_counter();
                let results = results.clone();
                let handle = tokio::spawn(async move {
                    let outcome = actor.run().await;
                    results.record(outcome);
                });
                (id, attempts, handle)
            })
            .collect();

        // Join barrier: the report is only built once every actor has finished.
        for (id, attempts, handle) in handles {
            if let Err(e) = handle.await {
                let attempts = attempts.load(Ordering::SeqCst);
                tracing::error!(actor = id.0, attempts, error = %e, "actor task failed");
                if !results.contains(id) {
                    results.record(ActorOutcome::errored(
                        id,
                        attempts,
                        format!("actor task failed: {}", e),
                    ));
                }
            }
        }

        let report = results.into_report(self.actors, self.plan.capacity, started.elapsed());
        tracing::info!(
            successes = report.success_count(),
            failures = report.failure_count(),
            late_releases = report.late_releases(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "thundering herd simulation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
