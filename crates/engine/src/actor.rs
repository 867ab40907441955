// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Actor life cycle: acquire with backoff, work, release
//!
//! ```text
//! Trying --token--> Working --> Releasing --> Succeeded
//!   |  \
//!   |   `--retries exhausted--> GivenUp
//!   `--transport error (any step)--> Errored
//! ```

use crate::error::ActorError;
use crate::work::{CriticalSection, WorkError};
use herd_adapters::{SemaphoreClient, TransportError};
use herd_core::{actor_rng, ActorId, ActorOutcome, BackoffPolicy, HerdConfig, SemaphoreKey, Token};
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::Instrument;

/// Parameters shared read-only by every actor of a run
#[derive(Clone, Debug)]
pub struct RunPlan {
    pub key: SemaphoreKey,
    pub ttl_seconds: u32,
    pub capacity: u32,
    pub client_label: String,
    pub max_retries: u32,
    pub backoff: BackoffPolicy,
    pub seed: Option<u64>,
}

impl RunPlan {
    pub fn from_config(config: &HerdConfig) -> Self {
        Self {
            key: config.semaphore.key.clone(),
            ttl_seconds: config.semaphore.ttl_seconds,
            capacity: config.semaphore.capacity,
            client_label: config.semaphore.client_label.clone(),
            max_retries: config.retry.max_retries,
            backoff: config.retry.backoff(),
            seed: config.retry.seed,
        }
    }
}

/// One contender, owning its own client and random source
pub struct Actor<C, W> {
    id: ActorId,
    client: C,
    plan: Arc<RunPlan>,
    work: Arc<W>,
    rng: StdRng,
    attempts: Arc<AtomicU32>,
}

impl<C: SemaphoreClient, W: CriticalSection> Actor<C, W> {
    pub fn new(id: ActorId, client: C, plan: Arc<RunPlan>, work: Arc<W>) -> Self {
        let rng = actor_rng(plan.seed, id.0);
        Self {
            id,
            client,
            plan,
            work,
            rng,
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Live attempt count, readable after the actor's task is gone
    pub fn attempt_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.attempts)
    }

    /// Run to a terminal state. Never fails: every error becomes an outcome.
    pub async fn run(mut self) -> ActorOutcome {
        let span = tracing::info_span!("actor", id = self.id.0);
        async move {
            tracing::info!("started");
            let mut attempts = 0;
            match self.lifecycle(&mut attempts).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(attempts, error = %e, "abandoned");
                    ActorOutcome::errored(self.id, attempts, e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn lifecycle(&mut self, attempts: &mut u32) -> Result<ActorOutcome, ActorError> {
        let Some(token) = self.acquire(attempts).await? else {
            tracing::info!(attempts = *attempts, "giving up");
            return Ok(ActorOutcome::given_up(self.id, *attempts));
        };

        let work = self.critical_section(&token).await;

        // Release on every path out of the critical section.
        let released = self.client.release(&self.plan.key, &token).await;
        if let Err(e) = work {
            if let Err(release_err) = &released {
                tracing::warn!(error = %release_err, "release after failed work also failed");
            }
            return Err(e.into());
        }

        let released = released?;
        if released {
            tracing::info!(%token, "released");
        } else {
            tracing::warn!(%token, "release rejected, token expired before release");
        }
        Ok(ActorOutcome::succeeded(self.id, *attempts, released))
    }

    /// Trying: probe until a token is granted or the budget runs out
    async fn acquire(&mut self, attempts: &mut u32) -> Result<Option<Token>, TransportError> {
        let plan = Arc::clone(&self.plan);
        while *attempts < plan.max_retries {
            *attempts += 1;
            self.attempts.store(*attempts, Ordering::SeqCst);
            tracing::info!(
                attempt = *attempts,
                max_retries = plan.max_retries,
                "attempting to acquire"
            );

            let granted = self
                .client
                .attempt_acquire(&plan.key, plan.ttl_seconds, plan.capacity, &plan.client_label)
                .await?;
            if let Some(token) = granted {
                tracing::info!(%token, attempt = *attempts, "acquired");
                return Ok(Some(token));
            }

            let delay = plan.backoff.delay(*attempts, &mut self.rng);
            tracing::info!(
                attempt = *attempts,
                backoff_ms = delay.as_millis() as u64,
                "at capacity, backing off"
            );
            tokio::time::sleep(delay).await;
        }
        Ok(None)
    }

    /// Working: the critical section runs in its own task so a panic inside
    /// it still comes back here for release.
    async fn critical_section(&self, token: &Token) -> Result<(), WorkError> {
        tracing::info!("working");
        let work = Arc::clone(&self.work);
        let id = self.id;
        let held = token.clone();
        let task = async move { work.perform(id, &held).await };
        let result = tokio::spawn(task.instrument(tracing::Span::current()))
            .await
            .map_err(|e| WorkError::Panicked(e.to_string()))?;
        if result.is_ok() {
            tracing::info!("work completed");
        }
        result
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
