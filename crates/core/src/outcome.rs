// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-actor outcomes and the aggregated run report

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 1-based identifier of an actor within a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal record of one actor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorOutcome {
    pub actor_id: ActorId,
    /// Acquire calls made; at least 1, except for an actor whose task died
    /// before its first call
    pub attempts: u32,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Release result for actors that held a token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<bool>,
}

impl ActorOutcome {
    /// Finished the critical section and called release
    pub fn succeeded(actor_id: ActorId, attempts: u32, released: bool) -> Self {
        Self {
            actor_id,
            attempts,
            succeeded: true,
            error: None,
            released: Some(released),
        }
    }

    /// Ran out of retries without a token
    pub fn given_up(actor_id: ActorId, attempts: u32) -> Self {
        Self {
            actor_id,
            attempts,
            succeeded: false,
            error: None,
            released: None,
        }
    }

    /// Abandoned on a transport or work failure
    pub fn errored(actor_id: ActorId, attempts: u32, error: impl Into<String>) -> Self {
        Self {
            actor_id,
            attempts,
            succeeded: false,
            error: Some(error.into()),
            released: None,
        }
    }

    /// A success whose token had already lapsed by release time
    pub fn released_late(&self) -> bool {
        self.succeeded && self.released == Some(false)
    }
}

impl fmt::Display for ActorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor {} (attempts={})", self.actor_id, self.attempts)?;
        if self.released_late() {
            write!(f, " [token expired before release]")?;
        }
        if let Some(error) = &self.error {
            write!(f, " error: {}", error)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Outcomes {
    successes: Vec<ActorOutcome>,
    failures: Vec<ActorOutcome>,
}

/// Append-only collection of outcomes shared by every actor of a run.
///
/// Clones share the same storage. Appends hold the lock only for the push.
#[derive(Clone, Debug, Default)]
pub struct ResultSet {
    inner: Arc<Mutex<Outcomes>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: ActorOutcome) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if outcome.succeeded {
            inner.successes.push(outcome);
        } else {
            inner.failures.push(outcome);
        }
    }

    /// Outcomes recorded so far
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.successes.len() + inner.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `actor` already has an outcome
    pub fn contains(&self, actor: ActorId) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .successes
            .iter()
            .chain(inner.failures.iter())
            .any(|o| o.actor_id == actor)
    }

    /// Drain into a report; call only once every actor has terminated
    pub fn into_report(self, actor_count: u32, capacity: u32, elapsed: Duration) -> RunReport {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let outcomes = std::mem::take(&mut *inner);
        RunReport {
            actor_count,
            capacity,
            successes: outcomes.successes,
            failures: outcomes.failures,
            elapsed,
        }
    }
}

/// Aggregate result of a run, in completion order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub actor_count: u32,
    pub capacity: u32,
    pub successes: Vec<ActorOutcome>,
    pub failures: Vec<ActorOutcome>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl RunReport {
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Every actor is accounted for exactly once
    pub fn is_complete(&self) -> bool {
        self.success_count() + self.failure_count() == self.actor_count as usize
    }

    /// Successes whose token lapsed during the critical section
    pub fn late_releases(&self) -> usize {
        self.successes.iter().filter(|o| o.released_late()).count()
    }

    /// Look up an actor's outcome
    pub fn outcome(&self, actor: ActorId) -> Option<&ActorOutcome> {
        self.successes
            .iter()
            .chain(self.failures.iter())
            .find(|o| o.actor_id == actor)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(40);
        writeln!(f, "{}", rule)?;
        writeln!(f, " THUNDERING HERD SIMULATION SUMMARY")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total Actors           : {}", self.actor_count)?;
        writeln!(f, "Semaphore Capacity     : {}", self.capacity)?;
        writeln!(f, "Successful Entrants    : {}", self.success_count())?;
        writeln!(f, "Failed                 : {}", self.failure_count())?;
        writeln!(f, "Elapsed                : {}ms", self.elapsed.as_millis())?;
        if self.late_releases() > 0 {
            writeln!(
                f,
                "Expired Before Release : {} (TTL shorter than critical section?)",
                self.late_releases()
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Successful Actors:")?;
        for outcome in &self.successes {
            writeln!(f, "  - {}", outcome)?;
        }

        writeln!(f)?;
        writeln!(f, "Failed Actors:")?;
        for outcome in &self.failures {
            writeln!(f, "  - {}", outcome)?;
        }
        write!(f, "{}", rule)
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
