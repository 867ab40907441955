// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry backoff with linear growth and bounded jitter
//!
//! The delay before retrying after attempt `k` is `base * k` plus a uniform
//! draw from `[0, jitter)`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    jitter: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    /// Half-open range `[lo, hi)` the delay after `attempt` falls in.
    ///
    /// With zero jitter the range collapses to `lo == hi` and the delay is
    /// exactly `lo`.
    pub fn bounds(&self, attempt: u32) -> (Duration, Duration) {
        let lo = self.base.saturating_mul(attempt);
        (lo, lo.saturating_add(self.jitter))
    }

    /// Delay before the retry following `attempt` (1-based)
    pub fn delay(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let (lo, _) = self.bounds(attempt);
        lo.saturating_add(self.sample_jitter(rng))
    }

    fn sample_jitter(&self, rng: &mut impl Rng) -> Duration {
        let span = u64::try_from(self.jitter.as_nanos()).unwrap_or(u64::MAX);
        if span == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rng.random_range(0..span))
    }
}

/// Independent random source for one actor.
///
/// With a run seed, actor `n` is seeded with `seed + n` so runs replay the
/// same jitter; without one every actor draws its own OS entropy.
pub fn actor_rng(seed: Option<u64>, actor: u32) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(actor))),
        None => StdRng::from_os_rng(),
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
