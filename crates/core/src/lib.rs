// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herd-core: pure building blocks for the thundering-herd harness
//!
//! This crate provides:
//! - The TTL semaphore state machine backing the in-memory service
//! - Run configuration and the backoff policy
//! - Actor outcomes and the aggregated run report

pub mod backoff;
pub mod clock;
pub mod config;
pub mod outcome;
pub mod semaphore;
pub mod token;

pub use backoff::{actor_rng, BackoffPolicy};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    BackendConfig, BackendKind, ConfigError, HerdConfig, RetryConfig, SemaphoreConfig,
    SimulationConfig,
};
pub use outcome::{ActorId, ActorOutcome, ResultSet, RunReport};
pub use semaphore::{Holder, SemaphoreEvent, SemaphoreInput, TtlSemaphore};
pub use token::{SemaphoreKey, SequentialTokenGen, Token, TokenGen, UuidTokenGen};
