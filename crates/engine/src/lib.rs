// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Thundering herd coordination engine

mod actor;
mod coordinator;
mod error;
mod work;

pub use actor::{Actor, RunPlan};
pub use coordinator::Coordinator;
pub use error::{ActorError, StartupError};
pub use work::{CriticalSection, SleepWork, WorkError};
