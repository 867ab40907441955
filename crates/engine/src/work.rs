// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The critical section an actor runs while holding a token

use async_trait::async_trait;
use herd_core::{ActorId, Token};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("{0}")]
    Failed(String),
    #[error("work task panicked: {0}")]
    Panicked(String),
}

/// Work performed inside the semaphore.
///
/// Taking the token by reference means the critical section can only be
/// entered by a caller that holds one.
#[async_trait]
pub trait CriticalSection: Send + Sync + 'static {
    async fn perform(&self, actor: ActorId, token: &Token) -> Result<(), WorkError>;
}

/// Holds the slot for a fixed duration without touching the service
#[derive(Clone, Copy, Debug)]
pub struct SleepWork {
    duration: Duration,
}

impl SleepWork {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl CriticalSection for SleepWork {
    async fn perform(&self, _actor: ActorId, _token: &Token) -> Result<(), WorkError> {
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}
