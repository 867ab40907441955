// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore service adapters
//!
//! A [`SemaphoreConnector`] opens one [`SemaphoreClient`] per actor. Each
//! client owns its own connection, so no two actors ever serialize on the
//! same handle.

mod memory;
mod postgres;

pub use memory::{MemorySemaphoreClient, MemorySemaphoreService};
pub use postgres::{PostgresSemaphore, PostgresSemaphoreClient, SCHEMA_SQL};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSemaphore, FakeSemaphoreClient, SemaphoreCall};

use async_trait::async_trait;
use herd_core::{SemaphoreKey, Token};
use thiserror::Error;

/// Failure to talk to the semaphore service.
///
/// Distinct from "at capacity" (`Ok(None)` from acquire) and from "token
/// already invalid" (`Ok(false)` from release), which are normal answers.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("connection closed")]
    Closed,
}

/// Errors from setting up a backend before any actor starts
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid database url: {0}")]
    InvalidUrl(String),
    #[error("failed to open connection pool: {0}")]
    Pool(String),
    #[error("failed to install schema: {0}")]
    Schema(String),
}

/// One actor's handle to the semaphore service
#[async_trait]
pub trait SemaphoreClient: Send + Sync + 'static {
    /// Single non-blocking probe for one unit of capacity.
    ///
    /// Returns `Ok(None)` when the semaphore is at capacity. Never retries.
    async fn attempt_acquire(
        &self,
        key: &SemaphoreKey,
        ttl_seconds: u32,
        capacity: u32,
        client_label: &str,
    ) -> Result<Option<Token>, TransportError>;

    /// Give back a held token.
    ///
    /// Returns `Ok(false)` if the token had already lapsed or was unknown.
    async fn release(&self, key: &SemaphoreKey, token: &Token) -> Result<bool, TransportError>;
}

/// Opens dedicated clients, one per actor
#[async_trait]
pub trait SemaphoreConnector: Send + Sync + 'static {
    type Client: SemaphoreClient;

    async fn connect(&self) -> Result<Self::Client, TransportError>;
}
