// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::semaphore::{SemaphoreClient, SemaphoreConnector, TransportError};
use async_trait::async_trait;
use herd_core::{SemaphoreKey, Token};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::Instrument;

/// Wrapper that adds tracing to any SemaphoreConnector
#[derive(Clone)]
pub struct TracedSemaphoreConnector<K> {
    inner: K,
    opened: Arc<AtomicU64>,
}

impl<K> TracedSemaphoreConnector<K> {
    pub fn new(inner: K) -> Self {
        Self {
            inner,
            opened: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn into_inner(self) -> K {
        self.inner
    }
}

#[async_trait]
impl<K: SemaphoreConnector> SemaphoreConnector for TracedSemaphoreConnector<K> {
    type Client = TracedSemaphoreClient<K::Client>;

    async fn connect(&self) -> Result<Self::Client, TransportError> {
        let start = std::time::Instant::now();
        let result = self.inner.connect().await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(inner) => {
                let connection = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!(connection, elapsed_ms, "semaphore connection opened");
                Ok(TracedSemaphoreClient { inner, connection })
            }
            Err(e) => {
                tracing::error!(elapsed_ms, error = %e, "semaphore connection failed");
                Err(e)
            }
        }
    }
}

/// Wrapper that adds tracing to any SemaphoreClient
pub struct TracedSemaphoreClient<C> {
    inner: C,
    connection: u64,
}

impl<C> TracedSemaphoreClient<C> {
    pub fn connection(&self) -> u64 {
        self.connection
    }
}

#[async_trait]
impl<C: SemaphoreClient> SemaphoreClient for TracedSemaphoreClient<C> {
    async fn attempt_acquire(
        &self,
        key: &SemaphoreKey,
        ttl_seconds: u32,
        capacity: u32,
        client_label: &str,
    ) -> Result<Option<Token>, TransportError> {
        let span = tracing::debug_span!(
            "semaphore.acquire",
            connection = self.connection,
            %key,
            ttl_seconds,
            capacity
        );

        async move {
            let start = std::time::Instant::now();
            let result = self
                .inner
                .attempt_acquire(key, ttl_seconds, capacity, client_label)
                .await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(Some(token)) => tracing::debug!(%token, elapsed_ms, "granted"),
                Ok(None) => tracing::debug!(elapsed_ms, "at capacity"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "acquire failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn release(&self, key: &SemaphoreKey, token: &Token) -> Result<bool, TransportError> {
        let span = tracing::debug_span!(
            "semaphore.release",
            connection = self.connection,
            %key,
            %token
        );

        async move {
            let start = std::time::Instant::now();
            let result = self.inner.release(key, token).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            // false is an expected answer (token lapsed), not a failure
            match &result {
                Ok(true) => tracing::debug!(elapsed_ms, "released"),
                Ok(false) => tracing::debug!(elapsed_ms, "token no longer valid"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "release failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
