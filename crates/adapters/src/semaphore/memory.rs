// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process semaphore service
//!
//! Keeps one [`TtlSemaphore`] per key behind a mutex. Every call is a single
//! atomic transition, the same guarantee the database procedures give by
//! running in their own transaction.

use super::{SemaphoreClient, SemaphoreConnector, TransportError};
use async_trait::async_trait;
use herd_core::semaphore::{granted, released};
use herd_core::{
    Clock, SemaphoreEvent, SemaphoreInput, SemaphoreKey, SystemClock, Token, TokenGen,
    TtlSemaphore, UuidTokenGen,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Semaphores = HashMap<SemaphoreKey, TtlSemaphore>;

/// Shared in-memory service; clones refer to the same semaphores
#[derive(Clone)]
pub struct MemorySemaphoreService<C: Clock = SystemClock, G: TokenGen = UuidTokenGen> {
    semaphores: Arc<Mutex<Semaphores>>,
    clock: C,
    tokens: G,
    next_connection: Arc<AtomicU64>,
}

impl MemorySemaphoreService {
    pub fn new() -> Self {
        Self::with_parts(SystemClock, UuidTokenGen)
    }
}

impl Default for MemorySemaphoreService {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, G: TokenGen> MemorySemaphoreService<C, G> {
    pub fn with_parts(clock: C, tokens: G) -> Self {
        Self {
            semaphores: Arc::new(Mutex::new(HashMap::new())),
            clock,
            tokens,
            next_connection: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Units currently held under `key`, including lapsed holders not yet reclaimed
    pub fn held(&self, key: &SemaphoreKey) -> u32 {
        let semaphores = self.semaphores.lock().unwrap_or_else(|e| e.into_inner());
        semaphores.get(key).map_or(0, TtlSemaphore::held)
    }

    fn apply(&self, key: &SemaphoreKey, input: SemaphoreInput) -> Vec<SemaphoreEvent> {
        let mut semaphores = self.semaphores.lock().unwrap_or_else(|e| e.into_inner());
        let current = semaphores
            .entry(key.clone())
            .or_insert_with(|| TtlSemaphore::new(key.clone()));
        let (next, events) = current.transition(input, &self.clock);
        *current = next;
        events
    }

    fn acquire(
        &self,
        key: &SemaphoreKey,
        ttl_seconds: u32,
        capacity: u32,
        client_label: &str,
    ) -> Option<Token> {
        let events = self.apply(
            key,
            SemaphoreInput::Acquire {
                token: self.tokens.mint(),
                ttl: Duration::from_secs(u64::from(ttl_seconds)),
                capacity,
                client_label: client_label.to_string(),
            },
        );
        log_expired(&events);
        granted(&events).cloned()
    }

    fn give_back(&self, key: &SemaphoreKey, token: &Token) -> bool {
        let events = self.apply(
            key,
            SemaphoreInput::Release {
                token: token.clone(),
            },
        );
        log_expired(&events);
        released(&events)
    }
}

fn log_expired(events: &[SemaphoreEvent]) {
    for event in events {
        if let SemaphoreEvent::Expired {
            key,
            token,
            client_label,
        } = event
        {
            tracing::debug!(%key, %token, client_label, "reclaimed expired holder");
        }
    }
}

#[async_trait]
impl<C: Clock, G: TokenGen> SemaphoreConnector for MemorySemaphoreService<C, G> {
    type Client = MemorySemaphoreClient<C, G>;

    async fn connect(&self) -> Result<Self::Client, TransportError> {
        let connection = self.next_connection.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySemaphoreClient {
            service: self.clone(),
            connection,
        })
    }
}

/// Handle onto a [`MemorySemaphoreService`]
pub struct MemorySemaphoreClient<C: Clock = SystemClock, G: TokenGen = UuidTokenGen> {
    service: MemorySemaphoreService<C, G>,
    connection: u64,
}

impl<C: Clock, G: TokenGen> MemorySemaphoreClient<C, G> {
    pub fn connection(&self) -> u64 {
        self.connection
    }
}

#[async_trait]
impl<C: Clock, G: TokenGen> SemaphoreClient for MemorySemaphoreClient<C, G> {
    async fn attempt_acquire(
        &self,
        key: &SemaphoreKey,
        ttl_seconds: u32,
        capacity: u32,
        client_label: &str,
    ) -> Result<Option<Token>, TransportError> {
        Ok(self
            .service
            .acquire(key, ttl_seconds, capacity, client_label))
    }

    async fn release(&self, key: &SemaphoreKey, token: &Token) -> Result<bool, TransportError> {
        Ok(self.service.give_back(key, token))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
