// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake semaphore service for testing
//!
//! Enforces capacity and TTL with the real state machine, tracks single-use
//! tokens, records every call, and can inject transport failures.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SemaphoreClient, SemaphoreConnector, TransportError};
use async_trait::async_trait;
use herd_core::semaphore::{granted, released};
use herd_core::{
    FakeClock, SemaphoreInput, SemaphoreKey, SequentialTokenGen, Token, TokenGen, TtlSemaphore,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Recorded semaphore call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemaphoreCall {
    Connect {
        connection: u64,
    },
    Acquire {
        connection: u64,
        key: SemaphoreKey,
        ttl_seconds: u32,
        capacity: u32,
        client_label: String,
        granted: Option<Token>,
    },
    Release {
        connection: u64,
        key: SemaphoreKey,
        token: Token,
        released: bool,
    },
    /// A call that failed with an injected transport error
    Failed {
        connection: u64,
        operation: &'static str,
    },
}

#[derive(Default)]
struct FakeState {
    semaphores: HashMap<SemaphoreKey, TtlSemaphore>,
    calls: Vec<SemaphoreCall>,
    connections: u64,
    acquires: usize,
    max_held: u32,
    fail_connects_after: Option<u64>,
    fail_acquire_call: Option<usize>,
    fail_releases: bool,
}

/// Fake semaphore service; clones share state
#[derive(Clone, Default)]
pub struct FakeSemaphore {
    state: Arc<Mutex<FakeState>>,
    clock: FakeClock,
    tokens: SequentialTokenGen,
}

impl FakeSemaphore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `n` connections, then refuse every further one
    pub fn fail_connects_after(self, n: u64) -> Self {
        self.lock().fail_connects_after = Some(n);
        self
    }

    /// Fail the `nth` acquire call (1-based, counted across all clients)
    pub fn fail_acquire_call(self, nth: usize) -> Self {
        self.lock().fail_acquire_call = Some(nth);
        self
    }

    /// Fail every release with a transport error
    pub fn fail_releases(self) -> Self {
        self.lock().fail_releases = true;
        self
    }

    /// Move service time forward; tokens whose TTL passes lapse
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SemaphoreCall> {
        self.lock().calls.clone()
    }

    /// Tokens handed out, in grant order
    pub fn issued_tokens(&self) -> Vec<Token> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                SemaphoreCall::Acquire {
                    granted: Some(token),
                    ..
                } => Some(token.clone()),
                _ => None,
            })
            .collect()
    }

    /// Results of every release call made with `token`
    pub fn releases_of(&self, token: &Token) -> Vec<bool> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                SemaphoreCall::Release {
                    token: t, released, ..
                } if t == token => Some(*released),
                _ => None,
            })
            .collect()
    }

    /// Acquire calls made by one connection
    pub fn acquire_count(&self, connection: u64) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| {
                matches!(c, SemaphoreCall::Acquire { connection: n, .. } if *n == connection)
            })
            .count()
    }

    /// Units held under `key` right now
    pub fn held(&self, key: &SemaphoreKey) -> u32 {
        self.lock().semaphores.get(key).map_or(0, TtlSemaphore::held)
    }

    /// Highest number of units ever held at once, across keys
    pub fn max_held(&self) -> u32 {
        self.lock().max_held
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SemaphoreConnector for FakeSemaphore {
    type Client = FakeSemaphoreClient;

    async fn connect(&self) -> Result<Self::Client, TransportError> {
        let mut state = self.lock();
        if state
            .fail_connects_after
            .is_some_and(|limit| state.connections >= limit)
        {
            return Err(TransportError::Connect("injected connect failure".into()));
        }
        state.connections += 1;
        let connection = state.connections;
        state.calls.push(SemaphoreCall::Connect { connection });

        Ok(FakeSemaphoreClient {
            fake: self.clone(),
            connection,
        })
    }
}

/// Client handle onto a [`FakeSemaphore`]
pub struct FakeSemaphoreClient {
    fake: FakeSemaphore,
    connection: u64,
}

impl FakeSemaphoreClient {
    pub fn connection(&self) -> u64 {
        self.connection
    }
}

#[async_trait]
impl SemaphoreClient for FakeSemaphoreClient {
    async fn attempt_acquire(
        &self,
        key: &SemaphoreKey,
        ttl_seconds: u32,
        capacity: u32,
        client_label: &str,
    ) -> Result<Option<Token>, TransportError> {
        let mut state = self.fake.lock();
        state.acquires += 1;
        if state.fail_acquire_call == Some(state.acquires) {
            state.calls.push(SemaphoreCall::Failed {
                connection: self.connection,
                operation: "acquire",
            });
            return Err(TransportError::Query("injected acquire failure".into()));
        }

        let sem = state
            .semaphores
            .entry(key.clone())
            .or_insert_with(|| TtlSemaphore::new(key.clone()));
        let (next, events) = sem.transition(
            SemaphoreInput::Acquire {
                token: self.fake.tokens.mint(),
                ttl: Duration::from_secs(u64::from(ttl_seconds)),
                capacity,
                client_label: client_label.to_string(),
            },
            &self.fake.clock,
        );
        let held = next.held();
        *sem = next;
        let token = granted(&events).cloned();

        state.max_held = state.max_held.max(held);
        state.calls.push(SemaphoreCall::Acquire {
            connection: self.connection,
            key: key.clone(),
            ttl_seconds,
            capacity,
            client_label: client_label.to_string(),
            granted: token.clone(),
        });
        Ok(token)
    }

    async fn release(&self, key: &SemaphoreKey, token: &Token) -> Result<bool, TransportError> {
        let mut state = self.fake.lock();
        if state.fail_releases {
            state.calls.push(SemaphoreCall::Failed {
                connection: self.connection,
                operation: "release",
            });
            return Err(TransportError::Query("injected release failure".into()));
        }

        let was_released = match state.semaphores.get_mut(key) {
            Some(sem) => {
                let (next, events) = sem.transition(
                    SemaphoreInput::Release {
                        token: token.clone(),
                    },
                    &self.fake.clock,
                );
                *sem = next;
                released(&events)
            }
            None => false,
        };

        state.calls.push(SemaphoreCall::Release {
            connection: self.connection,
            key: key.clone(),
            token: token.clone(),
            released: was_released,
        });
        Ok(was_released)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
