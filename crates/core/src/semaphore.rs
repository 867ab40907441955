// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TTL semaphore state machine
//!
//! Models the bounded-resource service the harness contends against: a
//! named semaphore whose holders are identified by tokens and lapse after a
//! TTL unless released first. Capacity is supplied by each acquire, the same
//! way the database procedures take it as an argument.

use crate::clock::Clock;
use crate::token::{SemaphoreKey, Token};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A live holder of one unit of capacity
#[derive(Clone, Debug)]
pub struct Holder {
    pub token: Token,
    pub client_label: String,
    pub expires_at: Instant,
}

/// Semaphore state for a single key
#[derive(Clone, Debug)]
pub struct TtlSemaphore {
    pub key: SemaphoreKey,
    pub holders: HashMap<Token, Holder>,
}

/// Inputs that drive semaphore transitions
#[derive(Clone, Debug)]
pub enum SemaphoreInput {
    /// Take one unit of capacity under `token` if fewer than `capacity` are held
    Acquire {
        token: Token,
        ttl: Duration,
        capacity: u32,
        client_label: String,
    },
    /// Give back the unit held under `token`
    Release { token: Token },
    /// Drop holders whose TTL has lapsed
    Tick,
}

/// Observable results of a transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SemaphoreEvent {
    Acquired {
        key: SemaphoreKey,
        token: Token,
        held: u32,
        capacity: u32,
    },
    Denied {
        key: SemaphoreKey,
        held: u32,
        capacity: u32,
    },
    Released {
        key: SemaphoreKey,
        token: Token,
        held: u32,
    },
    /// Release of a token that is unknown or already lapsed
    ReleaseRejected { key: SemaphoreKey, token: Token },
    Expired {
        key: SemaphoreKey,
        token: Token,
        client_label: String,
    },
}

impl TtlSemaphore {
    pub fn new(key: SemaphoreKey) -> Self {
        Self {
            key,
            holders: HashMap::new(),
        }
    }

    /// Number of units currently held, expired or not
    pub fn held(&self) -> u32 {
        u32::try_from(self.holders.len()).unwrap_or(u32::MAX)
    }

    /// Whether `token` is held and has not lapsed
    pub fn is_live(&self, token: &Token, clock: &impl Clock) -> bool {
        self.holders
            .get(token)
            .is_some_and(|h| !clock.has_passed(h.expires_at))
    }

    /// Tokens whose TTL has lapsed
    pub fn expired(&self, clock: &impl Clock) -> Vec<Token> {
        self.holders
            .values()
            .filter(|h| clock.has_passed(h.expires_at))
            .map(|h| h.token.clone())
            .collect()
    }

    /// Pure state transition function
    pub fn transition(
        &self,
        input: SemaphoreInput,
        clock: &impl Clock,
    ) -> (TtlSemaphore, Vec<SemaphoreEvent>) {
        let mut next = self.clone();
        let mut events = Vec::new();

        match input {
            SemaphoreInput::Acquire {
                token,
                ttl,
                capacity,
                client_label,
            } => {
                next.reclaim(clock, &mut events);

                if next.held() < capacity {
                    next.holders.insert(
                        token.clone(),
                        Holder {
                            token: token.clone(),
                            client_label,
                            expires_at: clock.deadline(ttl),
                        },
                    );
                    events.push(SemaphoreEvent::Acquired {
                        key: self.key.clone(),
                        token,
                        held: next.held(),
                        capacity,
                    });
                } else {
                    events.push(SemaphoreEvent::Denied {
                        key: self.key.clone(),
                        held: next.held(),
                        capacity,
                    });
                }
            }

            SemaphoreInput::Release { token } => {
                // A lapsed holder may still be present until the next reclaim;
                // it no longer owns anything.
                if next.is_live(&token, clock) {
                    next.holders.remove(&token);
                    events.push(SemaphoreEvent::Released {
                        key: self.key.clone(),
                        token,
                        held: next.held(),
                    });
                } else {
                    next.reclaim(clock, &mut events);
                    events.push(SemaphoreEvent::ReleaseRejected {
                        key: self.key.clone(),
                        token,
                    });
                }
            }

            SemaphoreInput::Tick => next.reclaim(clock, &mut events),
        }

        (next, events)
    }

    fn reclaim(&mut self, clock: &impl Clock, events: &mut Vec<SemaphoreEvent>) {
        for token in self.expired(clock) {
            if let Some(holder) = self.holders.remove(&token) {
                events.push(SemaphoreEvent::Expired {
                    key: self.key.clone(),
                    token,
                    client_label: holder.client_label,
                });
            }
        }
    }
}

/// Token granted by a transition, if any
pub fn granted(events: &[SemaphoreEvent]) -> Option<&Token> {
    events.iter().find_map(|e| match e {
        SemaphoreEvent::Acquired { token, .. } => Some(token),
        _ => None,
    })
}

/// Whether a transition released a held token
pub fn released(events: &[SemaphoreEvent]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, SemaphoreEvent::Released { .. }))
}

#[cfg(test)]
#[path = "semaphore_tests.rs"]
mod tests;
