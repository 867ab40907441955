// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for actors and the coordinator

use crate::work::WorkError;
use herd_adapters::TransportError;
use herd_core::ActorId;
use thiserror::Error;

/// Failure that ends a single actor; recorded, never propagated
#[derive(Debug, Error)]
pub enum ActorError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("work failed: {0}")]
    Work(#[from] WorkError),
}

/// Failure before any actor starts; aborts the whole run
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open semaphore connection for actor {actor}: {source}")]
    Connect {
        actor: ActorId,
        #[source]
        source: TransportError,
    },
}
