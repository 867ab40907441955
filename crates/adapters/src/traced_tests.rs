// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::semaphore::{FakeSemaphore, SemaphoreCall};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

// =============================================================================
// Pass-through behaviour
// =============================================================================

fn key() -> SemaphoreKey {
    SemaphoreKey::new("traced-lock")
}

#[tokio::test]
async fn traced_client_passes_results_through() {
    let fake = FakeSemaphore::new();
    let traced = TracedSemaphoreConnector::new(fake.clone());
    let client = traced.connect().await.unwrap();

    let token = client
        .attempt_acquire(&key(), 60, 1, "test")
        .await
        .unwrap()
        .unwrap();
    assert!(client
        .attempt_acquire(&key(), 60, 1, "test")
        .await
        .unwrap()
        .is_none());
    assert!(client.release(&key(), &token).await.unwrap());
    assert!(!client.release(&key(), &token).await.unwrap());
    assert_eq!(fake.releases_of(&token), vec![true, false]);
}

#[tokio::test]
async fn traced_connector_numbers_connections() {
    let traced = TracedSemaphoreConnector::new(FakeSemaphore::new());
    let a = traced.connect().await.unwrap();
    let b = traced.connect().await.unwrap();
    assert_eq!(a.connection(), 1);
    assert_eq!(b.connection(), 2);
}

#[tokio::test]
async fn traced_connector_propagates_connect_failure() {
    let traced = TracedSemaphoreConnector::new(FakeSemaphore::new().fail_connects_after(0));
    let err = traced.connect().await.err().unwrap();
    assert!(matches!(err, TransportError::Connect(_)));
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_acquire_logs_span_and_grant() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedSemaphoreConnector::new(FakeSemaphore::new());
        let client = traced.connect().await.unwrap();
        client.attempt_acquire(&key(), 60, 1, "test").await
    });

    assert!(matches!(result, Ok(Some(_))), "acquire should succeed: {:?}", result);
    assert!(
        logs.contains("semaphore.acquire"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(logs.contains("traced-lock"), "Should log key. Logs:\n{}", logs);
    assert!(logs.contains("granted"), "Should log grant. Logs:\n{}", logs);
}

#[test]
fn traced_acquire_logs_capacity_denial() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedSemaphoreConnector::new(FakeSemaphore::new());
        let a = traced.connect().await.unwrap();
        let b = traced.connect().await.unwrap();
        a.attempt_acquire(&key(), 60, 1, "test").await.unwrap();
        b.attempt_acquire(&key(), 60, 1, "test").await
    });

    assert!(matches!(result, Ok(None)));
    assert!(logs.contains("at capacity"), "Logs:\n{}", logs);
}

#[test]
fn traced_release_logs_lapsed_token_without_error() {
    let (logs, released) = with_tracing(|| async {
        let traced = TracedSemaphoreConnector::new(FakeSemaphore::new());
        let client = traced.connect().await.unwrap();
        client
            .release(&key(), &Token::new("never-issued"))
            .await
            .unwrap()
    });

    assert!(!released);
    assert!(logs.contains("semaphore.release"), "Logs:\n{}", logs);
    assert!(logs.contains("token no longer valid"), "Logs:\n{}", logs);
    assert!(!logs.contains("ERROR"), "Logs:\n{}", logs);
}

#[test]
fn traced_acquire_logs_transport_failure_as_error() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeSemaphore::new().fail_acquire_call(1);
        let traced = TracedSemaphoreConnector::new(fake.clone());
        let client = traced.connect().await.unwrap();
        let result = client.attempt_acquire(&key(), 60, 1, "test").await;
        assert!(fake.calls().iter().any(|c| matches!(c, SemaphoreCall::Failed { .. })));
        result
    });

    assert!(result.is_err());
    assert!(logs.contains("ERROR"), "Logs:\n{}", logs);
    assert!(logs.contains("acquire failed"), "Logs:\n{}", logs);
}
