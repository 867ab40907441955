// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn key() -> SemaphoreKey {
    SemaphoreKey::new("test-lock")
}

#[tokio::test]
async fn fake_enforces_capacity_and_records_calls() {
    let fake = FakeSemaphore::new();
    let a = fake.connect().await.unwrap();
    let b = fake.connect().await.unwrap();

    let first = a.attempt_acquire(&key(), 60, 1, "test").await.unwrap();
    let second = b.attempt_acquire(&key(), 60, 1, "test").await.unwrap();

    assert_eq!(first, Some(Token::new("token-1")));
    assert_eq!(second, None);
    assert_eq!(fake.max_held(), 1);
    assert_eq!(fake.acquire_count(a.connection()), 1);
    assert_eq!(fake.acquire_count(b.connection()), 1);
    assert_eq!(fake.issued_tokens(), vec![Token::new("token-1")]);
    assert!(matches!(
        &fake.calls()[..],
        [
            SemaphoreCall::Connect { connection: 1 },
            SemaphoreCall::Connect { connection: 2 },
            SemaphoreCall::Acquire { connection: 1, granted: Some(_), .. },
            SemaphoreCall::Acquire { connection: 2, granted: None, .. },
        ]
    ));
}

#[tokio::test]
async fn fake_tokens_are_single_use() {
    let fake = FakeSemaphore::new();
    let client = fake.connect().await.unwrap();
    let token = client
        .attempt_acquire(&key(), 60, 1, "test")
        .await
        .unwrap()
        .unwrap();

    assert!(client.release(&key(), &token).await.unwrap());
    assert!(!client.release(&key(), &token).await.unwrap());
    assert_eq!(fake.releases_of(&token), vec![true, false]);
}

#[tokio::test]
async fn fake_lapses_tokens_when_advanced() {
    let fake = FakeSemaphore::new();
    let client = fake.connect().await.unwrap();
    let token = client
        .attempt_acquire(&key(), 10, 1, "test")
        .await
        .unwrap()
        .unwrap();

    fake.advance(Duration::from_secs(10));
    assert!(!client.release(&key(), &token).await.unwrap());
    assert_eq!(fake.held(&key()), 0);
}

#[tokio::test]
async fn fake_refuses_connections_past_limit() {
    let fake = FakeSemaphore::new().fail_connects_after(1);
    assert!(fake.connect().await.is_ok());
    let err = fake.connect().await.err().unwrap();
    assert!(matches!(err, TransportError::Connect(_)));
}

#[tokio::test]
async fn fake_fails_the_selected_acquire_only() {
    let fake = FakeSemaphore::new().fail_acquire_call(2);
    let client = fake.connect().await.unwrap();

    assert!(client.attempt_acquire(&key(), 60, 5, "test").await.is_ok());
    assert!(client.attempt_acquire(&key(), 60, 5, "test").await.is_err());
    assert!(client.attempt_acquire(&key(), 60, 5, "test").await.is_ok());
    assert!(fake.calls().contains(&SemaphoreCall::Failed {
        connection: 1,
        operation: "acquire",
    }));
}

#[tokio::test]
async fn fake_release_failure_is_a_transport_error() {
    let fake = FakeSemaphore::new().fail_releases();
    let client = fake.connect().await.unwrap();
    let token = client
        .attempt_acquire(&key(), 60, 1, "test")
        .await
        .unwrap()
        .unwrap();

    let err = client.release(&key(), &token).await.unwrap_err();
    assert!(matches!(err, TransportError::Query(_)));
    assert_eq!(fake.held(&key()), 1);
}
