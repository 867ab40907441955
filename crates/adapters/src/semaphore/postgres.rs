// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PostgreSQL semaphore backend
//!
//! Calls the `attempt_to_acquire_semaphore_child` / `release_semaphore_child`
//! stored procedures. The synchronous driver runs on the blocking pool; the
//! connection pool is sized so every actor checks out its own connection.

use super::{BackendError, SemaphoreClient, SemaphoreConnector, TransportError};
use async_trait::async_trait;
use herd_core::{SemaphoreKey, Token};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::postgres::types::FromSql;
use r2d2_postgres::postgres::{Config, NoTls, Row};
use r2d2_postgres::PostgresConnectionManager;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Stored procedures and table backing the semaphore
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

const ACQUIRE_SQL: &str = "SELECT attempt_to_acquire_semaphore_child($1, $2, $3, $4) AS token";
const RELEASE_SQL: &str = "SELECT release_semaphore_child($1, $2) AS released";

type Manager = PostgresConnectionManager<NoTls>;
type Connection = PooledConnection<Manager>;

/// Connection pool onto the database holding the semaphore procedures
#[derive(Clone)]
pub struct PostgresSemaphore {
    pool: Pool<Manager>,
}

impl PostgresSemaphore {
    /// Open a pool of `connections` connections.
    ///
    /// Fails unless every connection can be established within
    /// `connect_timeout`; nothing is retried.
    pub async fn open(
        url: &str,
        connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, BackendError> {
        let config: Config = url
            .parse()
            .map_err(|e| BackendError::InvalidUrl(format!("{}", e)))?;
        let manager = PostgresConnectionManager::new(config, NoTls);

        let pool = tokio::task::spawn_blocking(move || {
            Pool::builder()
                .max_size(connections.max(1))
                .min_idle(Some(connections.max(1)))
                .connection_timeout(connect_timeout)
                .idle_timeout(None)
                .max_lifetime(None)
                .build(manager)
        })
        .await
        .map_err(|e| BackendError::Pool(e.to_string()))?
        .map_err(|e| BackendError::Pool(e.to_string()))?;

        tracing::info!(connections, "postgres pool ready");
        Ok(Self { pool })
    }

    /// Create the semaphore table and procedures
    pub async fn install_schema(&self) -> Result<(), BackendError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| BackendError::Schema(e.to_string()))?;
            conn.batch_execute(SCHEMA_SQL)
                .map_err(|e| BackendError::Schema(e.to_string()))
        })
        .await
        .map_err(|e| BackendError::Schema(e.to_string()))?
    }

    /// Close every pooled connection.
    ///
    /// The driver blocks while closing, so the pool must be dropped off the
    /// async runtime.
    pub async fn close(self) {
        let pool = self.pool;
        if let Err(e) = tokio::task::spawn_blocking(move || drop(pool)).await {
            tracing::warn!(error = %e, "closing postgres pool failed");
        }
    }
}

#[async_trait]
impl SemaphoreConnector for PostgresSemaphore {
    type Client = PostgresSemaphoreClient;

    async fn connect(&self) -> Result<Self::Client, TransportError> {
        let pool = self.pool.clone();
        let conn = tokio::task::spawn_blocking(move || pool.get())
            .await
            .map_err(|_| TransportError::Closed)?
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(PostgresSemaphoreClient {
            conn: Some(Arc::new(Mutex::new(conn))),
        })
    }
}

/// One checked-out connection, owned by a single actor.
///
/// A connection the server has closed is discarded by the pool instead of
/// returned, and the driver blocks while discarding it. Dropping the client
/// therefore hands the connection to the blocking pool.
pub struct PostgresSemaphoreClient {
    conn: Option<Arc<Mutex<Connection>>>,
}

impl PostgresSemaphoreClient {
    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, TransportError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, TransportError> + Send + 'static,
    {
        let conn = self.conn.clone().ok_or(TransportError::Closed)?;
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut conn)
        })
        .await
        .map_err(|_| TransportError::Closed)?
    }
}

impl Drop for PostgresSemaphoreClient {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || drop(conn));
            }
            Err(_) => drop(conn),
        }
    }
}

fn column<T>(row: &Row, name: &str) -> Result<T, TransportError>
where
    T: for<'a> FromSql<'a>,
{
    row.try_get(name)
        .map_err(|e| TransportError::Decode(e.to_string()))
}

fn to_int(name: &str, value: u32) -> Result<i32, TransportError> {
    i32::try_from(value)
        .map_err(|_| TransportError::Query(format!("{} out of range: {}", name, value)))
}

#[async_trait]
impl SemaphoreClient for PostgresSemaphoreClient {
    async fn attempt_acquire(
        &self,
        key: &SemaphoreKey,
        ttl_seconds: u32,
        capacity: u32,
        client_label: &str,
    ) -> Result<Option<Token>, TransportError> {
        let key = key.as_str().to_string();
        let ttl = to_int("ttl_seconds", ttl_seconds)?;
        let capacity = to_int("capacity", capacity)?;
        let label = client_label.to_string();

        self.with_conn(move |conn| {
            let row = conn
                .query_one(ACQUIRE_SQL, &[&key, &ttl, &capacity, &label])
                .map_err(|e| TransportError::Query(e.to_string()))?;
            let token: Option<String> = column(&row, "token")?;
            Ok(token.map(Token::new))
        })
        .await
    }

    async fn release(&self, key: &SemaphoreKey, token: &Token) -> Result<bool, TransportError> {
        let key = key.as_str().to_string();
        let token = token.as_str().to_string();

        self.with_conn(move |conn| {
            let row = conn
                .query_one(RELEASE_SQL, &[&key, &token])
                .map_err(|e| TransportError::Query(e.to_string()))?;
            let released: Option<bool> = column(&row, "released")?;
            Ok(released.unwrap_or(false))
        })
        .await
    }
}

#[cfg(test)]
#[path = "postgres_tests.rs"]
mod tests;
