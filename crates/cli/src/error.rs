// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! Fatal errors end the run with a single report on stderr:
//! - What went wrong (message)
//! - Why it might have happened (context)
//! - How to fix it (suggestions)

use herd_adapters::BackendError;
use herd_core::ConfigError;
use herd_engine::StartupError;
use std::fmt;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct HerdError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HerdError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for HerdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HerdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Builders for the fatal failures of a run
impl HerdError {
    pub fn invalid_config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Read { .. } => "Check that the --config path exists and is readable",
            ConfigError::Parse(_) => "Fix the TOML syntax; unknown keys are rejected",
            ConfigError::Invalid(_) => "Counts and the TTL must be positive; see herd run --help",
        };
        HerdError::new("Invalid configuration")
            .with_context(err.to_string())
            .with_suggestion(hint)
            .with_source(err)
    }

    pub fn backend_unavailable(err: BackendError) -> Self {
        HerdError::new("Could not set up the postgres semaphore backend")
            .with_context(err.to_string())
            .with_suggestion("Check that the database is reachable at --database-url / DATABASE_URL")
            .with_suggestion("Install the stored procedures with: herd schema --apply")
            .with_suggestion("Run without a database using: herd run --backend memory")
            .with_source(err)
    }

    pub fn startup_failed(err: StartupError) -> Self {
        HerdError::new("Run aborted before any actor started")
            .with_context(err.to_string())
            .with_context("Every actor needs its own connection to the semaphore service")
            .with_suggestion("Lower --actors or raise the database connection limit")
            .with_source(err)
    }

    pub fn missing_database_url() -> Self {
        HerdError::new("No database URL given")
            .with_context("The postgres backend needs a connection string")
            .with_suggestion("Pass --database-url postgres://user@host/db")
            .with_suggestion("Or set the DATABASE_URL environment variable")
    }
}
