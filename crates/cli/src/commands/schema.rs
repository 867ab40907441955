// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `herd schema` - Print or install the semaphore stored procedures

use crate::error::HerdError;
use anyhow::Result;
use clap::Args;
use herd_adapters::{PostgresSemaphore, SCHEMA_SQL};
use std::time::Duration;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Install into the database instead of printing
    #[arg(long)]
    pub apply: bool,

    /// PostgreSQL connection string [env: DATABASE_URL]
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// How long to wait for the database connection
    #[arg(long, value_name = "DUR", default_value = "10s", value_parser = humantime::parse_duration)]
    pub connect_timeout: Duration,
}

pub async fn schema(args: SchemaArgs) -> Result<()> {
    if !args.apply {
        print!("{}", SCHEMA_SQL);
        return Ok(());
    }

    let url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .filter(|u| !u.is_empty())
        .ok_or_else(HerdError::missing_database_url)?;

    let pool = PostgresSemaphore::open(&url, 1, args.connect_timeout)
        .await
        .map_err(HerdError::backend_unavailable)?;
    let installed = pool.install_schema().await;
    pool.close().await;
    installed.map_err(HerdError::backend_unavailable)?;

    println!("Installed semaphore schema");
    Ok(())
}
