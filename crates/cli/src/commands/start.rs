// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bm start` - run the supervisor until signalled

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use bm_adapters::WsConnector;
use bm_core::SystemClock;
use bm_daemon::{shutdown_signal, Supervisor};

pub async fn start(config_dir: PathBuf) -> Result<()> {
    init_tracing();

    let supervisor = Supervisor::start(config_dir, Arc::new(WsConnector), SystemClock)
        .await
        .context("starting supervisor")?;

    for (address, reason) in supervisor.start_errors() {
        eprintln!("FAILED: {address} — {reason}");
    }

    supervisor.spawn_watcher()?;
    shutdown_signal().await.context("waiting for shutdown signal")?;
    supervisor.stop().await;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
