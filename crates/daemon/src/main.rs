// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ringlogd: bounded-log TCP daemon.
//!
//! Listens for terminator-delimited packets, appends them to the in-memory
//! ring, and echoes the accumulated log back to each client.

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::info;

use ringlog_daemon::lifecycle::{self, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let config = Config::from_env()?;
    let daemon = lifecycle::startup(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Graceful shutdown on SIGTERM / SIGINT
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("caught SIGTERM, exiting"),
            _ = sigint.recv() => info!("caught SIGINT, exiting"),
        }
        let _ = shutdown_tx.send(true);
    });

    lifecycle::run(daemon, shutdown_rx).await?;
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
