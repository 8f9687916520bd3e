// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, startup, run loop, graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ringlog_core::{AppendLog, DEFAULT_CAPACITY};
use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::annotator::Annotator;
use crate::server::{self, ConnectionError};

/// Listen backlog, sized for several simultaneous clients.
const LISTEN_BACKLOG: u32 = 20;

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the server listens on.
    pub listen_addr: SocketAddr,
    /// Ring capacity in records.
    pub capacity: usize,
    /// Period between timestamp annotations.
    pub tick_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9000)),
            capacity: DEFAULT_CAPACITY,
            tick_interval: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to defaults.
    ///
    /// Overrides: `RINGLOG_ADDR` (socket address), `RINGLOG_CAPACITY`
    /// (record count, nonzero), `RINGLOG_TICK` (humantime duration such
    /// as "10s"). An unparseable value is a startup error, not a silent
    /// fallback.
    pub fn from_env() -> Result<Self, LifecycleError> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("RINGLOG_ADDR") {
            config.listen_addr = value.parse().map_err(|_| LifecycleError::InvalidConfig {
                var: "RINGLOG_ADDR",
                value: value.clone(),
            })?;
        }
        if let Ok(value) = std::env::var("RINGLOG_CAPACITY") {
            let capacity: usize = value.parse().unwrap_or(0);
            if capacity == 0 {
                return Err(LifecycleError::InvalidConfig {
                    var: "RINGLOG_CAPACITY",
                    value,
                });
            }
            config.capacity = capacity;
        }
        if let Ok(value) = std::env::var("RINGLOG_TICK") {
            config.tick_interval =
                humantime::parse_duration(&value).map_err(|_| LifecycleError::InvalidConfig {
                    var: "RINGLOG_TICK",
                    value: value.clone(),
                })?;
        }

        Ok(config)
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid {var}: {value:?}")]
    InvalidConfig { var: &'static str, value: String },

    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Daemon state during operation.
pub struct Daemon {
    config: Config,
    listener: TcpListener,
    log: Arc<AppendLog>,
}

impl Daemon {
    /// Address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, LifecycleError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the shared log.
    pub fn log(&self) -> Arc<AppendLog> {
        Arc::clone(&self.log)
    }
}

/// Bind the listener and build the shared log.
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    let socket = match config.listen_addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    // allow rebinding while an earlier socket sits in TIME_WAIT
    socket.set_reuseaddr(true)?;
    socket
        .bind(config.listen_addr)
        .map_err(|source| LifecycleError::BindFailed {
            addr: config.listen_addr,
            source,
        })?;
    let listener = socket
        .listen(LISTEN_BACKLOG)
        .map_err(|source| LifecycleError::BindFailed {
            addr: config.listen_addr,
            source,
        })?;

    let log = Arc::new(AppendLog::new(config.capacity));

    info!(
        addr = %config.listen_addr,
        capacity = config.capacity,
        "daemon ready"
    );

    Ok(Daemon {
        config: config.clone(),
        listener,
        log,
    })
}

/// Accept loop.
///
/// Spawns one worker task per accepted connection and one background
/// annotator, all sharing the log. Runs until `shutdown` flips true, then
/// drains: stops accepting, waits for the annotator to exit, joins every
/// worker (logging failures), and releases the stored records.
pub async fn run(daemon: Daemon, mut shutdown: watch::Receiver<bool>) -> Result<(), LifecycleError> {
    let Daemon {
        config,
        listener,
        log,
    } = daemon;

    let annotator = Annotator::new(Arc::clone(&log), config.tick_interval, shutdown.clone());
    let annotator_handle = tokio::spawn(annotator.run());

    let mut workers = JoinSet::new();

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        workers.spawn(server::handle_connection(
                            Arc::clone(&log),
                            stream,
                            peer,
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => {
                        error!("error accepting connection: {e}");
                    }
                }
            }

            // Reap workers as they finish rather than only at shutdown
            Some(result) = workers.join_next(), if !workers.is_empty() => {
                log_worker_result(result);
            }

            _ = shutdown.changed() => {
                info!("shutdown requested, draining");
                break;
            }
        }
    }

    // stop accepting before waiting on in-flight work
    drop(listener);

    if let Err(e) = annotator_handle.await {
        error!("annotator task failed: {e}");
    }
    while let Some(result) = workers.join_next().await {
        log_worker_result(result);
    }

    log.clear();
    info!("daemon stopped");
    Ok(())
}

fn log_worker_result(result: Result<Result<(), ConnectionError>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("connection failed during processing: {e}"),
        Err(e) => error!("worker task aborted: {e}"),
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
