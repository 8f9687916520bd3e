// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for daemon specs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ringlog_core::AppendLog;
use ringlog_daemon::lifecycle::{self, Config, LifecycleError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct TestDaemon {
    pub addr: SocketAddr,
    pub log: Arc<AppendLog>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<Result<(), LifecycleError>>,
}

/// Start a daemon on an ephemeral port. The annotator period is one hour
/// so timestamp records never interfere with the scenario under test.
pub async fn start_daemon(capacity: usize) -> TestDaemon {
    let config = Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        capacity,
        tick_interval: Duration::from_secs(3600),
    };
    let daemon = lifecycle::startup(&config).await.unwrap();
    let addr = daemon.local_addr().unwrap();
    let log = daemon.log();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(lifecycle::run(daemon, shutdown_rx));
    TestDaemon {
        addr,
        log,
        shutdown,
        handle,
    }
}

impl TestDaemon {
    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).await.unwrap()
    }

    /// Signal shutdown and wait for the run loop to drain.
    pub async fn stop(self) {
        self.shutdown.send(true).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

/// Send one packet and read back the expected echo, byte for byte.
pub async fn exchange(stream: &mut TcpStream, packet: &[u8], expected: &[u8]) {
    stream.write_all(packet).await.unwrap();
    let echoed = read_exact_len(stream, expected.len()).await;
    assert_eq!(echoed, expected);
}

pub async fn read_exact_len(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await.unwrap();
    buf
}
