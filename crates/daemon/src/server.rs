// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server: per-connection protocol drivers.

use std::net::SocketAddr;
use std::sync::Arc;

use ringlog_core::{AppendLog, LineAssembler, LogError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info};

/// Per-read buffer size for inbound packet data.
const READ_CHUNK: usize = 1024;

/// Connection-fatal errors. None of these affect the shared log or any
/// other connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log error: {0}")]
    Log(#[from] LogError),

    #[error("interrupted by shutdown")]
    Interrupted,
}

/// Drive one client connection to completion.
///
/// Loops: accumulate inbound bytes in a private assembler until a
/// terminated record arrives, append it to the shared log, then echo every
/// stored record back oldest to newest. The connection stays open for
/// further exchanges until the client closes it or shutdown is requested;
/// an unterminated residue at close is discarded without appending.
pub async fn handle_connection(
    log: Arc<AppendLog>,
    stream: TcpStream,
    peer: SocketAddr,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ConnectionError> {
    info!("accepted connection from {}", peer.ip());
    let result = serve(&log, stream, &mut shutdown).await;
    info!("closed connection from {}", peer.ip());
    result
}

async fn serve(
    log: &AppendLog,
    stream: TcpStream,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();
    let mut assembler = LineAssembler::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let read = tokio::select! {
            result = reader.read(&mut buf) => result?,
            _ = shutdown.changed() => return Err(ConnectionError::Interrupted),
        };
        if read == 0 {
            if assembler.pending_len() > 0 {
                debug!(
                    pending = assembler.pending_len(),
                    "client closed mid-record, discarding residue"
                );
            }
            return Ok(());
        }

        let Some(record) = assembler.feed(&buf[..read])?.record else {
            continue;
        };
        log.append_and_evict(record);

        // Snapshot the full log under the guard, then stream it out; the
        // append above happens-before this replay on the same connection.
        let chunks: Vec<Vec<u8>> = log.replay().collect();
        for chunk in chunks {
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
