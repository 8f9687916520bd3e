// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Positioned access over the shared log: the device-style front end.

use std::io::SeekFrom;
use std::sync::{Arc, Mutex};

use crate::assembler::LineAssembler;
use crate::error::LogError;
use crate::log::AppendLog;

/// A positioned reader over the shared log.
///
/// Mirrors an open handle on the device node: `read` returns bytes from
/// the record containing the current position, `seek` clamps into the
/// stored range, and `seek_to_record` repositions by (record index, inner
/// offset). Each handle owns its position; the log itself is shared.
#[derive(Debug)]
pub struct LogCursor {
    log: Arc<AppendLog>,
    pos: u64,
}

impl LogCursor {
    pub fn new(log: Arc<AppendLog>) -> Self {
        Self { log, pos: 0 }
    }

    /// Current absolute position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Read up to `count` bytes at the current position, advancing by the
    /// number returned.
    ///
    /// The read is bounded by the remaining length of the record
    /// containing the position; a position at or past the end of the
    /// stored data yields an empty buffer, not an error.
    pub fn read(&mut self, count: usize) -> Vec<u8> {
        let bytes = self.log.read_at(self.pos, count);
        self.pos += bytes.len() as u64;
        bytes
    }

    /// Reposition absolutely, end-relatively, or current-relatively,
    /// clamped into `[0, total_len]`.
    pub fn seek(&mut self, target: SeekFrom) -> u64 {
        let total = self.log.total_len();
        let requested = match target {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::End(offset) => total as i128 + offset as i128,
            SeekFrom::Current(offset) => self.pos as i128 + offset as i128,
        };
        self.pos = requested.clamp(0, total as i128) as u64;
        self.pos
    }

    /// Reposition to the absolute offset equivalent to `inner_offset`
    /// bytes into the live record at `index` (zero-based, oldest first).
    ///
    /// An index with no live record, or an inner offset past the record's
    /// length, is rejected without moving the position.
    pub fn seek_to_record(&mut self, index: usize, inner_offset: u64) -> Result<u64, LogError> {
        let resolved = self.log.with_ring(|ring| {
            let mut absolute = 0u64;
            for (i, record) in ring.iter().enumerate() {
                if i == index {
                    if inner_offset > record.len() as u64 {
                        return Err(LogError::OffsetOutOfRange {
                            offset: inner_offset,
                            len: record.len(),
                        });
                    }
                    return Ok(absolute + inner_offset);
                }
                absolute += record.len() as u64;
            }
            Err(LogError::NoSuchRecord { index })
        })?;
        self.pos = resolved;
        Ok(resolved)
    }
}

/// The device-style write front: a single shared line assembler feeding
/// the log.
///
/// Every writer through this front shares one pending buffer — distinct
/// from the socket server, where each connection assembles privately. The
/// assembler has its own lock, separate from the ring's, and is held
/// across the append so records reach the log in completion order.
#[derive(Debug)]
pub struct LogWriter {
    log: Arc<AppendLog>,
    assembler: Mutex<LineAssembler>,
}

impl LogWriter {
    pub fn new(log: Arc<AppendLog>) -> Self {
        Self {
            log,
            assembler: Mutex::new(LineAssembler::new()),
        }
    }

    /// Feed one chunk; a completed record is appended to the log.
    ///
    /// Returns the number of bytes consumed — through the terminator when
    /// one was found, otherwise the whole chunk.
    pub fn write(&self, chunk: &[u8]) -> Result<usize, LogError> {
        let mut assembler = self.assembler.lock().unwrap_or_else(|e| e.into_inner());
        let assembled = assembler.feed(chunk)?;
        if let Some(record) = assembled.record {
            self.log.append_and_evict(record);
        }
        Ok(assembled.consumed)
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
