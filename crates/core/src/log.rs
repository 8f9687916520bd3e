// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared, guarded view of the record ring.

use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::record::Record;
use crate::ring::RecordRing;

/// The log as seen by every front end: one [`RecordRing`] behind a mutex.
///
/// One shared instance exists per running daemon, created at startup and
/// cleared at shutdown. Critical sections are short and perform no I/O;
/// the one deliberate exception is [`AppendLog::replay`], which holds the
/// guard for the duration of the full scan so a replay observes a
/// consistent snapshot.
#[derive(Debug)]
pub struct AppendLog {
    ring: Mutex<RecordRing>,
}

impl AppendLog {
    /// Create a log over a ring of the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(RecordRing::new(capacity)),
        }
    }

    /// Append one record, evicting the oldest if the ring is full.
    ///
    /// The displaced record is released only after the critical section
    /// ends, so disposal never delays other writers.
    pub fn append_and_evict(&self, record: Record) {
        let displaced = self.lock().append(record);
        if let Some(old) = displaced {
            debug!(len = old.len(), "displaced oldest record");
            drop(old);
        }
    }

    /// Copy up to `max_len` bytes starting at the cumulative `offset`.
    ///
    /// The copy is bounded by the containing record's remaining length — a
    /// single positioned read never spans records. An offset at or past
    /// the end of the stored data yields an empty buffer, not an error.
    pub fn read_at(&self, offset: u64, max_len: usize) -> Vec<u8> {
        let ring = self.lock();
        match ring.find(offset) {
            Some((record, inner)) => {
                let start = inner as usize;
                let end = start.saturating_add(max_len).min(record.len());
                record.as_bytes()[start..end].to_vec()
            }
            None => Vec::new(),
        }
    }

    /// Stream every live record's payload, oldest to newest.
    ///
    /// The returned iterator holds the lock until it is dropped; writers
    /// block for the duration of the scan.
    pub fn replay(&self) -> Replay<'_> {
        Replay {
            guard: self.lock(),
            next: 0,
        }
    }

    /// Total bytes currently stored; anchors end-relative seeks.
    pub fn total_len(&self) -> u64 {
        self.lock().total_len()
    }

    /// Number of live records.
    pub fn record_count(&self) -> usize {
        self.lock().len()
    }

    /// Release every stored record.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Run `f` against the ring under the lock.
    pub(crate) fn with_ring<T>(&self, f: impl FnOnce(&RecordRing) -> T) -> T {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, RecordRing> {
        self.ring.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Guard-holding iterator over record payloads, oldest to newest.
///
/// Dropping the iterator releases the lock.
pub struct Replay<'a> {
    guard: MutexGuard<'a, RecordRing>,
    next: usize,
}

impl Iterator for Replay<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        let chunk = self.guard.iter().nth(self.next)?.as_bytes().to_vec();
        self.next += 1;
        Some(chunk)
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
