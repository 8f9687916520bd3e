// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for log store operations.

use thiserror::Error;

/// Errors surfaced by log store operations.
///
/// An offset at or past the stored data is deliberately not an error:
/// positioned reads return an empty buffer and lookups return `None`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogError {
    /// A cancellable wait was aborted by shutdown before the operation
    /// completed. Recoverable: the caller may retry or abort, and no
    /// partial mutation is observable.
    #[error("operation interrupted by shutdown")]
    Interrupted,

    /// Allocation failed while growing a pending record. The in-flight
    /// bytes are dropped; stored records are untouched.
    #[error("out of memory growing a pending record by {additional} bytes")]
    ResourceExhausted { additional: usize },

    /// A seek-to-record command named an index with no live record.
    #[error("no record at index {index}")]
    NoSuchRecord { index: usize },

    /// A seek-to-record command named an offset past the end of its record.
    #[error("offset {offset} out of range for a {len}-byte record")]
    OffsetOutOfRange { offset: u64, len: usize },
}
