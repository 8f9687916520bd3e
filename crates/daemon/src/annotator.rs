// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic timestamp annotation of the shared log.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use ringlog_core::{AppendLog, Record};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// RFC 2822-style local time, e.g. `Thu, 07 Aug 2026 14:03:07 +0000`.
const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %T %z";

/// Appends a `timestamp: ...` record to the log on a fixed period until
/// shutdown is signalled.
pub struct Annotator {
    log: Arc<AppendLog>,
    period: Duration,
    shutdown: watch::Receiver<bool>,
}

impl Annotator {
    pub fn new(log: Arc<AppendLog>, period: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            log,
            period,
            shutdown,
        }
    }

    /// Tick until cancelled.
    ///
    /// The inter-tick wait itself is interruptible: on shutdown the task
    /// exits promptly and without appending a final record. A tick that
    /// fails is logged and skipped; the next tick proceeds unaffected.
    pub async fn run(self) {
        let Annotator {
            log,
            period,
            mut shutdown,
        } = self;

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // an interval's first tick fires immediately; consume it so the
        // first annotation lands one full period after startup
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => annotate(&log),
                _ = shutdown.changed() => {
                    debug!("annotator stopping");
                    return;
                }
            }
        }
    }
}

fn annotate(log: &AppendLog) {
    let line = format!("timestamp: {}\n", Local::now().format(TIMESTAMP_FORMAT));
    match Record::copy_from(line.as_bytes()) {
        Ok(record) => log.append_and_evict(record),
        Err(e) => warn!("skipping timestamp tick: {e}"),
    }
}

#[cfg(test)]
#[path = "annotator_tests.rs"]
mod tests;
