//! Per-file detection and enforcement pipeline.
//!
//! One [`Pipeline`] runs per watched file. On every debounced trigger it
//! reads the newly appended lines, classifies each one and dispatches the
//! resulting directives. Cycles run to completion before the next trigger
//! is consumed, so they never overlap.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio_stream::{Stream, StreamExt};

use crate::enforce::{Dispatcher, EnforceError, FirewallBackend};
use crate::matcher::{Classification, WatchTarget};
use crate::monitor::MonitorError;
use crate::tail::{LogTail, TailError};
use crate::time::{Sleeper, TokioSleeper};

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

/// Error that stops a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The log file could not be read.
    #[error(transparent)]
    Tail(#[from] TailError),

    /// A directive could not be enforced.
    #[error("Enforcement failed: {0}")]
    Enforce(#[from] EnforceError),

    /// The blocking read task panicked or was cancelled.
    #[error("Read task failed: {0}")]
    Join(#[from] JoinError),

    /// The trigger stream ended while no shutdown was requested.
    #[error("Monitor for '{}' stopped unexpectedly", path.display())]
    MonitorClosed {
        /// File whose monitor stopped
        path: PathBuf,
    },
}

/// Counters for a single read cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Complete lines consumed
    pub lines: usize,
    /// Lines classified as accept
    pub accepted: usize,
    /// Lines classified as reject
    pub rejected: usize,
}

/// The reader, matcher and dispatcher for one watched file.
///
/// # Type Parameters
///
/// - `T`: The debounced trigger stream
/// - `B`: The firewall backend
/// - `S`: The dispatcher's retry sleeper (defaults to [`TokioSleeper`])
#[derive(Debug)]
pub struct Pipeline<T, B, S = TokioSleeper> {
    target: WatchTarget,
    tail: LogTail,
    triggers: T,
    dispatcher: Arc<Dispatcher<B, S>>,
}

impl<T, B, S> Pipeline<T, B, S>
where
    T: Stream<Item = Result<(), MonitorError>> + Unpin + Send,
    B: FirewallBackend + 'static,
    S: Sleeper + 'static,
{
    /// Assembles a pipeline. `tail` must follow `target`'s path.
    pub fn new(
        target: WatchTarget,
        tail: LogTail,
        triggers: T,
        dispatcher: Arc<Dispatcher<B, S>>,
    ) -> Self {
        Self {
            target,
            tail,
            triggers,
            dispatcher,
        }
    }

    /// Returns the watched target.
    #[must_use]
    pub const fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Returns the current read offset.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.tail.offset()
    }

    /// Runs until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// Monitor errors are logged and skipped. A shutdown request is only
    /// observed between cycles; an in-flight cycle always completes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a read or dispatch fails, or if the
    /// trigger stream ends on its own.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), PipelineError> {
        let path = self.target.path().to_path_buf();

        if *shutdown.borrow_and_update() {
            return Ok(());
        }

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!("Pipeline for '{}' stopping", path.display());
                        return Ok(());
                    }
                }

                trigger = self.triggers.next() => {
                    match trigger {
                        Some(Ok(())) => {
                            self.run_cycle().await?;
                        }
                        Some(Err(e)) => {
                            tracing::warn!("Monitor error on '{}': {e}", path.display());
                        }
                        None => return Err(PipelineError::MonitorClosed { path }),
                    }
                }
            }
        }
    }

    /// Reads the new lines and enforces each classified one.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the read or a dispatch fails. Lines
    /// already dispatched stay consumed.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, PipelineError> {
        let lines = self.read_lines().await?;
        let mut report = CycleReport {
            lines: lines.len(),
            ..CycleReport::default()
        };

        for line in &lines {
            let classification = self.target.classify(line);
            match classification {
                Classification::Accepted(_) => report.accepted += 1,
                Classification::Rejected(_) => report.rejected += 1,
                Classification::NoMatch => continue,
            }
            tracing::debug!("{classification}: {line}");
            self.dispatcher.dispatch(&classification).await?;
        }

        tracing::debug!(
            "Read {} line(s) from '{}' ({} accepted, {} rejected)",
            report.lines,
            self.target.path().display(),
            report.accepted,
            report.rejected
        );
        Ok(report)
    }

    /// Reads the pending lines on the blocking pool.
    async fn read_lines(&mut self) -> Result<Vec<String>, PipelineError> {
        let placeholder = LogTail::new(self.tail.path());
        let mut tail = std::mem::replace(&mut self.tail, placeholder);

        let (tail, lines) = tokio::task::spawn_blocking(move || {
            let lines = tail.read_batch();
            (tail, lines)
        })
        .await?;

        self.tail = tail;
        lines.map_err(PipelineError::from)
    }
}
