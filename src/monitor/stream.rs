//! Debounced read triggers.
//!
//! This module provides [`FileMonitor`], which pairs a [`FileWatcher`] with a
//! [`DebouncePolicy`], and [`DebouncedStream`], the stream of read triggers
//! it produces.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::time::{Instant, Sleep, sleep_until};
use tokio_stream::Stream;

use super::{DebouncePolicy, FileWatcher, MonitorError};

/// Builder for a debounced monitor over one file.
///
/// # Example
///
/// ```no_run
/// use logwall::monitor::{DebouncePolicy, FileMonitor, NotifyWatcher};
/// use tokio_stream::StreamExt;
///
/// # async fn example() -> Result<(), logwall::monitor::MonitorError> {
/// let watcher = NotifyWatcher::subscribe("/var/log/auth.log")?;
/// let mut triggers = FileMonitor::new(watcher)
///     .with_debounce(DebouncePolicy::default())
///     .into_stream();
///
/// while let Some(trigger) = triggers.next().await {
///     if trigger.is_ok() {
///         println!("read the new lines now");
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileMonitor<W> {
    watcher: W,
    debounce: DebouncePolicy,
}

impl<W: FileWatcher> FileMonitor<W> {
    /// Creates a monitor with the default 100 ms quiet period.
    #[must_use]
    pub fn new(watcher: W) -> Self {
        Self {
            watcher,
            debounce: DebouncePolicy::default(),
        }
    }

    /// Sets the debounce policy.
    #[must_use]
    pub fn with_debounce(mut self, policy: DebouncePolicy) -> Self {
        self.debounce = policy;
        self
    }

    /// Returns the configured debounce policy.
    #[must_use]
    pub const fn debounce(&self) -> &DebouncePolicy {
        &self.debounce
    }

    /// Converts this monitor into a stream of read triggers.
    #[must_use]
    pub fn into_stream(self) -> DebouncedStream<W::Stream> {
        DebouncedStream::new(self.watcher.into_stream(), self.debounce)
    }
}

/// Stream of read triggers, one per quiet period following writes.
///
/// Cycles between two states: idle (no timer) and pending flush (timer
/// armed). Each write notification arms the timer or pushes its deadline
/// out by a full window; when the timer fires the stream yields `Ok(())`
/// and returns to idle. With a `max_wait` cap the deadline is never pushed
/// past the first write of the burst plus `max_wait`.
///
/// Backend errors from the inner stream are passed through as `Err` items
/// without disturbing a pending flush. When the inner stream ends, a
/// pending flush is still delivered before the stream ends.
#[derive(Debug)]
pub struct DebouncedStream<S> {
    inner: S,
    policy: DebouncePolicy,
    pending: Option<Pin<Box<Sleep>>>,
    burst_limit: Option<Instant>,
    inner_done: bool,
}

impl<S> DebouncedStream<S>
where
    S: Stream<Item = Result<(), MonitorError>> + Unpin,
{
    /// Wraps a raw notification stream.
    pub fn new(inner: S, policy: DebouncePolicy) -> Self {
        Self {
            inner,
            policy,
            pending: None,
            burst_limit: None,
            inner_done: false,
        }
    }

    /// Returns true while a flush is armed.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Arms the flush timer, or pushes an armed one back by a full window.
    fn arm(&mut self) {
        let now = Instant::now();
        if self.pending.is_none() {
            self.burst_limit = self.policy.max_wait().map(|max_wait| now + max_wait);
        }

        let quiet = now + self.policy.window();
        let deadline = self.burst_limit.map_or(quiet, |limit| quiet.min(limit));
        match self.pending.as_mut() {
            Some(timer) => {
                tracing::trace!("Write during quiet period, flush re-armed");
                timer.as_mut().reset(deadline);
            }
            None => {
                tracing::trace!("Write notification, flush armed");
                self.pending = Some(Box::pin(sleep_until(deadline)));
            }
        }
    }
}

impl<S> Stream for DebouncedStream<S>
where
    S: Stream<Item = Result<(), MonitorError>> + Unpin,
{
    type Item = Result<(), MonitorError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Drain every notification that is already available
        while !self.inner_done {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(()))) => self.arm(),
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => self.inner_done = true,
                Poll::Pending => break,
            }
        }

        if let Some(timer) = self.pending.as_mut() {
            if timer.as_mut().poll(cx).is_pending() {
                return Poll::Pending;
            }
            self.pending = None;
            self.burst_limit = None;
            return Poll::Ready(Some(Ok(())));
        }

        if self.inner_done {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}
