//! Debounce policy for write notifications.

use std::time::Duration;

/// Quiet period applied to bursts of write notifications.
///
/// Every notification re-arms the timer; only when the file has been quiet
/// for the whole window is a single read triggered. Buffered writers that
/// flush a log in several small writes therefore cause one read, which
/// picks up every line written so far.
///
/// A file written more often than once per window would never go quiet.
/// [`DebouncePolicy::with_max_wait`] bounds how long the first write of a
/// burst may wait for its read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    window: Duration,
    max_wait: Option<Duration>,
}

impl DebouncePolicy {
    /// Default quiet period in milliseconds.
    pub const DEFAULT_WINDOW_MS: u64 = 100;

    /// Creates a debounce policy with the given quiet period.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            max_wait: None,
        }
    }

    /// Caps the delay between the first write of a burst and its read.
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Returns the quiet period.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Returns the burst cap, if any.
    #[must_use]
    pub const fn max_wait(&self) -> Option<Duration> {
        self.max_wait
    }
}

impl Default for DebouncePolicy {
    /// 100 ms quiet period.
    fn default() -> Self {
        Self::new(Duration::from_millis(Self::DEFAULT_WINDOW_MS))
    }
}
