//! Error types for the monitor layer.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for file change monitoring.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The watch on a log file could not be established.
    ///
    /// Fatal at startup: a configured file must never be silently unwatched.
    #[error("Failed to watch '{}': {source}", path.display())]
    Subscribe {
        /// Path that could not be watched
        path: PathBuf,
        /// Underlying notification error
        #[source]
        source: notify::Error,
    },

    /// The notification backend reported an error not tied to an event.
    ///
    /// Logged by the pipeline; watching continues.
    #[error("File watcher error: {0}")]
    Watcher(#[source] notify::Error),
}
