//! Error types for the tail layer.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for reading appended log content.
#[derive(Debug, Error)]
pub enum TailError {
    /// The log file could not be opened or inspected.
    #[error("Failed to open '{}': {source}", path.display())]
    Open {
        /// Path of the log file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading failed part-way through the new content.
    #[error("Failed to read '{}' at offset {offset}: {source}", path.display())]
    Read {
        /// Path of the log file
        path: PathBuf,
        /// Cursor position when the read failed
        offset: u64,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
