//! Monitor layer for detecting appends to log files.
//!
//! This module provides types and functions for:
//! - Subscribing to write notifications ([`FileWatcher`], [`NotifyWatcher`])
//! - Debouncing bursts of writes ([`DebouncePolicy`], [`DebouncedStream`])
//! - Assembling a per-file trigger stream ([`FileMonitor`])
//! - Error handling ([`MonitorError`])

mod debounce;
mod error;
mod stream;
mod watcher;

#[cfg(test)]
mod watcher_tests;

pub use debounce::DebouncePolicy;
pub use error::MonitorError;
pub use stream::{DebouncedStream, FileMonitor};
pub use watcher::{FileWatcher, NotifyWatcher, WriteEvents, is_replacement, is_write};
