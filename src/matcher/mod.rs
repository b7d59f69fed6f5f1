//! Pattern matching layer for log lines.
//!
//! This module provides:
//! - Placeholder expansion and IPv4 extraction ([`IpPattern`])
//! - Per-file accept/reject pattern lists ([`WatchTarget`])
//! - The result of matching a line ([`Classification`])

mod pattern;
mod target;


pub use pattern::{IP_EXPRESSION, IP_PLACEHOLDER, IpPattern, PatternError, expand_placeholder};
pub use target::{Classification, WatchTarget};
