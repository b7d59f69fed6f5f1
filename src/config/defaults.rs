//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

/// Default configuration file path.
pub const CONFIG_FILE: &str = "logwall.toml";

/// Default prefix length for reject directives (a single host).
pub const REJECT_PREFIX_LEN: i64 = 32;

/// Default lifetime of a reject entry in seconds.
pub const REJECT_TIMEOUT_SECS: u32 = 3600;

/// Default debounce quiet period in milliseconds.
pub const DEBOUNCE_MS: u64 = 100;

/// Default cap in milliseconds on how long a burst of writes may defer its read.
pub const MAX_WAIT_MS: u64 = 1000;

/// Default maximum number of attempts per membership update.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Default initial retry delay in milliseconds.
pub const RETRY_INITIAL_DELAY_MS: u64 = 200;

/// Default maximum retry delay in milliseconds.
pub const RETRY_MAX_DELAY_MS: u64 = 5000;

/// Default retry backoff multiplier.
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// Longest namespace name accepted.
///
/// ipset names are limited to 31 characters and the longest suffix,
/// `-accept` / `-reject`, takes 7.
pub const NAME_MAX_LEN: usize = 24;
