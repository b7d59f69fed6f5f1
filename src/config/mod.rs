//! Configuration layer for logwall.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - Configuration file parsing, TOML or JSON ([`FileConfig`])
//! - Validated configuration with compiled patterns ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **Config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! The firewall name has no default and must come from `--name` or
//! `firewall.name`. Watched files and their patterns are only read from the
//! config file.
//!
//! # Boolean Flag Semantics
//!
//! Boolean flags (`--from-end`) use OR semantics: `true` in either source
//! wins, and the CLI cannot turn off a flag set in the file.
//!
//! # File-Only Options
//!
//! Some retry policy options are file-only (not available via CLI):
//! - `retry.max_delay_ms` (default: 5000) - Maximum retry delay
//! - `retry.multiplier` (default: 2.0) - Exponential backoff multiplier

mod cli;
pub mod defaults;
mod error;
mod file;
mod validated;

#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use file::{FileConfig, FileSection, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
