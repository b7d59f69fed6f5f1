//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::defaults;

/// logwall: log-driven firewall
///
/// Tails log files, matches lines that name an IPv4 address, and adds the
/// address (or its subnet) to an ipset allow or block list.
#[derive(Debug, Parser)]
#[command(name = "logwall")]
#[command(version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are naturally boolean
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file (TOML, or JSON with a .json extension)
    #[arg(long, short, default_value = defaults::CONFIG_FILE)]
    pub config: PathBuf,

    /// Firewall namespace; sets are named <NAME>-accept and <NAME>-reject
    #[arg(long)]
    pub name: Option<String>,

    /// Colon-separated directories searched first for ipset and iptables
    #[arg(long = "search-path", value_name = "DIRS")]
    pub search_path: Option<String>,

    /// Prefix length rejected addresses are widened to (0-32)
    #[arg(long = "reject-prefix", value_name = "LEN")]
    pub reject_prefix: Option<i64>,

    /// Seconds before a reject entry expires
    #[arg(long = "reject-timeout", value_name = "SECS")]
    pub reject_timeout: Option<u32>,

    /// Quiet period in milliseconds before new lines are read
    #[arg(long = "debounce-ms", value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Longest a burst of writes may defer its read, in milliseconds
    #[arg(long = "max-wait-ms", value_name = "MS")]
    pub max_wait_ms: Option<u64>,

    /// Start reading at the current end of each file instead of the start
    #[arg(long = "from-end")]
    pub from_end: bool,

    /// Maximum attempts for a set membership update
    #[arg(long = "retry-max")]
    pub retry_max: Option<u32>,

    /// Initial retry delay in milliseconds
    #[arg(long = "retry-delay-ms", value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    /// Test mode - log directives without touching the firewall
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for logwall
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = defaults::CONFIG_FILE)]
        output: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
