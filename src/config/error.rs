//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::matcher::PatternError;
use crate::network::MaskError;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations. Every
/// variant is raised before any file is watched or the firewall touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to parse a JSON configuration.
    #[error("Failed to parse JSON config: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Missing required field that must be provided by CLI or config file.
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired {
        /// Name of the missing field
        field: &'static str,
        /// Hint for how to provide the value
        hint: &'static str,
    },

    /// The firewall namespace name is unusable as an ipset name prefix.
    #[error("Invalid firewall name '{name}': {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A watched file has a pattern that does not compile.
    #[error("Invalid pattern for '{}': {source}", path.display())]
    InvalidPattern {
        /// The watched file the pattern belongs to
        path: PathBuf,
        /// Underlying pattern error
        #[source]
        source: PatternError,
    },

    /// The reject prefix length is outside `0..=32`.
    #[error("Invalid reject prefix length: {0}")]
    InvalidPrefixLen(#[from] MaskError),

    /// Invalid duration value.
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid retry configuration.
    #[error("Invalid retry configuration: {0}")]
    InvalidRetry(String),

    /// The backend search path cannot be joined into `PATH`.
    #[error("Invalid search path '{value}': {reason}")]
    InvalidSearchPath {
        /// The configured search path
        value: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Well-known field names for `MissingRequired` errors.
///
/// Use these constants for compile-time safety when matching field names.
pub mod field {
    /// The firewall namespace name.
    pub const NAME: &str = "firewall.name";
    /// The watched files table.
    pub const FILES: &str = "files";
}

impl ConfigError {
    /// Creates a `MissingRequired` error for a required field.
    #[must_use]
    pub const fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { field, hint }
    }
}
