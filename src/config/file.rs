//! Configuration file parsing.
//!
//! Defines the structure of the configuration file with serde. The same
//! structure is read from TOML or, for files ending in `.json`, from JSON.
//! JSON files may instead use the flat layout of earlier releases, with
//! hyphenated top-level keys such as `firewall-name`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from the config file.
///
/// All scalar fields are optional so they can be merged with CLI
/// arguments. Watched files are keyed by path; a `BTreeMap` keeps startup
/// order stable.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Firewall namespace section
    #[serde(default)]
    pub firewall: FirewallSection,

    /// Reject directive section
    #[serde(default)]
    pub reject: RejectSection,

    /// Monitoring configuration
    #[serde(default)]
    pub monitor: MonitorSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,

    /// Watched files and their patterns
    #[serde(default)]
    pub files: BTreeMap<String, FileSection>,
}

/// Firewall namespace section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FirewallSection {
    /// Namespace name
    pub name: Option<String>,

    /// Colon-separated directories searched first for the backend binaries
    pub search_path: Option<String>,
}

/// Reject directive section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RejectSection {
    /// Prefix length rejected addresses are widened to
    pub prefix_len: Option<i64>,

    /// Seconds before a reject entry expires
    pub timeout: Option<u32>,
}

/// Monitoring configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Debounce quiet period in milliseconds
    pub debounce_ms: Option<u64>,

    /// Longest a burst of writes may defer its read, in milliseconds
    pub max_wait_ms: Option<u64>,

    /// Start at the current end of each file
    #[serde(default)]
    pub from_end: bool,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum number of attempts
    pub max_attempts: Option<u32>,

    /// Initial retry delay in milliseconds
    pub initial_delay_ms: Option<u64>,

    /// Maximum retry delay in milliseconds
    pub max_delay_ms: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,
}

/// Patterns for one watched file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSection {
    /// Patterns whose address is allowed, tried first
    #[serde(default)]
    pub accept: Vec<String>,

    /// Patterns whose address is blocked
    #[serde(default)]
    pub reject: Vec<String>,
}

impl FileConfig {
    /// Loads configuration from a file, choosing the format by extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::parse_json(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Parses configuration from a JSON string.
    ///
    /// Accepts both the sectioned layout and the flat one; a document with
    /// any of the flat top-level keys is read as flat.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or mixes unknown keys in.
    pub fn parse_json(content: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(content)?;

        let is_flat = value
            .as_object()
            .is_some_and(|map| FlatJsonConfig::KEYS.iter().any(|key| map.contains_key(*key)));

        if is_flat {
            let flat: FlatJsonConfig = serde_json::from_value(value)?;
            Ok(flat.into())
        } else {
            serde_json::from_value(value).map_err(ConfigError::from)
        }
    }
}

/// Single-level JSON layout.
///
/// ```json
/// {
///   "firewall-name": "sshguard",
///   "path-iptables-ipset": "/usr/sbin",
///   "reject-bitmask-length": 24,
///   "reject-timeout": 3600,
///   "files": { "/var/log/auth.log": { "reject": ["Failed password for .* from __IP__"] } }
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FlatJsonConfig {
    #[serde(rename = "firewall-name")]
    name: Option<String>,

    #[serde(rename = "path-iptables-ipset")]
    search_path: Option<String>,

    #[serde(rename = "reject-bitmask-length")]
    prefix_len: Option<i64>,

    #[serde(rename = "reject-timeout")]
    timeout: Option<u32>,

    #[serde(default)]
    files: BTreeMap<String, FileSection>,
}

impl FlatJsonConfig {
    const KEYS: [&'static str; 4] = [
        "firewall-name",
        "path-iptables-ipset",
        "reject-bitmask-length",
        "reject-timeout",
    ];
}

impl From<FlatJsonConfig> for FileConfig {
    fn from(flat: FlatJsonConfig) -> Self {
        Self {
            firewall: FirewallSection {
                name: flat.name,
                // Older configs wrote "" for "inherit PATH"
                search_path: flat.search_path.filter(|path| !path.is_empty()),
            },
            reject: RejectSection {
                prefix_len: flat.prefix_len,
                timeout: flat.timeout,
            },
            files: flat.files,
            ..Self::default()
        }
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# logwall configuration file

[firewall]
# Namespace for the ipset sets and iptables rules (required)
# Sets are created as <name>-accept and <name>-reject.
# At most 24 characters: letters, digits, '_', '.', '-'
name = "logwall"

# Directories searched first for ipset, iptables and iptables-save
# search_path = "/usr/sbin:/sbin"

[reject]
# Rejected addresses are widened to this prefix length (0-32, default: 32)
# prefix_len = 24

# Seconds before a reject entry expires (default: 3600)
# timeout = 3600

[monitor]
# Quiet period in milliseconds after the last write before reading (default: 100)
# debounce_ms = 100

# Longest a continuous stream of writes may defer a read, in milliseconds (default: 1000)
# max_wait_ms = 1000

# Start at the current end of each file instead of reading it from the start
# from_end = false

[retry]
# Attempts per set membership update (default: 3)
# max_attempts = 3

# Initial retry delay in milliseconds (default: 200)
# initial_delay_ms = 200

# Maximum retry delay in milliseconds (default: 5000)
# max_delay_ms = 5000

# Backoff multiplier (default: 2.0)
# multiplier = 2.0

# One table per watched file. __IP__ is replaced by an IPv4 expression.
# Accept patterns are tried first; the first match wins.
[files."/var/log/auth.log"]
accept = ['Accepted publickey for \S+ from __IP__']
reject = [
    'Failed password for .* from __IP__',
    'Invalid user \S+ from __IP__',
]
"#
    .to_string()
}
