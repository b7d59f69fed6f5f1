//! Validated configuration after merging CLI and file sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction,
//! including compiling every watched file's patterns.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::enforce::{FirewallNamespace, RetryPolicy};
use crate::matcher::WatchTarget;
use crate::monitor::DebouncePolicy;
use crate::network::PrefixLen;

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::file::{FileConfig, default_config_template};

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and an
/// optional parsed config file, or [`ValidatedConfig::load`] to read the
/// file named by `--config` first.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Firewall namespace (required)
    pub namespace: FirewallNamespace,

    /// Directories prepended to `PATH` for backend commands
    pub search_path: Option<String>,

    /// Prefix length reject directives are widened to
    pub reject_prefix: PrefixLen,

    /// Lifetime of reject entries in seconds
    pub reject_timeout: u32,

    /// Debounce policy for write notifications
    pub debounce: DebouncePolicy,

    /// Whether cursors start at the current end of each file
    pub from_end: bool,

    /// Retry policy for failed membership updates
    pub retry_policy: RetryPolicy,

    /// Watched files with compiled patterns, ordered by path
    pub targets: Vec<WatchTarget>,

    /// Dry-run mode (log directives without touching the firewall)
    pub dry_run: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ name: {}, files: {}, reject: /{} for {}s, debounce: {}ms, from_end: {}, \
             retry: {}x/{}ms, search_path: {}, dry_run: {} }}",
            self.namespace,
            self.targets.len(),
            self.reject_prefix,
            self.reject_timeout,
            self.debounce.window().as_millis(),
            self.from_end,
            self.retry_policy.max_attempts,
            self.retry_policy.initial_delay.as_millis(),
            self.search_path.as_deref().unwrap_or("inherited"),
            self.dry_run,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and an optional
    /// parsed config file.
    ///
    /// CLI arguments take precedence over file values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The namespace name is missing or invalid
    /// - No files are configured, or a pattern does not compile
    /// - The reject prefix length is outside `0..=32`
    /// - A duration is zero, or the retry settings are inconsistent
    pub fn from_raw(cli: &Cli, file: Option<&FileConfig>) -> Result<Self, ConfigError> {
        let namespace = Self::resolve_name(cli, file)?;
        let search_path = Self::resolve_search_path(cli, file)?;
        let reject_prefix = Self::resolve_reject_prefix(cli, file)?;
        let reject_timeout = Self::resolve_reject_timeout(cli, file)?;
        let debounce = Self::resolve_debounce(cli, file)?;

        // Flags only enable
        let from_end = cli.from_end || file.is_some_and(|f| f.monitor.from_end);

        let retry_policy = Self::build_retry_policy(cli, file)?;
        let targets = Self::compile_targets(file)?;

        Ok(Self {
            namespace,
            search_path,
            reject_prefix,
            reject_timeout,
            debounce,
            from_end,
            retry_policy,
            targets,
            dry_run: cli.dry_run,
            verbose: cli.verbose,
        })
    }

    /// Loads the config file named by `cli.config` and merges it with CLI
    /// arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = FileConfig::load(&cli.config)?;
        Self::from_raw(cli, Some(&file))
    }

    fn resolve_name(cli: &Cli, file: Option<&FileConfig>) -> Result<FirewallNamespace, ConfigError> {
        // CLI takes precedence
        let name = cli
            .name
            .as_deref()
            .or_else(|| file.and_then(|f| f.firewall.name.as_deref()))
            .ok_or_else(|| {
                ConfigError::missing(field::NAME, "Use --name or set firewall.name in config file")
            })?;

        validate_name(name)?;
        Ok(FirewallNamespace::new(name))
    }

    fn resolve_search_path(
        cli: &Cli,
        file: Option<&FileConfig>,
    ) -> Result<Option<String>, ConfigError> {
        let search_path = cli
            .search_path
            .clone()
            .or_else(|| file.and_then(|f| f.firewall.search_path.clone()));

        if let Some(ref value) = search_path {
            if value.split(':').all(|dir| dir.trim().is_empty()) {
                return Err(ConfigError::InvalidSearchPath {
                    value: value.clone(),
                    reason: "no directories given".to_string(),
                });
            }
        }

        Ok(search_path)
    }

    fn resolve_reject_prefix(
        cli: &Cli,
        file: Option<&FileConfig>,
    ) -> Result<PrefixLen, ConfigError> {
        // Priority: CLI explicit > file > default
        let len = cli
            .reject_prefix
            .or_else(|| file.and_then(|f| f.reject.prefix_len))
            .unwrap_or(defaults::REJECT_PREFIX_LEN);

        Ok(PrefixLen::try_from(len)?)
    }

    fn resolve_reject_timeout(cli: &Cli, file: Option<&FileConfig>) -> Result<u32, ConfigError> {
        let seconds = cli
            .reject_timeout
            .or_else(|| file.and_then(|f| f.reject.timeout))
            .unwrap_or(defaults::REJECT_TIMEOUT_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "reject.timeout",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(seconds)
    }

    fn resolve_debounce(cli: &Cli, file: Option<&FileConfig>) -> Result<DebouncePolicy, ConfigError> {
        let millis = cli
            .debounce_ms
            .or_else(|| file.and_then(|f| f.monitor.debounce_ms))
            .unwrap_or(defaults::DEBOUNCE_MS);

        if millis == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "monitor.debounce_ms",
                reason: "must be greater than 0".to_string(),
            });
        }

        let max_wait_ms = cli
            .max_wait_ms
            .or_else(|| file.and_then(|f| f.monitor.max_wait_ms))
            .unwrap_or_else(|| defaults::MAX_WAIT_MS.max(millis));

        if max_wait_ms < millis {
            return Err(ConfigError::InvalidDuration {
                field: "monitor.max_wait_ms",
                reason: format!("must be at least the debounce period ({millis} ms)"),
            });
        }

        Ok(DebouncePolicy::new(Duration::from_millis(millis))
            .with_max_wait(Duration::from_millis(max_wait_ms)))
    }

    fn build_retry_policy(
        cli: &Cli,
        file: Option<&FileConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let retry = file.map(|f| &f.retry);

        // Priority: CLI explicit > file > default
        let max_attempts = cli
            .retry_max
            .or_else(|| retry.and_then(|r| r.max_attempts))
            .unwrap_or(defaults::RETRY_MAX_ATTEMPTS);

        let initial_delay_ms = cli
            .retry_delay_ms
            .or_else(|| retry.and_then(|r| r.initial_delay_ms))
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_MS);

        // An unset cap never undercuts a large initial delay
        let max_delay_ms = retry
            .and_then(|r| r.max_delay_ms)
            .unwrap_or_else(|| defaults::RETRY_MAX_DELAY_MS.max(initial_delay_ms));

        let multiplier = retry
            .and_then(|r| r.multiplier)
            .unwrap_or(defaults::RETRY_MULTIPLIER);

        if max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if initial_delay_ms == 0 {
            return Err(ConfigError::InvalidRetry(
                "initial_delay_ms must be greater than 0".to_string(),
            ));
        }

        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(ConfigError::InvalidRetry(
                "multiplier must be a positive finite number".to_string(),
            ));
        }

        if max_delay_ms < initial_delay_ms {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay_ms ({max_delay_ms}) must be >= initial_delay_ms ({initial_delay_ms})"
            )));
        }

        Ok(RetryPolicy::new()
            .with_max_attempts(max_attempts)
            .with_initial_delay(Duration::from_millis(initial_delay_ms))
            .with_max_delay(Duration::from_millis(max_delay_ms))
            .with_multiplier(multiplier))
    }

    fn compile_targets(file: Option<&FileConfig>) -> Result<Vec<WatchTarget>, ConfigError> {
        let files = file.map(|f| &f.files).filter(|files| !files.is_empty()).ok_or_else(|| {
            ConfigError::missing(field::FILES, "Add a [files.\"<path>\"] table to the config file")
        })?;

        files
            .iter()
            .map(|(path, section)| {
                let path = expand_home(path);
                WatchTarget::compile(&path, &section.accept, &section.reject)
                    .map_err(|source| ConfigError::InvalidPattern { path, source })
            })
            .collect()
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, default_config_template()).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn validate_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty".to_string()));
    }

    if name.len() > defaults::NAME_MAX_LEN {
        return Err(invalid(format!(
            "must be at most {} characters",
            defaults::NAME_MAX_LEN
        )));
    }

    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(invalid(format!("character '{c}' is not allowed")));
    }

    Ok(())
}

/// Expands a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
