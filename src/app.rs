//! Application startup and utilities.
//!
//! This module contains the startup sequence, exit codes, tracing setup
//! and error hints that support the main entry point.

use std::future::Future;
use std::process::ExitCode;

use logwall::config::{Cli, ConfigError, ValidatedConfig, field};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::run::RunError;

/// Application exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// Success (exit code 0).
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Configuration error (exit code 1) - invalid args, missing required fields, etc.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Runtime error (exit code 2) - unwatchable file, firewall setup or enforcement failure, etc.
    ///
    /// Note: This is a function rather than a constant because `ExitCode::from()` is not `const fn`.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// Returns true if `logwall init` would help with this error.
pub fn suggests_init(error: &ConfigError) -> bool {
    match error {
        ConfigError::MissingRequired { field: f, .. } => *f == field::NAME || *f == field::FILES,
        ConfigError::FileRead { .. } => true,
        _ => false,
    }
}

/// Prints helpful hints for common configuration errors.
pub fn print_config_hint(error: &ConfigError) {
    if suggests_init(error) {
        eprintln!("\nRun 'logwall init' to generate a configuration template.");
    }
}

/// Sets up the tracing subscriber for logging.
///
/// An already installed subscriber is left in place.
pub fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Loads the configuration and drives `run` with it on a new runtime.
///
/// `run` is only called with a valid configuration. Configuration errors
/// are printed with a hint and map to [`exit_code::CONFIG_ERROR`], so
/// nothing reaches the firewall when the configuration is wrong.
pub fn launch<F, Fut>(cli: &Cli, run: F) -> ExitCode
where
    F: FnOnce(ValidatedConfig) -> Fut,
    Fut: Future<Output = Result<(), RunError>>,
{
    let config = match ValidatedConfig::load(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    setup_tracing(config.verbose);
    tracing::info!("{config}");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create Tokio runtime: {e}");
            return exit_code::runtime_error();
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            tracing::error!("Application error: {e}");
            exit_code::runtime_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    mod launching {
        use std::io::Write;
        use std::sync::atomic::{AtomicUsize, Ordering};

        use logwall::enforce::{
            BackendError, FirewallBackend, FirewallNamespace, RuleAction, bootstrap,
        };
        use logwall::network::Cidr;
        use tempfile::NamedTempFile;

        use super::*;

        /// Counts every call that would change the firewall.
        #[derive(Debug, Default)]
        struct CountingBackend {
            calls: AtomicUsize,
        }

        impl CountingBackend {
            fn calls(&self) -> usize {
                self.calls.load(Ordering::SeqCst)
            }

            fn record(&self) -> Result<(), BackendError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        impl FirewallBackend for CountingBackend {
            async fn ensure_member(&self, _set: &str, _cidr: &Cidr) -> Result<(), BackendError> {
                self.record()
            }

            async fn create_set(
                &self,
                _set: &str,
                _timeout: Option<u32>,
            ) -> Result<(), BackendError> {
                self.record()
            }

            async fn install_filter_rule(
                &self,
                _set: &str,
                _action: RuleAction,
            ) -> Result<(), BackendError> {
                self.record()
            }

            async fn is_already_configured(&self, _namespace: &FirewallNamespace) -> bool {
                false
            }
        }

        fn config_file(content: &str) -> NamedTempFile {
            let mut file = NamedTempFile::new().unwrap();
            file.write_all(content.as_bytes()).unwrap();
            file
        }

        fn launch_with(file: &NamedTempFile, extra: &[&str], backend: &CountingBackend) -> ExitCode {
            let path = file.path().to_str().unwrap();
            let args = ["logwall", "-c", path].into_iter().chain(extra.iter().copied());
            let cli = Cli::parse_from_iter(args);

            launch(&cli, |config| async move {
                bootstrap(backend, &config.namespace, config.reject_timeout)
                    .await
                    .map(|_| ())
                    .map_err(RunError::Bootstrap)
            })
        }

        const VALID: &str = "[firewall]\nname = \"fw\"\n\n[files.\"/var/log/a.log\"]\nreject = [\"x __IP__\"]\n";

        #[test]
        fn valid_config_reaches_firewall_setup() {
            let backend = CountingBackend::default();

            let code = launch_with(&config_file(VALID), &[], &backend);

            assert_eq!(code, exit_code::SUCCESS);
            assert!(backend.calls() > 0);
        }

        #[test]
        fn out_of_range_prefix_never_touches_firewall() {
            let backend = CountingBackend::default();

            let code = launch_with(&config_file(VALID), &["--reject-prefix", "33"], &backend);

            assert_eq!(code, exit_code::CONFIG_ERROR);
            assert_eq!(backend.calls(), 0);
        }

        #[test]
        fn invalid_pattern_never_touches_firewall() {
            let backend = CountingBackend::default();
            let file = config_file(
                "[firewall]\nname = \"fw\"\n\n[files.\"/var/log/a.log\"]\nreject = [\"(unclosed __IP__\"]\n",
            );

            let code = launch_with(&file, &[], &backend);

            assert_eq!(code, exit_code::CONFIG_ERROR);
            assert_eq!(backend.calls(), 0);
        }

        #[test]
        fn run_failure_is_runtime_error() {
            let file = config_file(VALID);
            let cli = Cli::parse_from_iter(["logwall", "-c", file.path().to_str().unwrap()]);

            let code = launch(&cli, |_| async {
                Err(RunError::SearchPath(std::io::Error::from(
                    std::io::ErrorKind::InvalidInput,
                )))
            });

            assert_eq!(code, exit_code::runtime_error());
        }
    }

    #[test]
    fn missing_name_suggests_init() {
        let error = ConfigError::missing(field::NAME, "Use --name");
        assert!(suggests_init(&error));
    }

    #[test]
    fn missing_files_suggests_init() {
        let error = ConfigError::missing(field::FILES, "Add a table");
        assert!(suggests_init(&error));
    }

    #[test]
    fn unreadable_file_suggests_init() {
        let error = ConfigError::FileRead {
            path: PathBuf::from("logwall.toml"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(suggests_init(&error));
    }

    #[test]
    fn invalid_value_does_not_suggest_init() {
        let error = ConfigError::InvalidRetry("max_attempts must be greater than 0".to_string());
        assert!(!suggests_init(&error));
    }
}
