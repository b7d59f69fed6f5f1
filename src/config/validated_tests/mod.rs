//! Tests for validated configuration.

use super::ConfigError;
use super::cli::Cli;
use super::file::FileConfig;
use super::validated::ValidatedConfig;

/// Helper to create CLI args from a slice
fn cli(args: &[&str]) -> Cli {
    let mut full_args = vec!["logwall"];
    full_args.extend(args);
    Cli::parse_from_iter(full_args)
}

/// Helper to parse TOML config
fn file(content: &str) -> FileConfig {
    FileConfig::parse(content).unwrap()
}

/// A minimal valid config file: a name and one watched file.
fn minimal() -> FileConfig {
    file(
        r#"
        [firewall]
        name = "fw"

        [files."/var/log/auth.log"]
        reject = ["login failed from __IP__"]
    "#,
    )
}

mod validation_tests;
