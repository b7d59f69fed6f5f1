//! logwall: log-driven network access control
//!
//! The binary validates its configuration before anything else. Only a
//! valid configuration gets a runtime, and only then are the log files
//! subscribed and the ipset sets and iptables rules created.

use logwall::config::{Cli, Command, write_default_config};
use std::process::ExitCode;

mod app;
mod run;

use app::{exit_code, launch};

/// Parses the command line and either writes a template (`logwall init`)
/// or runs the monitor until shutdown.
///
/// Exit codes: 0 on clean shutdown, 1 for configuration errors, 2 when
/// watching or enforcing fails.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Some(Command::Init { output }) = &cli.command {
        return handle_init(output);
    }

    launch(&cli, run::execute)
}

/// Writes the commented configuration template to `output`.
fn handle_init(output: &std::path::Path) -> ExitCode {
    match write_default_config(output) {
        Ok(()) => {
            println!("Configuration template written to: {}", output.display());
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::CONFIG_ERROR
        }
    }
}
