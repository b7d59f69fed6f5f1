//! External command execution.
//!
//! The firewall backend drives `ipset` and `iptables` as child processes.
//! [`CommandRunner`] abstracts that so the backend can be tested against a
//! recording mock.

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, decoded lossily
    pub stdout: String,
    /// Standard error, decoded lossily
    pub stderr: String,
    /// The exit code, if the process exited normally
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Creates a successful output with the given stdout.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            code: Some(0),
        }
    }

    /// Creates a failed output with the given exit code and stderr.
    #[must_use]
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            code: Some(code),
        }
    }

    /// Returns true if the command exited with status 0.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Trait for running external programs.
///
/// Implementations return `Err` only when the program could not be run at
/// all; a non-zero exit is reported through [`CommandOutput::code`].
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` to completion and captures its output.
    ///
    /// # Errors
    ///
    /// Returns the spawn error if the program could not be started.
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = Result<CommandOutput, io::Error>> + Send;
}

/// [`CommandRunner`] that spawns real processes via `tokio::process`.
///
/// An optional search path is prepended to `PATH` for the children only.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    path_env: Option<OsString>,
}

impl SystemRunner {
    /// Creates a runner that resolves programs through the inherited `PATH`.
    #[must_use]
    pub const fn new() -> Self {
        Self { path_env: None }
    }

    /// Prepends the directories of a colon-separated `search_path` to the
    /// inherited `PATH` for every spawned command.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory contains the path separator.
    pub fn with_search_path(mut self, search_path: &str) -> Result<Self, io::Error> {
        let mut dirs: Vec<PathBuf> = std::env::split_paths(search_path).collect();
        if let Some(inherited) = std::env::var_os("PATH") {
            dirs.extend(std::env::split_paths(&inherited));
        }
        let joined = std::env::join_paths(dirs)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.path_env = Some(joined);
        Ok(self)
    }

    /// Returns the `PATH` value passed to children, if overridden.
    #[must_use]
    pub const fn path_env(&self) -> Option<&OsString> {
        self.path_env.as_ref()
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, io::Error> {
        let mut command = tokio::process::Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = &self.path_env {
            command.env("PATH", path);
        }

        tracing::trace!("Running {} {}", program, args.join(" "));
        let output = command.output().await?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_success_reports_zero_exit() {
        let output = CommandOutput::success("ok");
        assert!(output.is_success());
        assert_eq!(output.stdout, "ok");
    }

    #[test]
    fn output_failure_and_signal_are_not_success() {
        assert!(!CommandOutput::failure(1, "boom").is_success());
        assert!(!CommandOutput::default().is_success());
    }

    #[test]
    fn search_path_is_prepended() {
        let runner = SystemRunner::new().with_search_path("/opt/fw/bin:/opt/fw/sbin").unwrap();

        let path = runner.path_env().unwrap();
        let dirs: Vec<PathBuf> = std::env::split_paths(path).collect();
        assert_eq!(dirs[0], PathBuf::from("/opt/fw/bin"));
        assert_eq!(dirs[1], PathBuf::from("/opt/fw/sbin"));
    }

    #[test]
    fn default_runner_inherits_path() {
        assert!(SystemRunner::new().path_env().is_none());
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let runner = SystemRunner::new();

        let result = runner.run("logwall-no-such-program", &[]).await;

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let runner = SystemRunner::new();

        let output = runner
            .run("sh", &["-c".to_string(), "echo hello; exit 3".to_string()])
            .await
            .unwrap();

        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.code, Some(3));
    }
}
