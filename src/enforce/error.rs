//! Error types for the enforcement layer.

use std::io;

use thiserror::Error;

/// Error returned by a firewall backend operation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend program could not be started.
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The backend program exited unsuccessfully.
    #[error("'{program} {}' failed ({}): {}", args.join(" "), describe_code(*code), stderr.trim())]
    CommandFailed {
        /// Program that was run
        program: String,
        /// Arguments it was run with
        args: Vec<String>,
        /// Exit code, `None` if terminated by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },
}

fn describe_code(code: Option<i32>) -> String {
    code.map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"))
}

/// Error returned by enforcement dispatch and bootstrap.
#[derive(Debug, Error)]
pub enum EnforceError {
    /// A non-retryable backend failure.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A membership add kept failing after all retry attempts.
    #[error("Gave up after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// Total number of attempts made
        attempts: u32,
        /// The error from the final attempt
        #[source]
        last_error: BackendError,
    },
}

/// Extension trait for checking if an error is retryable.
///
/// Used by the dispatcher to decide whether a failed membership add is
/// worth another attempt.
pub trait IsRetryable {
    /// Returns true if the error is potentially transient and should be retried.
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for BackendError {
    fn is_retryable(&self) -> bool {
        match self {
            // A missing or non-executable binary will not appear by itself
            Self::Spawn { source, .. } => !matches!(
                source.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            ),
            // ipset reports lock contention and transient kernel errors this way
            Self::CommandFailed { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn command_failed(code: Option<i32>) -> BackendError {
        BackendError::CommandFailed {
            program: "ipset".to_string(),
            args: vec!["-exist".into(), "add".into(), "fw-reject".into(), "10.0.0.0/24".into()],
            code,
            stderr: "ipset v7.15: The set with the given name does not exist\n".to_string(),
        }
    }

    #[test]
    fn command_failed_display_includes_command_line() {
        let message = command_failed(Some(1)).to_string();

        assert!(message.contains("ipset -exist add fw-reject 10.0.0.0/24"));
        assert!(message.contains("exit code 1"));
        assert!(message.ends_with("does not exist"));
    }

    #[test]
    fn command_failed_by_signal() {
        assert!(command_failed(None).to_string().contains("terminated by signal"));
    }

    #[test]
    fn missing_binary_is_not_retryable() {
        let error = BackendError::Spawn {
            program: "ipset".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(!error.is_retryable());
    }

    #[test]
    fn interrupted_spawn_is_retryable() {
        let error = BackendError::Spawn {
            program: "ipset".to_string(),
            source: io::Error::from(io::ErrorKind::Interrupted),
        };
        assert!(error.is_retryable());
    }

    #[test]
    fn failed_command_is_retryable() {
        assert!(command_failed(Some(1)).is_retryable());
    }

    #[test]
    fn max_retries_preserves_source() {
        let error = EnforceError::MaxRetriesExceeded {
            attempts: 3,
            last_error: command_failed(Some(1)),
        };

        assert!(error.to_string().starts_with("Gave up after 3 attempts"));
        assert!(error.source().is_some());
    }
}
