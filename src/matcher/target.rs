//! Per-file pattern lists and line classification.

use std::fmt;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use super::pattern::{IpPattern, PatternError};

/// Outcome of matching a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// An accept pattern matched; the address should be allowed.
    Accepted(Ipv4Addr),
    /// A reject pattern matched; the address should be blocked.
    Rejected(Ipv4Addr),
    /// No pattern produced an address.
    NoMatch,
}

impl Classification {
    /// Returns the classified address, if any.
    #[must_use]
    pub const fn address(&self) -> Option<Ipv4Addr> {
        match self {
            Self::Accepted(ip) | Self::Rejected(ip) => Some(*ip),
            Self::NoMatch => None,
        }
    }

    /// Returns true for [`Classification::NoMatch`].
    #[must_use]
    pub const fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted(ip) => write!(f, "accept {ip}"),
            Self::Rejected(ip) => write!(f, "reject {ip}"),
            Self::NoMatch => f.write_str("no match"),
        }
    }
}

/// A watched log file with its ordered accept and reject patterns.
///
/// Built once at startup and owned by the file's pipeline. Accept patterns
/// always take precedence: a line matching both lists is accepted.
///
/// # Example
///
/// ```
/// use logwall::matcher::{Classification, WatchTarget};
/// use std::net::Ipv4Addr;
///
/// let target = WatchTarget::compile(
///     "/var/log/auth.log",
///     &["Accepted publickey .* from (__IP__)".to_string()],
///     &["from (__IP__)".to_string()],
/// )
/// .unwrap();
///
/// let line = "Accepted publickey for deploy from 192.0.2.10 port 50022";
/// assert_eq!(
///     target.classify(line),
///     Classification::Accepted(Ipv4Addr::new(192, 0, 2, 10))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct WatchTarget {
    path: PathBuf,
    accept: Vec<IpPattern>,
    reject: Vec<IpPattern>,
}

impl WatchTarget {
    /// Compiles the accept and reject pattern lists for `path`.
    ///
    /// # Errors
    ///
    /// Returns the first [`PatternError`] encountered, in configuration order.
    pub fn compile(
        path: impl Into<PathBuf>,
        accept: &[String],
        reject: &[String],
    ) -> Result<Self, PatternError> {
        let accept = compile_all(accept)?;
        let reject = compile_all(reject)?;

        Ok(Self {
            path: path.into(),
            accept,
            reject,
        })
    }

    /// Returns the watched file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the accept patterns in evaluation order.
    #[must_use]
    pub fn accept_patterns(&self) -> &[IpPattern] {
        &self.accept
    }

    /// Returns the reject patterns in evaluation order.
    #[must_use]
    pub fn reject_patterns(&self) -> &[IpPattern] {
        &self.reject
    }

    /// Classifies a single log line.
    #[must_use]
    pub fn classify(&self, line: &str) -> Classification {
        if let Some(ip) = first_capture(&self.accept, line) {
            return Classification::Accepted(ip);
        }

        first_capture(&self.reject, line).map_or(Classification::NoMatch, Classification::Rejected)
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<IpPattern>, PatternError> {
    patterns.iter().map(|p| IpPattern::compile(p)).collect()
}

fn first_capture(patterns: &[IpPattern], line: &str) -> Option<Ipv4Addr> {
    patterns.iter().find_map(|pattern| pattern.capture(line))
}
