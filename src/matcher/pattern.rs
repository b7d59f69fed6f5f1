//! Single log-line pattern with IPv4 extraction.

use std::net::Ipv4Addr;

use regex::Regex;
use thiserror::Error;

/// Marker that configured patterns use in place of an IPv4 address.
pub const IP_PLACEHOLDER: &str = "__IP__";

/// Expression substituted for [`IP_PLACEHOLDER`].
///
/// Matches four dotted octets in `0..=255` written without leading zeros,
/// captured as the named group `ip`.
pub const IP_EXPRESSION: &str = r"(?P<ip>(?:(?:25[0-5]|(?:2[0-4]|1\d|[1-9]|)\d)\.?\b){4})";

/// Name of the capture group holding the address.
const IP_GROUP: &str = "ip";

/// Error raised while compiling a configured pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The expanded pattern is not a valid regular expression.
    #[error("Invalid pattern '{pattern}': {source}")]
    Syntax {
        /// The pattern as configured (before expansion)
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// The pattern has neither the placeholder nor a capture group.
    #[error("Pattern '{pattern}' captures nothing: use __IP__ or a capture group")]
    NoCapture {
        /// The pattern as configured
        pattern: String,
    },
}

/// A compiled pattern that extracts an IPv4 address from a log line.
///
/// Only the first [`IP_PLACEHOLDER`] is expanded; any further occurrence
/// is left in the expression and matches its literal text.
///
/// # Example
///
/// ```
/// use logwall::matcher::IpPattern;
/// use std::net::Ipv4Addr;
///
/// let pattern = IpPattern::compile("Failed password for .* from __IP__").unwrap();
/// let line = "sshd[42]: Failed password for root from 203.0.113.9 port 22";
/// assert_eq!(pattern.capture(line), Some(Ipv4Addr::new(203, 0, 113, 9)));
/// ```
#[derive(Debug, Clone)]
pub struct IpPattern {
    source: String,
    regex: Regex,
}

impl IpPattern {
    /// Expands the placeholder and compiles the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the expanded pattern does not compile or
    /// has no group to take the address from.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let expanded = expand_placeholder(pattern);
        let regex = Regex::new(&expanded).map_err(|source| PatternError::Syntax {
            pattern: pattern.to_string(),
            source,
        })?;

        // captures_len counts the implicit whole-match group
        if regex.captures_len() < 2 {
            return Err(PatternError::NoCapture {
                pattern: pattern.to_string(),
            });
        }

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Returns the pattern as it was configured.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the address captured from `line`, if the pattern matches and
    /// the captured token is a valid IPv4 address.
    ///
    /// The token comes from the `ip` group when it took part in the match,
    /// otherwise from the first capture group.
    #[must_use]
    pub fn capture(&self, line: &str) -> Option<Ipv4Addr> {
        let captures = self.regex.captures(line)?;
        let token = captures.name(IP_GROUP).or_else(|| captures.get(1))?;
        let text = token.as_str().trim_end_matches('.');

        match text.parse::<Ipv4Addr>() {
            Ok(address) => Some(address),
            Err(_) => {
                tracing::debug!(
                    "Pattern '{}' matched but captured '{text}' is not an IPv4 address",
                    self.source
                );
                None
            }
        }
    }
}

/// Replaces the first [`IP_PLACEHOLDER`] with [`IP_EXPRESSION`].
#[must_use]
pub fn expand_placeholder(pattern: &str) -> String {
    pattern.replacen(IP_PLACEHOLDER, IP_EXPRESSION, 1)
}
