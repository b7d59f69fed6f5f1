//! Classification-to-directive conversion.

use std::fmt;

use crate::matcher::Classification;
use crate::network::{Cidr, PrefixLen};

use super::SetKind;

/// A single set-membership update derived from a classified line.
///
/// Accepted hosts are allowed individually (`/32`); rejected hosts are
/// widened to the configured reject prefix so a whole subnet is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnforcementDirective {
    /// Set the address is added to
    pub set_kind: SetKind,
    /// Block to add
    pub address: Cidr,
}

impl EnforcementDirective {
    /// Derives the directive for `classification`, or `None` for
    /// [`Classification::NoMatch`].
    ///
    /// # Example
    ///
    /// ```
    /// use logwall::enforce::{EnforcementDirective, SetKind};
    /// use logwall::matcher::Classification;
    /// use logwall::network::PrefixLen;
    ///
    /// let directive = EnforcementDirective::from_classification(
    ///     &Classification::Rejected("10.1.2.77".parse().unwrap()),
    ///     PrefixLen::new(24).unwrap(),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(directive.set_kind, SetKind::Reject);
    /// assert_eq!(directive.address.to_string(), "10.1.2.0/24");
    /// ```
    #[must_use]
    pub fn from_classification(
        classification: &Classification,
        reject_prefix: PrefixLen,
    ) -> Option<Self> {
        match *classification {
            Classification::Accepted(ip) => Some(Self {
                set_kind: SetKind::Accept,
                address: Cidr::host(ip),
            }),
            Classification::Rejected(ip) => Some(Self {
                set_kind: SetKind::Reject,
                address: Cidr::masked(ip, reject_prefix),
            }),
            Classification::NoMatch => None,
        }
    }
}

impl fmt::Display for EnforcementDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.set_kind, self.address)
    }
}
