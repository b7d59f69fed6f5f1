//! Enforcement namespace naming.

use std::fmt;

/// Which of the two namespace sets a directive targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetKind {
    /// The allow set, `<name>-accept`
    Accept,
    /// The time-limited block set, `<name>-reject`
    Reject,
}

impl SetKind {
    /// Suffix appended to the namespace name.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Prefix scoping the two sets and two filter rules this process owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallNamespace {
    name: String,
}

impl FirewallNamespace {
    /// Creates a namespace. The name is validated by the config layer.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the bare namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the set name for `kind`.
    #[must_use]
    pub fn set_name(&self, kind: SetKind) -> String {
        format!("{}-{}", self.name, kind.suffix())
    }

    /// Returns `<name>-accept`.
    #[must_use]
    pub fn accept_set(&self) -> String {
        self.set_name(SetKind::Accept)
    }

    /// Returns `<name>-reject`.
    #[must_use]
    pub fn reject_set(&self) -> String {
        self.set_name(SetKind::Reject)
    }
}

impl fmt::Display for FirewallNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
