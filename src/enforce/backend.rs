//! Firewall backend abstraction and its ipset/iptables implementation.

use std::fmt;
use std::future::Future;

use crate::network::Cidr;

use super::{BackendError, CommandOutput, CommandRunner, FirewallNamespace};

/// Verdict of a packet-filter rule consulting a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Let matching traffic through
    Allow,
    /// Silently discard matching traffic
    Drop,
}

impl RuleAction {
    /// Returns the iptables jump target.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Allow => "ACCEPT",
            Self::Drop => "DROP",
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target())
    }
}

/// Trait for packet-filtering backends.
///
/// All operations must be idempotent from the caller's point of view:
/// adding an address that is already a member is a success.
pub trait FirewallBackend: Send + Sync {
    /// Ensures `cidr` is a member of `set`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the backend rejects the update.
    fn ensure_member(
        &self,
        set: &str,
        cidr: &Cidr,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Creates a network set, with entries expiring after `timeout_secs`
    /// when given.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the set cannot be created.
    fn create_set(
        &self,
        set: &str,
        timeout_secs: Option<u32>,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Appends an input rule applying `action` to sources in `set`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the rule cannot be installed.
    fn install_filter_rule(
        &self,
        set: &str,
        action: RuleAction,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Returns true if the namespace's rules are already present.
    ///
    /// Failures to inspect the ruleset count as "not configured".
    fn is_already_configured(
        &self,
        namespace: &FirewallNamespace,
    ) -> impl Future<Output = bool> + Send;
}

/// [`FirewallBackend`] driving the `ipset` and `iptables` binaries.
#[derive(Debug, Clone)]
pub struct IpsetBackend<R> {
    runner: R,
}

impl<R: CommandRunner> IpsetBackend<R> {
    /// Program used for set operations.
    pub const IPSET: &'static str = "ipset";

    /// Program used to install rules.
    pub const IPTABLES: &'static str = "iptables";

    /// Program used to inspect the current ruleset.
    pub const IPTABLES_SAVE: &'static str = "iptables-save";

    /// Creates a backend running commands through `runner`.
    #[must_use]
    pub const fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Returns the command runner.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Runs a command, mapping spawn failures and non-zero exits to errors.
    async fn exec(&self, program: &str, args: Vec<String>) -> Result<CommandOutput, BackendError> {
        let output = self
            .runner
            .run(program, &args)
            .await
            .map_err(|source| BackendError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if output.is_success() {
            Ok(output)
        } else {
            Err(BackendError::CommandFailed {
                program: program.to_string(),
                args,
                code: output.code,
                stderr: output.stderr,
            })
        }
    }
}

impl<R: CommandRunner> FirewallBackend for IpsetBackend<R> {
    async fn ensure_member(&self, set: &str, cidr: &Cidr) -> Result<(), BackendError> {
        let args = vec![
            "-exist".to_string(),
            "add".to_string(),
            set.to_string(),
            cidr.to_string(),
        ];
        self.exec(Self::IPSET, args).await.map(|_| ())
    }

    async fn create_set(&self, set: &str, timeout_secs: Option<u32>) -> Result<(), BackendError> {
        let mut args = vec!["create".to_string(), set.to_string(), "hash:net".to_string()];
        if let Some(timeout) = timeout_secs {
            args.push("timeout".to_string());
            args.push(timeout.to_string());
        }
        self.exec(Self::IPSET, args).await.map(|_| ())
    }

    async fn install_filter_rule(&self, set: &str, action: RuleAction) -> Result<(), BackendError> {
        let args = ["-A", "INPUT", "-m", "set", "--match-set", set, "src", "-j", action.target()]
            .into_iter()
            .map(str::to_string)
            .collect();
        self.exec(Self::IPTABLES, args).await.map(|_| ())
    }

    async fn is_already_configured(&self, namespace: &FirewallNamespace) -> bool {
        match self.exec(Self::IPTABLES_SAVE, Vec::new()).await {
            Ok(output) => output.stdout.contains(&namespace.accept_set()),
            Err(e) => {
                tracing::warn!("Could not inspect ruleset, assuming unconfigured: {e}");
                false
            }
        }
    }
}
