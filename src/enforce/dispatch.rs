//! Directive dispatch with retry.

use crate::matcher::Classification;
use crate::network::PrefixLen;
use crate::time::{Sleeper, TokioSleeper};

use super::{
    BackendError, EnforceError, EnforcementDirective, FirewallBackend, FirewallNamespace,
    IsRetryable, RetryPolicy, SetKind,
};

/// Turns classifications into set-membership updates on a backend.
///
/// Shared by every pipeline behind an `Arc`; holds no mutable state. The
/// backend's idempotent adds are the only coordination between pipelines.
///
/// # Type Parameters
///
/// - `B`: The firewall backend
/// - `S`: The sleeper used between retries (defaults to [`TokioSleeper`])
#[derive(Debug)]
pub struct Dispatcher<B, S = TokioSleeper> {
    backend: B,
    sleeper: S,
    namespace: FirewallNamespace,
    reject_prefix: PrefixLen,
    retry_policy: RetryPolicy,
    dry_run: bool,
}

impl<B> Dispatcher<B, TokioSleeper> {
    /// Creates a dispatcher with host-sized reject blocks, the default retry
    /// policy and [`TokioSleeper`].
    #[must_use]
    pub fn new(backend: B, namespace: FirewallNamespace) -> Self {
        Self {
            backend,
            sleeper: TokioSleeper,
            namespace,
            reject_prefix: PrefixLen::HOST,
            retry_policy: RetryPolicy::default(),
            dry_run: false,
        }
    }
}

impl<B, S> Dispatcher<B, S> {
    /// Sets a custom sleeper for retry delays.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> Dispatcher<B, S2> {
        Dispatcher {
            backend: self.backend,
            sleeper,
            namespace: self.namespace,
            reject_prefix: self.reject_prefix,
            retry_policy: self.retry_policy,
            dry_run: self.dry_run,
        }
    }

    /// Sets the prefix length reject directives are widened to.
    #[must_use]
    pub const fn with_reject_prefix(mut self, prefix: PrefixLen) -> Self {
        self.reject_prefix = prefix;
        self
    }

    /// Sets the retry policy for membership adds.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Enables or disables dry-run mode, in which directives are only logged.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the sleeper.
    #[must_use]
    pub const fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Returns the namespace.
    #[must_use]
    pub const fn namespace(&self) -> &FirewallNamespace {
        &self.namespace
    }

    /// Returns the reject prefix length.
    #[must_use]
    pub const fn reject_prefix(&self) -> PrefixLen {
        self.reject_prefix
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns true in dry-run mode.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

impl<B: FirewallBackend, S: Sleeper> Dispatcher<B, S> {
    /// Enforces `classification` and returns the directive that was applied.
    ///
    /// Returns `Ok(None)` for [`Classification::NoMatch`].
    ///
    /// # Errors
    ///
    /// Returns [`EnforceError::Backend`] for a non-retryable failure, or
    /// [`EnforceError::MaxRetriesExceeded`] once the retry policy is spent.
    pub async fn dispatch(
        &self,
        classification: &Classification,
    ) -> Result<Option<EnforcementDirective>, EnforceError> {
        let Some(directive) =
            EnforcementDirective::from_classification(classification, self.reject_prefix)
        else {
            return Ok(None);
        };

        match directive.set_kind {
            SetKind::Accept => tracing::info!("Accepting {}", directive.address),
            SetKind::Reject => tracing::info!("Rejecting {}", directive.address),
        }

        if self.dry_run {
            tracing::info!(
                "Dry run: would add {} to {}",
                directive.address,
                self.namespace.set_name(directive.set_kind)
            );
            return Ok(Some(directive));
        }

        self.apply_with_retry(&directive).await?;
        Ok(Some(directive))
    }

    /// Adds the directive's block to its set, retrying transient failures.
    async fn apply_with_retry(&self, directive: &EnforcementDirective) -> Result<(), EnforceError> {
        let set = self.namespace.set_name(directive.set_kind);
        let mut delays = self.retry_policy.delays();
        let mut attempt = 1;

        loop {
            let error: BackendError = match self.backend.ensure_member(&set, &directive.address).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            // Non-retryable errors fail immediately
            if !error.is_retryable() {
                return Err(error.into());
            }

            let Some(delay) = delays.next() else {
                return Err(EnforceError::MaxRetriesExceeded {
                    attempts: attempt,
                    last_error: error,
                });
            };

            tracing::warn!(
                "Adding {} to {set} failed (attempt {attempt}), retrying in {delay:?}: {error}",
                directive.address
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}
