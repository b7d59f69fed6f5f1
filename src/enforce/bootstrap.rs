//! One-time namespace setup.

use super::{EnforceError, FirewallBackend, FirewallNamespace, RuleAction};

/// Result of [`bootstrap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Sets and rules were created by this call
    Created,
    /// The namespace was already present; nothing was changed
    AlreadyConfigured,
}

/// Creates the namespace's sets and rules unless they already exist.
///
/// The reject side is installed first so blocking is in force before
/// anything is allowed:
///
/// 1. `<name>-reject` set, entries expiring after `reject_timeout_secs`
/// 2. DROP rule for `<name>-reject`
/// 3. `<name>-accept` set, no expiry
/// 4. ACCEPT rule for `<name>-accept`
///
/// # Errors
///
/// Returns [`EnforceError::Backend`] on the first failing step. No retries
/// are made; bootstrap failures are fatal.
pub async fn bootstrap<B: FirewallBackend>(
    backend: &B,
    namespace: &FirewallNamespace,
    reject_timeout_secs: u32,
) -> Result<SetupOutcome, EnforceError> {
    if backend.is_already_configured(namespace).await {
        tracing::info!("Firewall namespace '{namespace}' already configured");
        return Ok(SetupOutcome::AlreadyConfigured);
    }

    let reject = namespace.reject_set();
    let accept = namespace.accept_set();

    backend.create_set(&reject, Some(reject_timeout_secs)).await?;
    backend.install_filter_rule(&reject, RuleAction::Drop).await?;
    backend.create_set(&accept, None).await?;
    backend.install_filter_rule(&accept, RuleAction::Allow).await?;

    tracing::info!(
        "Firewall namespace '{namespace}' created (reject entries expire after {reject_timeout_secs}s)"
    );
    Ok(SetupOutcome::Created)
}
