//! Enforcement layer: turning classifications into firewall state.
//!
//! This module provides types and traits for:
//! - Running backend programs ([`CommandRunner`], [`SystemRunner`])
//! - Abstracting the packet filter ([`FirewallBackend`], [`IpsetBackend`])
//! - Naming the owned sets ([`FirewallNamespace`], [`SetKind`])
//! - One-time namespace setup ([`bootstrap`])
//! - Dispatching directives with retries ([`Dispatcher`], [`RetryPolicy`])

mod backend;
mod bootstrap;
mod command;
mod directive;
mod dispatch;
mod error;
mod namespace;
mod retry;

#[cfg(test)]
mod retry_tests;

pub use backend::{FirewallBackend, IpsetBackend, RuleAction};
pub use bootstrap::{SetupOutcome, bootstrap};
pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use directive::EnforcementDirective;
pub use dispatch::Dispatcher;
pub use error::{BackendError, EnforceError, IsRetryable};
pub use namespace::{FirewallNamespace, SetKind};
pub use retry::RetryPolicy;
