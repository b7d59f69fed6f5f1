//! Sleep abstraction for testability.
//!
//! This module provides a [`Sleeper`] trait so retry loops can be driven
//! by the real tokio timer in production and complete instantly in tests.

use std::future::Future;
use std::time::Duration;

/// Abstraction over asynchronous sleeping.
///
/// # Example
///
/// ```
/// use logwall::time::{InstantSleeper, Sleeper};
/// use std::time::Duration;
///
/// async fn back_off<S: Sleeper>(sleeper: &S) {
///     sleeper.sleep(Duration::from_millis(200)).await;
///     sleeper.sleep(Duration::from_millis(400)).await;
/// }
/// # let _ = back_off(&InstantSleeper);
/// ```
pub trait Sleeper: Send + Sync {
    /// Waits for the given duration.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production sleeper backed by [`tokio::time::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately, for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}
