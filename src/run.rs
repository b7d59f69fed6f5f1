//! Application execution logic.
//!
//! This module wires the validated configuration into one pipeline per
//! watched file and supervises them until a shutdown signal arrives or a
//! pipeline fails.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio_stream::Stream;

use logwall::config::ValidatedConfig;
use logwall::enforce::{
    Dispatcher, EnforceError, FirewallBackend, IpsetBackend, SetupOutcome, SystemRunner, bootstrap,
};
use logwall::matcher::WatchTarget;
use logwall::monitor::{
    DebouncePolicy, DebouncedStream, FileMonitor, FileWatcher, MonitorError, NotifyWatcher,
};
use logwall::pipeline::{Pipeline, PipelineError};
use logwall::tail::{LogTail, TailError};
use logwall::time::Sleeper;

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The backend search path could not be applied.
    #[error("Invalid backend search path: {0}")]
    SearchPath(#[source] std::io::Error),

    /// A configured file could not be watched.
    #[error("Failed to subscribe: {0}")]
    Subscribe(#[source] MonitorError),

    /// The starting offset of a file could not be determined.
    #[error("Failed to position reader: {0}")]
    Tail(#[source] TailError),

    /// Creating the firewall sets or rules failed.
    #[error("Firewall setup failed: {0}")]
    Bootstrap(#[source] EnforceError),

    /// A pipeline stopped with an error.
    #[error("Pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),

    /// A pipeline task panicked or was cancelled.
    #[error("Pipeline task failed: {0}")]
    Join(#[from] JoinError),
}

/// Executes the main application.
///
/// This function:
/// 1. Creates the ipset/iptables backend with the configured search path
/// 2. Subscribes to every watched file
/// 3. Bootstraps the firewall namespace (skipped in dry-run mode)
/// 4. Starts one pipeline per file
/// 5. Runs until a shutdown signal (Ctrl+C, SIGTERM) or the first pipeline error
///
/// # Errors
///
/// Returns an error if:
/// - A watched file cannot be subscribed to
/// - Firewall setup fails
/// - Any pipeline fails
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires:
/// - Real filesystem notifications and backend binaries
/// - Real async runtime with signal handling
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let runner = match config.search_path.as_deref() {
        Some(search_path) => SystemRunner::new()
            .with_search_path(search_path)
            .map_err(RunError::SearchPath)?,
        None => SystemRunner::new(),
    };
    let backend = IpsetBackend::new(runner);

    // Every file must be watchable before the firewall is touched
    let watchers = config
        .targets
        .iter()
        .map(|target| NotifyWatcher::subscribe(target.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(RunError::Subscribe)?;

    if config.dry_run {
        tracing::info!("Dry-run mode enabled - directives will be logged but not enforced");
    } else {
        match bootstrap(&backend, &config.namespace, config.reject_timeout)
            .await
            .map_err(RunError::Bootstrap)?
        {
            SetupOutcome::Created => {
                tracing::info!("Created firewall namespace '{}'", config.namespace);
            }
            SetupOutcome::AlreadyConfigured => {}
        }
    }

    let dispatcher = Arc::new(
        Dispatcher::new(backend, config.namespace)
            .with_reject_prefix(config.reject_prefix)
            .with_retry_policy(config.retry_policy)
            .with_dry_run(config.dry_run),
    );

    let pipelines = build_pipelines(
        config.targets,
        watchers,
        config.debounce,
        config.from_end,
        &dispatcher,
    )?;

    tracing::info!("Monitoring {} file(s)", pipelines.len());
    supervise(pipelines, shutdown_signal()).await
}

/// Pairs each target with its watcher, reader and the shared dispatcher.
///
/// With `from_end`, readers start at each file's current size.
fn build_pipelines<W, B, S>(
    targets: Vec<WatchTarget>,
    watchers: Vec<W>,
    debounce: DebouncePolicy,
    from_end: bool,
    dispatcher: &Arc<Dispatcher<B, S>>,
) -> Result<Vec<Pipeline<DebouncedStream<W::Stream>, B, S>>, RunError>
where
    W: FileWatcher,
    B: FirewallBackend + 'static,
    S: Sleeper + 'static,
{
    targets
        .into_iter()
        .zip(watchers)
        .map(|(target, watcher)| {
            let tail = if from_end {
                LogTail::at_end(target.path()).map_err(RunError::Tail)?
            } else {
                LogTail::new(target.path())
            };
            let triggers = FileMonitor::new(watcher)
                .with_debounce(debounce)
                .into_stream();
            Ok(Pipeline::new(target, tail, triggers, Arc::clone(dispatcher)))
        })
        .collect()
}

/// Runs every pipeline on its own task until `shutdown` completes or one
/// of them fails.
///
/// Either way, the remaining pipelines are told to stop and awaited, so
/// in-flight cycles finish before this returns. The first failure wins.
async fn supervise<T, B, S, F>(
    pipelines: Vec<Pipeline<T, B, S>>,
    shutdown: F,
) -> Result<(), RunError>
where
    T: Stream<Item = Result<(), MonitorError>> + Unpin + Send + 'static,
    B: FirewallBackend + 'static,
    S: Sleeper + 'static,
    F: Future<Output = ()>,
{
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();
    for pipeline in pipelines {
        tasks.spawn(pipeline.run(stop_rx.clone()));
    }
    drop(stop_rx);

    tokio::pin!(shutdown);

    let mut failure = tokio::select! {
        biased;

        () = &mut shutdown => {
            tracing::info!("Shutdown signal received, stopping...");
            None
        }

        failure = first_failure(&mut tasks) => failure,
    };

    stop_tx.send_replace(true);

    while let Some(joined) = tasks.join_next().await {
        if let Some(error) = into_failure(joined) {
            tracing::debug!("Pipeline failed during shutdown: {error}");
            failure.get_or_insert(error);
        }
    }

    failure.map_or(Ok(()), Err)
}

/// Waits for the first pipeline to fail. Returns `None` once every task
/// has finished cleanly.
async fn first_failure(
    tasks: &mut JoinSet<Result<(), PipelineError>>,
) -> Option<RunError> {
    while let Some(joined) = tasks.join_next().await {
        if let Some(error) = into_failure(joined) {
            return Some(error);
        }
    }
    None
}

fn into_failure(joined: Result<Result<(), PipelineError>, JoinError>) -> Option<RunError> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(RunError::Pipeline(e)),
        Err(e) => Some(RunError::Join(e)),
    }
}

/// Returns a future that completes when a shutdown signal is received.
///
/// If a handler cannot be installed, that signal is logged and ignored.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
