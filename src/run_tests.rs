//! Tests for the run module.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tempfile::{TempDir, tempdir};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use logwall::enforce::{BackendError, FirewallNamespace, RuleAction};
use logwall::network::Cidr;
use logwall::time::InstantSleeper;

use super::*;

#[derive(Debug, Default)]
struct MockBackend {
    adds: Mutex<Vec<String>>,
}

impl MockBackend {
    fn adds(&self) -> Vec<String> {
        self.adds.lock().unwrap().clone()
    }
}

impl FirewallBackend for MockBackend {
    async fn ensure_member(&self, set: &str, cidr: &Cidr) -> Result<(), BackendError> {
        self.adds.lock().unwrap().push(format!("{set} {cidr}"));
        Ok(())
    }

    async fn create_set(&self, _set: &str, _timeout_secs: Option<u32>) -> Result<(), BackendError> {
        Ok(())
    }

    async fn install_filter_rule(&self, _set: &str, _action: RuleAction) -> Result<(), BackendError> {
        Ok(())
    }

    async fn is_already_configured(&self, _namespace: &FirewallNamespace) -> bool {
        true
    }
}

/// Watcher fed by a test-controlled channel.
struct ChannelWatcher {
    rx: mpsc::UnboundedReceiver<Result<(), MonitorError>>,
}

impl FileWatcher for ChannelWatcher {
    type Stream = UnboundedReceiverStream<Result<(), MonitorError>>;

    fn into_stream(self) -> Self::Stream {
        UnboundedReceiverStream::new(self.rx)
    }
}

type Events = mpsc::UnboundedSender<Result<(), MonitorError>>;
type TestDispatcher = Arc<Dispatcher<MockBackend, InstantSleeper>>;

fn channel_watcher() -> (Events, ChannelWatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelWatcher { rx })
}

fn dispatcher() -> TestDispatcher {
    Arc::new(
        Dispatcher::new(MockBackend::default(), FirewallNamespace::new("fw"))
            .with_sleeper(InstantSleeper),
    )
}

fn target(path: &Path) -> WatchTarget {
    WatchTarget::compile(path, &[], &["login failed from __IP__".to_string()]).unwrap()
}

fn log_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn append(path: &Path, content: &str) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

fn short_debounce() -> DebouncePolicy {
    DebouncePolicy::new(Duration::from_millis(10))
}

mod run_error {
    use super::*;

    #[test]
    fn pipeline_error_displays_source() {
        let error = RunError::Pipeline(PipelineError::MonitorClosed {
            path: PathBuf::from("/var/log/auth.log"),
        });

        assert_eq!(
            error.to_string(),
            "Pipeline failed: Monitor for '/var/log/auth.log' stopped unexpectedly"
        );
    }

    #[test]
    fn search_path_displays_source() {
        let error = RunError::SearchPath(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "separator in path",
        ));

        assert!(error.to_string().starts_with("Invalid backend search path"));
    }

    #[test]
    fn debug_format_works() {
        let error = RunError::Pipeline(PipelineError::MonitorClosed {
            path: PathBuf::from("a.log"),
        });
        let debug_str = format!("{error:?}");
        assert!(debug_str.contains("MonitorClosed"));
    }
}

mod building {
    use super::*;

    #[test]
    fn readers_start_at_zero_by_default() {
        let dir = tempdir().unwrap();
        let path = log_file(&dir, "auth.log", "login failed from 10.0.0.1\n");
        let (_tx, watcher) = channel_watcher();

        let pipelines =
            build_pipelines(vec![target(&path)], vec![watcher], short_debounce(), false, &dispatcher())
                .unwrap();

        assert_eq!(pipelines.len(), 1);
        assert_eq!(pipelines[0].offset(), 0);
    }

    #[test]
    fn from_end_starts_at_current_size() {
        let dir = tempdir().unwrap();
        let path = log_file(&dir, "auth.log", "login failed from 10.0.0.1\n");
        let (_tx, watcher) = channel_watcher();

        let pipelines =
            build_pipelines(vec![target(&path)], vec![watcher], short_debounce(), true, &dispatcher())
                .unwrap();

        assert_eq!(pipelines[0].offset(), 27);
    }

    #[test]
    fn from_end_on_missing_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.log");
        let (_tx, watcher) = channel_watcher();

        let result =
            build_pipelines(vec![target(&path)], vec![watcher], short_debounce(), true, &dispatcher());

        assert!(matches!(result, Err(RunError::Tail(_))));
    }

    #[test]
    fn targets_keep_their_order() {
        let dir = tempdir().unwrap();
        let a = log_file(&dir, "a.log", "");
        let b = log_file(&dir, "b.log", "");
        let (_tx_a, watcher_a) = channel_watcher();
        let (_tx_b, watcher_b) = channel_watcher();

        let pipelines = build_pipelines(
            vec![target(&a), target(&b)],
            vec![watcher_a, watcher_b],
            short_debounce(),
            false,
            &dispatcher(),
        )
        .unwrap();

        assert_eq!(pipelines[0].target().path(), a);
        assert_eq!(pipelines[1].target().path(), b);
    }
}

mod supervising {
    use super::*;

    async fn wait_for_adds(dispatcher: &TestDispatcher, count: usize) {
        while dispatcher.backend().adds().len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn shutdown_stops_idle_pipelines() {
        let dir = tempdir().unwrap();
        let path = log_file(&dir, "auth.log", "");
        let (_tx, watcher) = channel_watcher();
        let pipelines =
            build_pipelines(vec![target(&path)], vec![watcher], short_debounce(), false, &dispatcher())
                .unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            supervise(pipelines, std::future::ready(())),
        )
        .await
        .unwrap();

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn triggered_lines_are_enforced_before_shutdown() {
        let dir = tempdir().unwrap();
        let path = log_file(&dir, "auth.log", "");
        let dispatcher = dispatcher();
        let (tx, watcher) = channel_watcher();
        let pipelines =
            build_pipelines(vec![target(&path)], vec![watcher], short_debounce(), false, &dispatcher)
                .unwrap();

        append(&path, "login failed from 10.1.2.77\n");
        tx.send(Ok(())).unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            supervise(pipelines, wait_for_adds(&dispatcher, 1)),
        )
        .await
        .unwrap();

        assert!(result.is_ok());
        assert_eq!(dispatcher.backend().adds(), ["fw-reject 10.1.2.77/32"]);
    }

    #[tokio::test]
    async fn first_failure_stops_the_others() {
        let dir = tempdir().unwrap();
        let healthy = log_file(&dir, "a.log", "");
        let missing = dir.path().join("b.log");
        let (_tx_a, watcher_a) = channel_watcher();
        let (tx_b, watcher_b) = channel_watcher();
        let pipelines = build_pipelines(
            vec![target(&healthy), target(&missing)],
            vec![watcher_a, watcher_b],
            short_debounce(),
            false,
            &dispatcher(),
        )
        .unwrap();

        tx_b.send(Ok(())).unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            supervise(pipelines, std::future::pending()),
        )
        .await
        .unwrap();

        assert!(matches!(
            result,
            Err(RunError::Pipeline(PipelineError::Tail(TailError::Open { .. })))
        ));
    }

    #[tokio::test]
    async fn closed_monitor_is_a_failure() {
        let dir = tempdir().unwrap();
        let path = log_file(&dir, "auth.log", "");
        let (tx, watcher) = channel_watcher();
        let pipelines =
            build_pipelines(vec![target(&path)], vec![watcher], short_debounce(), false, &dispatcher())
                .unwrap();

        drop(tx);

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            supervise(pipelines, std::future::pending()),
        )
        .await
        .unwrap();

        assert!(matches!(
            result,
            Err(RunError::Pipeline(PipelineError::MonitorClosed { .. }))
        ));
    }
}
