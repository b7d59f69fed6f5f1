//! Filesystem write notifications.
//!
//! This module provides the [`FileWatcher`] trait, which abstracts the
//! notification source, and [`NotifyWatcher`], its `notify`-backed
//! implementation.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use notify::event::{EventKind, ModifyKind};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_stream::Stream;

use super::MonitorError;

/// Trait for sources of raw write notifications on a single file.
///
/// # Stream Items
///
/// - `Ok(())` - the file was written to; the caller should read it
/// - `Err(MonitorError)` - a backend error; the caller logs it and carries on
///
/// `into_stream` consumes `self`: a watcher is set up once and lives as
/// long as its stream.
pub trait FileWatcher: Send {
    /// The stream type returned by `into_stream`.
    type Stream: Stream<Item = Result<(), MonitorError>> + Send + Unpin;

    /// Converts this watcher into a notification stream.
    fn into_stream(self) -> Self::Stream;
}

/// [`FileWatcher`] backed by the platform's recommended `notify` watcher
/// (inotify on Linux).
///
/// The subscription is established eagerly in [`NotifyWatcher::subscribe`]
/// so a missing or unreadable path fails at startup, not later.
///
/// Both the file and its parent directory are watched. The file watch
/// follows the open inode, so writes to a file that was just renamed away
/// still wake the reader. The directory watch reports a new file appearing
/// under the watched name, which is how rotation by rename-and-recreate is
/// noticed.
///
/// Notifications are coalesced: the channel holds at most one pending
/// item, and further notifications are dropped while it is full.
#[derive(Debug)]
pub struct NotifyWatcher {
    path: PathBuf,
    watcher: RecommendedWatcher,
    rx: mpsc::Receiver<Result<(), MonitorError>>,
}

impl NotifyWatcher {
    /// Subscribes to write notifications for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Subscribe`] if the watcher cannot be created
    /// or the path or its directory cannot be watched.
    pub fn subscribe(path: impl Into<PathBuf>) -> Result<Self, MonitorError> {
        let path = path.into();
        let (tx, rx) = mpsc::channel(1);

        let subscribe_error = |source| MonitorError::Subscribe {
            path: path.clone(),
            source,
        };

        let name = path.file_name().map(OsStr::to_os_string);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let item = match res {
                Ok(event) if concerns(&event, name.as_deref()) => Ok(()),
                Ok(_) => return,
                Err(e) => Err(MonitorError::Watcher(e)),
            };
            // Full means a wake-up is already pending; closed means shutdown
            let _ = tx.try_send(item);
        })
        .map_err(subscribe_error)?;

        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(subscribe_error)?;
        watcher
            .watch(parent_dir(&path), RecursiveMode::NonRecursive)
            .map_err(subscribe_error)?;

        tracing::info!("Watching '{}'", path.display());

        Ok(Self { path, watcher, rx })
    }

    /// Returns the watched path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// True if `event` should wake the reader of the file called `name`.
fn concerns(event: &Event, name: Option<&OsStr>) -> bool {
    if !is_write(&event.kind) && !is_replacement(&event.kind) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| path.file_name() == name)
}

impl FileWatcher for NotifyWatcher {
    type Stream = WriteEvents;

    fn into_stream(self) -> Self::Stream {
        WriteEvents {
            _watcher: self.watcher,
            rx: self.rx,
        }
    }
}

/// Stream of raw write notifications produced by [`NotifyWatcher`].
///
/// Owns the underlying watcher; dropping the stream removes the watch.
#[derive(Debug)]
pub struct WriteEvents {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<Result<(), MonitorError>>,
}

impl Stream for WriteEvents {
    type Item = Result<(), MonitorError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Returns true for notifications that mean file content changed.
///
/// Metadata changes, opens and closes are ignored.
#[must_use]
pub const fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
    )
}

/// Returns true for notifications that mean a file appeared or moved
/// under a name.
#[must_use]
pub const fn is_replacement(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}
