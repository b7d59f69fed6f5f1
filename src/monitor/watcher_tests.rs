//! Tests for the notify-backed watcher.

use std::io::Write;
use std::time::Duration;

use notify::event::{
    AccessKind, CreateKind, DataChange, EventKind, MetadataKind, ModifyKind, RemoveKind, RenameMode,
};
use tokio_stream::StreamExt;

use super::{FileWatcher, MonitorError, NotifyWatcher, is_replacement, is_write};

mod classification {
    use super::*;

    #[test]
    fn data_modification_is_write() {
        assert!(is_write(&EventKind::Modify(ModifyKind::Data(DataChange::Any))));
        assert!(is_write(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(is_write(&EventKind::Modify(ModifyKind::Any)));
    }

    #[test]
    fn other_events_are_ignored() {
        assert!(!is_write(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))));
        assert!(!is_write(&EventKind::Access(AccessKind::Any)));
        assert!(!is_write(&EventKind::Create(CreateKind::File)));
        assert!(!is_write(&EventKind::Any));
    }

    #[test]
    fn creation_and_renames_are_replacements() {
        assert!(is_replacement(&EventKind::Create(CreateKind::File)));
        assert!(is_replacement(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));
        assert!(is_replacement(&EventKind::Modify(ModifyKind::Name(RenameMode::From))));
        assert!(!is_replacement(&EventKind::Modify(ModifyKind::Data(DataChange::Any))));
        assert!(!is_replacement(&EventKind::Remove(RemoveKind::File)));
    }
}

mod subscribe {
    use super::*;

    #[test]
    fn missing_path_fails_with_subscribe_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.log");

        let result = NotifyWatcher::subscribe(&missing);

        match result {
            Err(MonitorError::Subscribe { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Subscribe error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn append_produces_write_notification() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let watcher = NotifyWatcher::subscribe(file.path()).unwrap();
        assert_eq!(watcher.path(), file.path());
        let mut events = watcher.into_stream();

        writeln!(file, "Failed password for root from 10.0.0.1").unwrap();
        file.flush().unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), events.next())
            .await
            .expect("no notification within 5s");
        assert!(matches!(event, Some(Ok(()))));
    }

    #[tokio::test]
    async fn burst_of_appends_coalesces_into_one_notification() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut events = NotifyWatcher::subscribe(file.path()).unwrap().into_stream();

        for n in 0..20 {
            writeln!(file, "line {n}").unwrap();
            file.flush().unwrap();
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(matches!(events.next().await, Some(Ok(()))));
        let next = tokio::time::timeout(Duration::from_millis(300), events.next()).await;
        assert!(next.is_err(), "expected a single pending notification");
    }
}

mod rotation {
    use super::*;

    #[tokio::test]
    async fn recreated_file_produces_notification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.log");
        std::fs::write(&path, "old\n").unwrap();
        let mut events = NotifyWatcher::subscribe(&path).unwrap().into_stream();

        std::fs::rename(&path, dir.path().join("auth.log.1")).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        while tokio::time::timeout(Duration::from_millis(100), events.next()).await.is_ok() {}

        std::fs::write(&path, "Failed password for root from 10.0.0.1\n").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), events.next())
            .await
            .expect("no notification within 5s");
        assert!(matches!(event, Some(Ok(()))));
    }

    #[tokio::test]
    async fn unrelated_files_in_directory_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.log");
        std::fs::write(&path, "").unwrap();
        let mut events = NotifyWatcher::subscribe(&path).unwrap().into_stream();

        std::fs::write(dir.path().join("other.log"), "noise\n").unwrap();

        let next = tokio::time::timeout(Duration::from_millis(500), events.next()).await;
        assert!(next.is_err(), "sibling file must not wake the reader");
    }
}
