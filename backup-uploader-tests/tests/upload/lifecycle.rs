//! Per-destination lifecycle: spawning, transcript, status slots, retention

use backup_uploader::config::DestinationsConfig;
use backup_uploader::result::UploadState;
use backup_uploader::BackupRunResult;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use test_utils::{
    sample_object_store, DestinationCall, DestinationKind, MockBehavior, MockDestinations,
    ResultAssertions, SettingsBuilder, TestContext,
};

const FILE_NAME: &str = "2026-10-18-02-00.full-backup";
const FOLDER_NAME: &str = "2026-10-18-02-00.orders";

fn upload_calls(mock: &MockDestinations) -> Vec<(DestinationKind, String, u64)> {
    mock.get_calls()
        .into_iter()
        .filter_map(|call| match call {
            DestinationCall::Upload { kind, key, bytes, .. } => Some((kind, key, bytes)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_spawns_one_worker_per_configured_destination() {
    let ctx = TestContext::from_builder(
        SettingsBuilder::new().with_destinations(&[DestinationKind::ObjectStore, DestinationKind::BlobStore]),
        MockDestinations::new(),
    );

    ctx.run().await.assert_ok();

    assert_eq!(ctx.mock().connect_count(), 2);
    assert_eq!(
        ctx.mock().uploaded_kinds(),
        vec![DestinationKind::ObjectStore, DestinationKind::BlobStore]
    );

    let untouched = ctx.status(DestinationKind::ArchivalStore);
    assert!(untouched.skipped);
    assert_eq!(untouched.progress.state, UploadState::NotStarted);
}

#[tokio::test]
async fn test_all_destinations_succeed() {
    let ctx = TestContext::from_builder(
        SettingsBuilder::new().with_all_destinations().with_archive_size(100_000),
        MockDestinations::new(),
    );

    ctx.run().await.assert_ok();

    assert_eq!(ctx.mock().uploaded_kinds(), DestinationKind::ALL.to_vec());
    for kind in DestinationKind::ALL {
        let status = ctx.status(kind);
        assert!(!status.skipped, "{} should not be skipped", kind);
        assert!(status.exception.is_none(), "{} failed: {:?}", kind, status.exception);
        assert_eq!(status.progress.state, UploadState::Done);
        assert_eq!(status.progress.total_bytes, 100_000);
        assert_eq!(status.progress.uploaded_bytes, 100_000);
        assert!(ctx.mock().retention_called(kind));
    }

    assert!(upload_calls(ctx.mock()).iter().all(|(_, _, bytes)| *bytes == 100_000));
}

#[tokio::test]
async fn test_no_destinations_is_silent_success() {
    let ctx = TestContext::from_builder(SettingsBuilder::new(), MockDestinations::new());

    ctx.run().await.assert_ok();

    assert!(ctx.messages().is_empty());
    assert!(ctx.mock().get_calls().is_empty());
}

#[tokio::test]
async fn test_disabled_destination_not_uploaded() {
    let mut destinations = DestinationsConfig::default();
    let mut object_store = sample_object_store();
    object_store.disabled = true;
    destinations.object_store = Some(object_store);

    let ctx = TestContext::from_builder(
        SettingsBuilder::new()
            .with_destinations_config(destinations)
            .with_destination(DestinationKind::FileTransfer),
        MockDestinations::new(),
    );

    ctx.run().await.assert_ok();

    assert_eq!(ctx.mock().uploaded_kinds(), vec![DestinationKind::FileTransfer]);
    assert!(ctx.status(DestinationKind::ObjectStore).skipped);
}

#[tokio::test]
async fn test_transcript_start_and_completion_lines() {
    let ctx = TestContext::from_builder(
        SettingsBuilder::new().with_object_store().with_archive_size(64 * 1024),
        MockDestinations::new(),
    );

    ctx.run().await.assert_ok();

    let messages = ctx.messages();
    let start = messages
        .iter()
        .position(|m| m == "Starting the upload of backup file to S3.")
        .expect("start line");
    let done = messages
        .iter()
        .position(|m| {
            m.starts_with(&format!(
                "Successfully uploaded backup file '{}' to S3, size: 64 KiB, took: ",
                FILE_NAME
            ))
        })
        .expect("completion line");
    assert!(start < done);
}

#[tokio::test]
async fn test_total_bytes_known_before_start_line() {
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = observed.clone();
    let result = BackupRunResult::with_progress_callback(Arc::new(move |run: &BackupRunResult| {
        let latest = run.messages().last().cloned().unwrap_or_default();
        if latest.starts_with("Starting the upload") {
            sink.lock().push(run.status(DestinationKind::BlobStore).progress);
        }
    }));

    let ctx = TestContext::from_builder(
        SettingsBuilder::new()
            .with_destination(DestinationKind::BlobStore)
            .with_archive_size(12_345),
        MockDestinations::new(),
    )
    .with_result(result);

    ctx.run().await.assert_ok();

    let observed = observed.lock();
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].total_bytes, 12_345);
    assert_eq!(observed[0].state, UploadState::PendingUpload);
}

#[tokio::test]
async fn test_progress_callback_fires_per_line() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let result = BackupRunResult::with_progress_callback(Arc::new(move |_: &BackupRunResult| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let ctx = TestContext::from_builder(
        SettingsBuilder::new().with_destinations(&[DestinationKind::BucketStore, DestinationKind::FileTransfer]),
        MockDestinations::new(),
    )
    .with_result(result);

    ctx.run().await.assert_ok();

    assert!(calls.load(Ordering::SeqCst) >= 4);
    assert_eq!(calls.load(Ordering::SeqCst), ctx.messages().len());
}

#[tokio::test]
async fn test_remote_key_uses_folder_prefix() {
    let ctx = TestContext::from_builder(
        SettingsBuilder::new()
            .with_object_store_folder("prod/")
            .with_destination(DestinationKind::BlobStore),
        MockDestinations::new(),
    );

    ctx.run().await.assert_ok();

    let mut keys: Vec<_> = upload_calls(ctx.mock())
        .into_iter()
        .map(|(kind, key, _)| (kind, key))
        .collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            (DestinationKind::ObjectStore, format!("prod/{}/{}", FOLDER_NAME, FILE_NAME)),
            (DestinationKind::BlobStore, format!("{}/{}", FOLDER_NAME, FILE_NAME)),
        ]
    );
}

#[tokio::test]
async fn test_archive_metadata_describes_backup() {
    let ctx = TestContext::from_builder(
        SettingsBuilder::new().with_object_store().incremental().snapshot(),
        MockDestinations::new(),
    );

    ctx.run().await.assert_ok();

    let metadata = ctx
        .mock()
        .get_calls()
        .into_iter()
        .find_map(|call| match call {
            DestinationCall::Upload { metadata, .. } => Some(metadata),
            _ => None,
        })
        .expect("upload call");

    assert!(metadata["description"].starts_with("Incremental snapshot of database 'orders' at "));
    assert_eq!(metadata["database"], "orders");
    assert_eq!(metadata["task"], "nightly");
}

#[tokio::test]
async fn test_retention_receives_run_parameters() {
    let ctx = TestContext::from_builder(
        SettingsBuilder::new().with_destination(DestinationKind::ArchivalStore).incremental(),
        MockDestinations::new(),
    );

    ctx.run().await.assert_ok();

    let parameters = ctx
        .mock()
        .get_calls()
        .into_iter()
        .find_map(|call| match call {
            DestinationCall::Retention { parameters, .. } => Some(parameters),
            _ => None,
        })
        .expect("retention call");
    assert!(!parameters.is_full_backup);
    assert_eq!(parameters, ctx.config().retention_parameters());
}

#[tokio::test]
async fn test_retention_runs_after_upload_and_client_released_last() {
    let ctx = TestContext::from_builder(
        SettingsBuilder::new().with_destination(DestinationKind::FileTransfer),
        MockDestinations::new(),
    );

    ctx.run().await.assert_ok();

    let calls = ctx.mock().get_calls();
    let kinds: Vec<_> = calls
        .iter()
        .map(|call| match call {
            DestinationCall::Connect { .. } => "connect",
            DestinationCall::Upload { .. } => "upload",
            DestinationCall::Retention { .. } => "retention",
            DestinationCall::Released { .. } => "released",
        })
        .collect();
    assert_eq!(kinds, vec!["connect", "upload", "retention", "released"]);
}

#[tokio::test]
async fn test_failed_upload_skips_retention() {
    let mock = MockDestinations::new()
        .expect(DestinationKind::ObjectStore, MockBehavior::FailUpload("403 Forbidden".to_string()));
    let ctx = TestContext::from_builder(
        SettingsBuilder::new().with_destinations(&[DestinationKind::ObjectStore, DestinationKind::BlobStore]),
        mock,
    );

    let _ = ctx.run().await;

    assert!(!ctx.mock().retention_called(DestinationKind::ObjectStore));
    assert!(ctx.mock().retention_called(DestinationKind::BlobStore));
    assert_eq!(ctx.mock().release_count(), 2);
}

#[tokio::test]
async fn test_json_snapshot_after_run() {
    let ctx = TestContext::from_builder(SettingsBuilder::new().with_object_store(), MockDestinations::new());

    ctx.run().await.assert_ok();

    let json = ctx.result().to_json().unwrap();
    assert!(json.contains("\"state\":\"Done\""));
    assert!(json.contains("Successfully uploaded backup file"));
}
