//! Unit tests for the progress tracker and run result

use backup_uploader::result::UploadState;
use backup_uploader::utils::{ProgressSink, ProgressTracker, RateMeter};
use backup_uploader::BackupRunResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use test_utils::DestinationKind;

fn uploaded_lines(result: &BackupRunResult) -> Vec<String> {
    result
        .messages()
        .into_iter()
        .filter(|m| m.starts_with("Uploaded: "))
        .collect()
}

#[test]
fn test_tracker_emits_after_interval() {
    let result = Arc::new(BackupRunResult::new());
    result.update_status(DestinationKind::FileTransfer, |s| {
        s.progress.total_bytes = 3 * 1024 * 1024;
    });
    let tracker = ProgressTracker::new(DestinationKind::FileTransfer, result.clone());
    let start = Instant::now();

    tracker.record(512 * 1024, start + Duration::from_millis(10));
    assert!(uploaded_lines(&result).is_empty());

    tracker.record(1024 * 1024, start + Duration::from_millis(1100));
    assert_eq!(uploaded_lines(&result), vec!["Uploaded: 1 MiB / 3 MiB"]);

    let progress = result.status(DestinationKind::FileTransfer).progress;
    assert_eq!(progress.uploaded_bytes, 1024 * 1024);
    assert_eq!(progress.state, UploadState::Uploading);
    assert!(progress.bytes_per_second > 0.0);
}

#[test]
fn test_tracker_records_every_update() {
    let result = Arc::new(BackupRunResult::new());
    let tracker = ProgressTracker::new(DestinationKind::BucketStore, result.clone());

    for uploaded in [10, 20, 30] {
        tracker.on_progress(uploaded);
    }

    let progress = result.status(DestinationKind::BucketStore).progress;
    assert_eq!(progress.uploaded_bytes, 30);
    assert!(uploaded_lines(&result).is_empty());
}

#[test]
fn test_tracker_does_not_regress_done_state() {
    let result = Arc::new(BackupRunResult::new());
    result.update_status(DestinationKind::ObjectStore, |s| s.progress.advance(UploadState::Done));
    let tracker = ProgressTracker::new(DestinationKind::ObjectStore, result.clone());

    tracker.on_progress(100);
    assert_eq!(
        result.status(DestinationKind::ObjectStore).progress.state,
        UploadState::Done
    );
}

#[test]
fn test_rate_meter_converges() {
    let mut meter = RateMeter::new();
    for _ in 0..50 {
        meter.tick(1000, Duration::from_secs(1));
    }
    assert!((meter.rate() - 1000.0).abs() < 1e-6);
}

#[test]
fn test_statuses_start_skipped() {
    let result = BackupRunResult::new();
    for kind in DestinationKind::ALL {
        let status = result.status(kind);
        assert!(status.skipped);
        assert!(status.exception.is_none());
        assert_eq!(status.progress.state, UploadState::NotStarted);
    }
}

#[test]
fn test_callback_sees_appended_line() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let result = BackupRunResult::with_progress_callback(Arc::new(move |run: &BackupRunResult| {
        counter.store(run.messages().len(), Ordering::SeqCst);
    }));

    result.add_info("first");
    result.add_info("second");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_snapshot_json_names_every_destination() {
    let result = BackupRunResult::new();
    result.add_info("Starting the upload of backup file to S3.");
    let json = result.to_json().unwrap();

    for field in ["object_store", "archival_store", "blob_store", "bucket_store", "file_transfer"] {
        assert!(json.contains(field), "missing {} in {}", field, json);
    }
    assert!(json.contains("Starting the upload"));
}
