//! Shared run state: the live info transcript and per-destination status slots

use crate::config::DestinationKind;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Invoked with the run result after every transcript append
pub type ProgressCallback = Arc<dyn Fn(&BackupRunResult) + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadState {
    #[default]
    NotStarted,
    PendingUpload,
    Uploading,
    Done,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UploadProgress {
    pub state: UploadState,
    pub total_bytes: u64,
    pub uploaded_bytes: u64,
    pub bytes_per_second: f64,
    pub elapsed_ms: u64,
}

impl UploadProgress {
    /// Move forward to `state`; earlier states are ignored
    pub fn advance(&mut self, state: UploadState) {
        if state > self.state {
            self.state = state;
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DestinationUploadStatus {
    pub skipped: bool,
    pub exception: Option<String>,
    pub progress: UploadProgress,
}

impl Default for DestinationUploadStatus {
    fn default() -> Self {
        Self {
            skipped: true,
            exception: None,
            progress: UploadProgress::default(),
        }
    }
}

/// Point-in-time copy of a run, suitable for an external progress feed
#[derive(Debug, Clone, Serialize)]
pub struct BackupRunSnapshot {
    pub messages: Vec<String>,
    pub object_store: DestinationUploadStatus,
    pub archival_store: DestinationUploadStatus,
    pub blob_store: DestinationUploadStatus,
    pub bucket_store: DestinationUploadStatus,
    pub file_transfer: DestinationUploadStatus,
}

/// Live state of one backup distribution run
#[derive(Default)]
pub struct BackupRunResult {
    messages: RwLock<Vec<String>>,
    statuses: [RwLock<DestinationUploadStatus>; 5],
    on_progress: Option<ProgressCallback>,
}

impl BackupRunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result whose transcript appends are streamed to `callback`
    pub fn with_progress_callback(callback: ProgressCallback) -> Self {
        Self {
            on_progress: Some(callback),
            ..Self::default()
        }
    }

    /// Append an info line and notify the progress callback
    pub fn add_info(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.messages.write().push(message);

        if let Some(ref callback) = self.on_progress {
            callback(self);
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.read().clone()
    }

    pub fn status(&self, kind: DestinationKind) -> DestinationUploadStatus {
        self.statuses[kind.index()].read().clone()
    }

    /// Mutate one destination's status slot
    pub fn update_status<R>(
        &self,
        kind: DestinationKind,
        f: impl FnOnce(&mut DestinationUploadStatus) -> R,
    ) -> R {
        f(&mut self.statuses[kind.index()].write())
    }

    pub fn snapshot(&self) -> BackupRunSnapshot {
        BackupRunSnapshot {
            messages: self.messages(),
            object_store: self.status(DestinationKind::ObjectStore),
            archival_store: self.status(DestinationKind::ArchivalStore),
            blob_store: self.status(DestinationKind::BlobStore),
            bucket_store: self.status(DestinationKind::BucketStore),
            file_transfer: self.status(DestinationKind::FileTransfer),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }
}

impl std::fmt::Debug for BackupRunResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupRunResult")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
