//! Upload worker - runs one destination's full upload lifecycle

use crate::config::{
    destination_key, BackupType, DestinationKind, DestinationSettings, RetentionParameters,
    UploadJobSettings,
};
use crate::error::{classify_failure, ErrorSet, OperationCancelled};
use crate::result::{BackupRunResult, UploadState};
use crate::utils::destination::{DestinationClient, DestinationProvider};
use crate::utils::duration::format_duration_ms;
use crate::utils::progress::ProgressTracker;
use anyhow::{Context, Result};
use chrono::Utc;
use humansize::{format_size, BINARY};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::File;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Everything one worker needs; shared parts are read-only or concurrency-safe
pub(crate) struct UploadWorker {
    pub settings: Arc<UploadJobSettings>,
    pub destination: DestinationSettings,
    pub retention: Arc<RetentionParameters>,
    pub provider: Arc<dyn DestinationProvider>,
    pub result: Arc<BackupRunResult>,
    pub errors: Arc<ErrorSet>,
    pub cancel: CancellationToken,
}

/// Clears the slot's previous outcome and times the upload; drives it to `Done` when dropped
struct UploadScope<'a> {
    kind: DestinationKind,
    result: &'a BackupRunResult,
    started: Instant,
}

impl<'a> UploadScope<'a> {
    fn begin(kind: DestinationKind, result: &'a BackupRunResult) -> Self {
        result.update_status(kind, |status| {
            status.exception = None;
            status.progress.elapsed_ms = 0;
        });

        Self {
            kind,
            result,
            started: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl Drop for UploadScope<'_> {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        self.result.update_status(self.kind, |status| {
            status.progress.elapsed_ms = elapsed_ms;
            status.progress.advance(UploadState::Done);
        });
    }
}

impl UploadWorker {
    /// Run the upload to completion; failures land in the status slot and error set
    pub async fn run(self) {
        let kind = self.destination.kind();

        let outcome = {
            let scope = UploadScope::begin(kind, &self.result);
            self.upload(&scope).await
        };

        if let Err(error) = outcome {
            let classified = classify_failure(kind, error, &self.cancel);
            if classified.is_cancellation() {
                warn!(destination = %kind, "Upload cancelled");
            } else {
                error!(destination = %kind, "Upload failed: {}", classified.full_message());
            }

            let message = classified.full_message();
            self.result.update_status(kind, |status| {
                status.exception = Some(message);
            });
            self.errors.add(classified);
        }
    }

    async fn upload(&self, scope: &UploadScope<'_>) -> Result<()> {
        let kind = scope.kind;
        let backup_file = &self.settings.backup_file;

        // Each worker reads through its own handle from offset 0
        let mut file = File::open(backup_file)
            .await
            .with_context(|| format!("Failed to open backup file: {:?}", backup_file))?;
        self.result.update_status(kind, |status| status.skipped = false);

        let total_bytes = file
            .metadata()
            .await
            .with_context(|| format!("Failed to read metadata of {:?}", backup_file))?
            .len();
        self.result.update_status(kind, |status| {
            status.progress.advance(UploadState::PendingUpload);
            status.progress.total_bytes = total_bytes;
        });

        self.result
            .add_info(format!("Starting the upload of backup file to {}.", kind));

        let client = self.connect().await?;
        let key = destination_key(
            self.destination.remote_folder_name(),
            &self.settings.folder_name,
            &self.settings.file_name,
        );
        let metadata = archive_metadata(&self.settings);
        let tracker = ProgressTracker::new(kind, self.result.clone());

        debug!(destination = %kind, key = %key, "Uploading {} bytes", total_bytes);
        client
            .upload(&mut file, &key, &metadata, &tracker, &self.cancel)
            .await?;

        self.result.add_info(format!(
            "Successfully uploaded backup file '{}' to {}, size: {}, took: {}",
            self.settings.file_name,
            kind,
            format_size(total_bytes, BINARY),
            format_duration_ms(scope.elapsed_ms())
        ));

        self.run_retention(client.as_ref()).await
    }

    /// Acquire a client, aborting early if the run is cancelled meanwhile
    async fn connect(&self) -> Result<Box<dyn DestinationClient>> {
        let kind = self.destination.kind();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(anyhow::Error::new(OperationCancelled)),
            client = self.provider.connect(&self.destination, &self.settings.upload) => {
                client.with_context(|| format!("Failed to connect to {}", kind))
            }
        }
    }

    async fn run_retention(&self, client: &dyn DestinationClient) -> Result<()> {
        let kind = self.destination.kind();
        info!(destination = %kind, "Running retention policy");
        self.provider
            .retention_runner(kind)
            .run(&self.retention, client)
            .await
            .with_context(|| format!("Retention policy failed for {}", kind))
    }
}

/// Description and tags attached to the uploaded archive
pub(crate) fn archive_metadata(settings: &UploadJobSettings) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert("description".to_string(), archive_description(settings));
    metadata.insert("database".to_string(), settings.database_name.clone());
    if !settings.task_name.is_empty() {
        metadata.insert("task".to_string(), settings.task_name.clone());
    }
    metadata
}

fn archive_description(settings: &UploadJobSettings) -> String {
    let scope = if settings.is_full_backup { "Full" } else { "Incremental" };
    let kind = match settings.backup_type {
        BackupType::Backup => "backup",
        BackupType::Snapshot => "snapshot",
    };
    format!(
        "{} {} of database '{}' at {}",
        scope,
        kind,
        settings.database_name,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}
