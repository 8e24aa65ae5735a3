//! Backup uploader - distributes one backup archive to every configured destination

use crate::config::{DestinationKind, DestinationSettings, RetentionParameters, UploadJobSettings};
use crate::error::{classify_failure, reduce_errors, ErrorSet, OperationCancelled, UploadError};
use crate::managers::worker::UploadWorker;
use crate::result::BackupRunResult;
use crate::utils::destination::DestinationProvider;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub struct BackupUploader {
    settings: Arc<UploadJobSettings>,
    retention: Arc<RetentionParameters>,
    provider: Arc<dyn DestinationProvider>,
}

impl BackupUploader {
    /// Create new uploader for one backup run
    pub fn new(
        settings: UploadJobSettings,
        retention: RetentionParameters,
        provider: Arc<dyn DestinationProvider>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            retention: Arc::new(retention),
            provider,
        }
    }

    pub fn settings(&self) -> &UploadJobSettings {
        &self.settings
    }

    /// Destinations that will receive the archive
    pub fn configured_destinations(&self) -> Vec<DestinationSettings> {
        self.settings.configured_destinations()
    }

    /// Upload to every configured destination and wait for all of them.
    ///
    /// Workers run concurrently, one per destination. Each failure is recorded on
    /// its status slot in `result`; the combined outcome is:
    /// - `Ok(())` when every upload succeeded (or nothing was configured)
    /// - the single error when exactly one destination failed
    /// - [`UploadError::Cancelled`] when several failed and all were cancelled
    /// - [`UploadError::Aggregate`] otherwise
    pub async fn execute(
        &self,
        result: Arc<BackupRunResult>,
        cancel: CancellationToken,
    ) -> Result<(), UploadError> {
        let destinations = self.configured_destinations();
        if destinations.is_empty() {
            debug!("No upload destinations configured, nothing to do");
            return Ok(());
        }

        info!(
            "Uploading backup '{}' of database '{}' to {} destination(s)",
            self.settings.file_name,
            self.settings.database_name,
            destinations.len()
        );

        let errors = Arc::new(ErrorSet::new());

        // Dropping the set aborts every worker still running
        let mut workers = JoinSet::new();
        let mut kinds: HashMap<task::Id, DestinationKind> = HashMap::new();
        for destination in destinations {
            let kind = destination.kind();
            let worker = UploadWorker {
                settings: self.settings.clone(),
                destination,
                retention: self.retention.clone(),
                provider: self.provider.clone(),
                result: result.clone(),
                errors: errors.clone(),
                cancel: cancel.clone(),
            };
            let handle = workers.spawn(worker.run());
            kinds.insert(handle.id(), kind);
        }

        while let Some(joined) = workers.join_next_with_id().await {
            let join_error = match joined {
                Ok(_) => continue,
                Err(join_error) => join_error,
            };
            let Some(kind) = kinds.get(&join_error.id()).copied() else {
                continue;
            };

            let failure = worker_crash(kind, join_error, &cancel);
            let message = failure.full_message();
            error!(destination = %kind, "Upload worker terminated abnormally: {}", message);
            result.update_status(kind, |status| status.exception = Some(message));
            errors.add(failure);
        }

        let outcome = reduce_errors(errors.drain());
        match &outcome {
            Ok(()) => info!("Backup uploaded to all configured destinations"),
            Err(e) if e.is_cancellation() => info!("Backup upload cancelled"),
            Err(e) => error!("Backup upload finished with errors: {}", e),
        }
        outcome
    }
}

/// Collapse a task-level failure into the destination's classified error
fn worker_crash(kind: DestinationKind, join_error: JoinError, cancel: &CancellationToken) -> UploadError {
    if join_error.is_cancelled() {
        return classify_failure(kind, anyhow::Error::new(OperationCancelled), cancel);
    }

    let reason = match join_error.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string()),
        Err(join_error) => join_error.to_string(),
    };

    UploadError::UploadFailed {
        destination: kind,
        source: anyhow::anyhow!("upload worker panicked: {}", reason),
    }
}
