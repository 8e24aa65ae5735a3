//! Upload error taxonomy, failure classification and outcome reduction

use crate::config::DestinationKind;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Raised by destination clients when they abort because the run was cancelled
#[derive(Debug, Clone, Copy, Default, thiserror::Error)]
#[error("The operation was cancelled")]
pub struct OperationCancelled;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Backup upload was cancelled")]
    Cancelled,

    #[error("Upload to {destination} timed out")]
    Timeout {
        destination: DestinationKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to upload the backup file to {destination}")]
    UploadFailed {
        destination: DestinationKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("Backup upload failed for {} destinations: {}", .0.len(), join_messages(.0))]
    Aggregate(Vec<UploadError>),
}

impl UploadError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, UploadError::Cancelled)
    }

    /// Destination this error belongs to, if it names one
    pub fn destination(&self) -> Option<DestinationKind> {
        match self {
            UploadError::Timeout { destination, .. } | UploadError::UploadFailed { destination, .. } => {
                Some(*destination)
            }
            _ => None,
        }
    }

    /// Message followed by its source chain, `a: b: c`
    pub fn full_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

fn join_messages(errors: &[UploadError]) -> String {
    errors
        .iter()
        .map(UploadError::full_message)
        .collect::<Vec<_>>()
        .join("; ")
}

/// True when the innermost cause is a cancellation or an elapsed timeout
pub fn is_cancellation_signal(error: &anyhow::Error) -> bool {
    let root = error.root_cause();
    root.is::<OperationCancelled>() || root.is::<tokio::time::error::Elapsed>()
}

/// Classify a failure raised while uploading to `destination`
pub fn classify_failure(
    destination: DestinationKind,
    error: anyhow::Error,
    cancel: &CancellationToken,
) -> UploadError {
    if is_cancellation_signal(&error) {
        if cancel.is_cancelled() {
            return UploadError::Cancelled;
        }
        // Cancellation without the run token means the client's own timeout fired
        return UploadError::Timeout {
            destination,
            source: error,
        };
    }

    UploadError::UploadFailed {
        destination,
        source: error,
    }
}

/// Reduce the collected worker errors into the run outcome
pub fn reduce_errors(mut errors: Vec<UploadError>) -> Result<(), UploadError> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ if errors.iter().all(UploadError::is_cancellation) => Err(UploadError::Cancelled),
        _ => Err(UploadError::Aggregate(errors)),
    }
}

/// Add-only error collection shared by all workers of a run
#[derive(Debug, Default)]
pub struct ErrorSet {
    errors: Mutex<Vec<UploadError>>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, error: UploadError) {
        self.errors.lock().push(error);
    }

    /// Take every collected error, leaving the set empty
    pub fn drain(&self) -> Vec<UploadError> {
        std::mem::take(&mut *self.errors.lock())
    }
}
