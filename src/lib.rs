//! Backup Uploader Library
//!
//! Distributes a locally produced backup archive to every configured remote
//! destination concurrently, tracks per-destination progress and reduces the
//! individual outcomes into one result.

pub mod config;
pub mod error;
pub mod managers;
pub mod result;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, Config, DestinationKind, RetentionParameters, UploadJobSettings};
pub use error::{ErrorSet, OperationCancelled, UploadError};
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
pub use managers::upload::BackupUploader;
pub use result::{BackupRunResult, DestinationUploadStatus, ProgressCallback, UploadProgress, UploadState};
pub use utils::destination::{DestinationClient, DestinationProvider, RetentionRunner};
pub use utils::progress::ProgressSink;
