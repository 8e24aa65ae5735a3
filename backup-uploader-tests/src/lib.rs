//! Test utilities for backup-uploader
//!
//! This crate provides shared test utilities, mock re-exports,
//! and helper functions for testing the backup-uploader library.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{SettingsBuilder, MockDestinations};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let (uploader, _ctx) = SettingsBuilder::new()
//!         .with_object_store()
//!         .build_uploader(MockDestinations::new());
//!     // ... test code
//! }
//! ```

pub mod fixtures;
pub mod settings_builder;
pub mod test_context;

// Re-export commonly used items
pub use fixtures::*;
pub use settings_builder::SettingsBuilder;
pub use test_context::{OptionAssertions, ResultAssertions, TestContext};

// Re-export types from the main crate for convenience
pub use backup_uploader::config::{
    ArchivalStoreSettings, BackupType, BlobStoreSettings, BucketStoreSettings, Config,
    DestinationKind, DestinationsConfig, FileTransferSettings, ObjectStoreSettings,
    RetentionParameters, RetentionPolicy, UploadConfig, UploadJobSettings,
};
pub use backup_uploader::{BackupRunResult, BackupUploader, UploadError, UploadState};

// Re-export mock implementations from the main crate
pub use backup_uploader::utils::destination::mock::{DestinationCall, MockBehavior, MockDestinations};
