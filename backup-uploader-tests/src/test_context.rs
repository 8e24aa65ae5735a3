//! Test context and harness for upload scenarios
//!
//! Bundles a persisted job configuration, a mock destination provider and the
//! run result so scenarios read as: build, run, inspect.

use crate::settings_builder::SettingsBuilder;
use backup_uploader::config::{Config, DestinationKind};
use backup_uploader::result::DestinationUploadStatus;
use backup_uploader::utils::destination::mock::MockDestinations;
use backup_uploader::{BackupRunResult, BackupUploader, UploadError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// One upload run with its resources
pub struct TestContext {
    /// Holds the archive and config file
    temp_dir: TempDir,
    config: Config,
    config_path: PathBuf,
    mock: MockDestinations,
    result: Arc<BackupRunResult>,
    cancel: CancellationToken,
}

impl TestContext {
    /// Persist the builder's configuration and wire it to `mock`
    pub fn from_builder(builder: SettingsBuilder, mock: MockDestinations) -> Self {
        let (config_path, config, temp_dir) = builder.persist();
        Self {
            temp_dir,
            config,
            config_path,
            mock,
            result: Arc::new(BackupRunResult::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Use `result` instead of a fresh one (e.g. to install a progress callback)
    pub fn with_result(mut self, result: BackupRunResult) -> Self {
        self.result = Arc::new(result);
        self
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn mock(&self) -> &MockDestinations {
        &self.mock
    }

    pub fn result(&self) -> Arc<BackupRunResult> {
        self.result.clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Build an uploader from the persisted configuration
    pub fn uploader(&self) -> BackupUploader {
        BackupUploader::new(
            self.config.job.clone(),
            self.config.retention_parameters(),
            Arc::new(self.mock.clone()),
        )
    }

    /// Run the upload to completion
    pub async fn run(&self) -> Result<(), UploadError> {
        self.uploader()
            .execute(self.result.clone(), self.cancel.clone())
            .await
    }

    pub fn messages(&self) -> Vec<String> {
        self.result.messages()
    }

    /// Whether any recorded message contains `needle`
    pub fn has_message(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }

    pub fn status(&self, kind: DestinationKind) -> DestinationUploadStatus {
        self.result.status(kind)
    }

    /// Create a file in the temp dir
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }
}

/// Extension trait for assertion helpers
pub trait ResultAssertions<T> {
    /// Assert that the result is Ok and return the value
    fn assert_ok(self) -> T;

    /// Assert that the result is Err and return the error
    fn assert_err(self) -> Box<dyn std::fmt::Display>;

    /// Assert that the result is Err and the error message contains the given string
    fn assert_err_contains(self, needle: &str);
}

impl<T: std::fmt::Debug, E: std::fmt::Display + std::fmt::Debug + 'static> ResultAssertions<T>
    for Result<T, E>
{
    fn assert_ok(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    }

    fn assert_err(self) -> Box<dyn std::fmt::Display> {
        match self {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => Box::new(e),
        }
    }

    fn assert_err_contains(self, needle: &str) {
        match self {
            Ok(v) => panic!("Expected Err containing '{}', got Ok: {:?}", needle, v),
            Err(e) => {
                let err_msg = e.to_string();
                assert!(
                    err_msg.contains(needle),
                    "Error '{}' does not contain '{}'",
                    err_msg,
                    needle
                );
            }
        }
    }
}

/// Extension trait for Option assertions
pub trait OptionAssertions<T> {
    fn assert_some(self) -> T;
    fn assert_none(self);
}

impl<T: std::fmt::Debug> OptionAssertions<T> for Option<T> {
    fn assert_some(self) -> T {
        match self {
            Some(v) => v,
            None => panic!("Expected Some, got None"),
        }
    }

    fn assert_none(self) {
        if let Some(v) = self {
            panic!("Expected None, got Some: {:?}", v);
        }
    }
}
