//! Fluent API for building test upload jobs
//!
//! Provides a builder pattern for creating job settings backed by a real
//! archive file in a temporary directory.

use crate::fixtures::{archive_bytes, configure_destination};
use backup_uploader::config::{
    BackupType, Config, DestinationKind, DestinationsConfig, LoggingSettings, RetentionParameters,
    RetentionPolicy, UploadConfig, UploadJobSettings,
};
use backup_uploader::{BackupUploader, DestinationProvider};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Builder for creating test upload jobs
pub struct SettingsBuilder {
    temp_dir: TempDir,
    job: UploadJobSettings,
    retention: RetentionPolicy,
    archive_size: usize,
    write_archive: bool,
}

impl SettingsBuilder {
    /// Create a new SettingsBuilder with no destinations and a 64 KiB archive
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let backup_file = temp_dir.path().join("2026-10-18-02-00.full-backup");

        let job = UploadJobSettings {
            backup_file,
            folder_name: "2026-10-18-02-00.orders".to_string(),
            file_name: "2026-10-18-02-00.full-backup".to_string(),
            database_name: "orders".to_string(),
            task_name: "nightly".to_string(),
            task_id: 1,
            backup_type: BackupType::Backup,
            is_full_backup: true,
            upload: UploadConfig::default(),
            destinations: DestinationsConfig::default(),
        };

        Self {
            temp_dir,
            job,
            retention: RetentionPolicy::default(),
            archive_size: 64 * 1024,
            write_archive: true,
        }
    }

    /// Configure one destination kind with complete sample settings
    pub fn with_destination(mut self, kind: DestinationKind) -> Self {
        configure_destination(&mut self.job.destinations, kind);
        self
    }

    pub fn with_destinations(self, kinds: &[DestinationKind]) -> Self {
        kinds.iter().fold(self, |builder, kind| builder.with_destination(*kind))
    }

    pub fn with_all_destinations(self) -> Self {
        self.with_destinations(&DestinationKind::ALL)
    }

    pub fn with_object_store(self) -> Self {
        self.with_destination(DestinationKind::ObjectStore)
    }

    /// Replace the destination sections wholesale
    pub fn with_destinations_config(mut self, destinations: DestinationsConfig) -> Self {
        self.job.destinations = destinations;
        self
    }

    /// Set the remote folder prefix of the object store destination
    pub fn with_object_store_folder(mut self, folder: &str) -> Self {
        if self.job.destinations.object_store.is_none() {
            configure_destination(&mut self.job.destinations, DestinationKind::ObjectStore);
        }
        if let Some(ref mut settings) = self.job.destinations.object_store {
            settings.remote_folder_name = folder.to_string();
        }
        self
    }

    pub fn with_archive_size(mut self, size: usize) -> Self {
        self.archive_size = size;
        self
    }

    pub fn incremental(mut self) -> Self {
        self.job.is_full_backup = false;
        self
    }

    pub fn snapshot(mut self) -> Self {
        self.job.backup_type = BackupType::Snapshot;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Point the job at a file that does not exist
    pub fn with_missing_archive(mut self) -> Self {
        self.job.backup_file = self.temp_dir.path().join("missing.full-backup");
        self.write_archive = false;
        self
    }

    pub fn backup_file(&self) -> PathBuf {
        self.job.backup_file.clone()
    }

    /// Build the full configuration (writes the archive)
    pub fn build_config(self) -> (Config, TempDir) {
        self.write_archive();
        let logging = LoggingSettings {
            log_directory: self.temp_dir.path().join("logs"),
            ..Default::default()
        };
        let config = Config {
            job: self.job,
            retention: self.retention,
            logging,
        };
        (config, self.temp_dir)
    }

    /// Build settings and retention parameters (writes the archive)
    pub fn build(self) -> (UploadJobSettings, RetentionParameters, TempDir) {
        let (config, temp_dir) = self.build_config();
        let retention = config.retention_parameters();
        (config.job, retention, temp_dir)
    }

    /// Build an uploader wired to `provider`
    pub fn build_uploader<P>(self, provider: P) -> (BackupUploader, TempDir)
    where
        P: DestinationProvider + 'static,
    {
        let (job, retention, temp_dir) = self.build();
        (BackupUploader::new(job, retention, Arc::new(provider)), temp_dir)
    }

    /// Persist the configuration as TOML and return its path
    pub fn persist(self) -> (PathBuf, Config, TempDir) {
        let (config, temp_dir) = self.build_config();
        let path = temp_dir.path().join("upload-job.toml");
        let contents = toml::to_string_pretty(&config).expect("Failed to serialize config");
        fs::write(&path, contents).expect("Failed to write config");
        (path, config, temp_dir)
    }

    fn write_archive(&self) {
        if !self.write_archive {
            return;
        }
        fs::write(&self.job.backup_file, archive_bytes(self.archive_size))
            .expect("Failed to write archive");
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
