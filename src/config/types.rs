use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub job: UploadJobSettings,
    #[serde(default)]
    pub retention: RetentionPolicy,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Config {
    /// Build the retention parameters handed to every retention runner
    pub fn retention_parameters(&self) -> RetentionParameters {
        RetentionParameters {
            is_full_backup: self.job.is_full_backup,
            policy: self.retention.clone(),
        }
    }
}

/// Settings for one backup distribution job
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadJobSettings {
    /// Local archive to distribute
    pub backup_file: PathBuf,

    /// Remote folder for this run (e.g. `2026-10-18-10-00.orders`)
    pub folder_name: String,

    /// Remote file name inside `folder_name`
    pub file_name: String,

    pub database_name: String,

    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub task_id: u64,

    #[serde(default)]
    pub backup_type: BackupType,
    #[serde(default = "default_full_backup")]
    pub is_full_backup: bool,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub destinations: DestinationsConfig,
}

impl UploadJobSettings {
    /// Destinations that pass their completeness predicate, in kind order
    pub fn configured_destinations(&self) -> Vec<DestinationSettings> {
        DestinationKind::ALL
            .iter()
            .filter_map(|kind| self.destinations.get(*kind))
            .filter(|settings| settings.is_configured())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackupType {
    #[default]
    Backup,
    Snapshot,
}

/// Global upload configuration shared by every destination client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Upper bound for a single transfer, enforced by the destination client
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_seconds: u64,

    /// Multipart chunk size for clients that split uploads
    #[serde(default = "default_part_size_mb")]
    pub part_size_mb: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            transfer_timeout_seconds: default_transfer_timeout(),
            part_size_mb: default_part_size_mb(),
        }
    }
}

/// Per-destination sections; an absent section means the destination is unused
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DestinationsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_store: Option<ObjectStoreSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archival_store: Option<ArchivalStoreSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_store: Option<BlobStoreSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_store: Option<BucketStoreSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_transfer: Option<FileTransferSettings>,
}

impl DestinationsConfig {
    /// Settings for one destination kind, if that section is present
    pub fn get(&self, kind: DestinationKind) -> Option<DestinationSettings> {
        match kind {
            DestinationKind::ObjectStore => self
                .object_store
                .clone()
                .map(DestinationSettings::ObjectStore),
            DestinationKind::ArchivalStore => self
                .archival_store
                .clone()
                .map(DestinationSettings::ArchivalStore),
            DestinationKind::BlobStore => self.blob_store.clone().map(DestinationSettings::BlobStore),
            DestinationKind::BucketStore => self
                .bucket_store
                .clone()
                .map(DestinationSettings::BucketStore),
            DestinationKind::FileTransfer => self
                .file_transfer
                .clone()
                .map(DestinationSettings::FileTransfer),
        }
    }
}

/// The five supported remote backup targets
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    ObjectStore,
    ArchivalStore,
    BlobStore,
    BucketStore,
    FileTransfer,
}

impl DestinationKind {
    pub const ALL: [DestinationKind; 5] = [
        DestinationKind::ObjectStore,
        DestinationKind::ArchivalStore,
        DestinationKind::BlobStore,
        DestinationKind::BucketStore,
        DestinationKind::FileTransfer,
    ];

    /// Human-readable name used in log lines and error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            DestinationKind::ObjectStore => "S3",
            DestinationKind::ArchivalStore => "Glacier",
            DestinationKind::BlobStore => "Azure",
            DestinationKind::BucketStore => "Google Cloud",
            DestinationKind::FileTransfer => "FTP",
        }
    }

    /// Position of this kind's status slot
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One destination's settings, dispatched by kind
#[derive(Debug, Clone)]
pub enum DestinationSettings {
    ObjectStore(ObjectStoreSettings),
    ArchivalStore(ArchivalStoreSettings),
    BlobStore(BlobStoreSettings),
    BucketStore(BucketStoreSettings),
    FileTransfer(FileTransferSettings),
}

impl DestinationSettings {
    pub fn kind(&self) -> DestinationKind {
        match self {
            DestinationSettings::ObjectStore(_) => DestinationKind::ObjectStore,
            DestinationSettings::ArchivalStore(_) => DestinationKind::ArchivalStore,
            DestinationSettings::BlobStore(_) => DestinationKind::BlobStore,
            DestinationSettings::BucketStore(_) => DestinationKind::BucketStore,
            DestinationSettings::FileTransfer(_) => DestinationKind::FileTransfer,
        }
    }

    /// Whether this destination is configured well enough to attempt an upload
    pub fn is_configured(&self) -> bool {
        match self {
            DestinationSettings::ObjectStore(s) => s.is_configured(),
            DestinationSettings::ArchivalStore(s) => s.is_configured(),
            DestinationSettings::BlobStore(s) => s.is_configured(),
            DestinationSettings::BucketStore(s) => s.is_configured(),
            DestinationSettings::FileTransfer(s) => s.is_configured(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        match self {
            DestinationSettings::ObjectStore(s) => s.disabled,
            DestinationSettings::ArchivalStore(s) => s.disabled,
            DestinationSettings::BlobStore(s) => s.disabled,
            DestinationSettings::BucketStore(s) => s.disabled,
            DestinationSettings::FileTransfer(s) => s.disabled,
        }
    }

    pub fn remote_folder_name(&self) -> &str {
        match self {
            DestinationSettings::ObjectStore(s) => &s.remote_folder_name,
            DestinationSettings::ArchivalStore(s) => &s.remote_folder_name,
            DestinationSettings::BlobStore(s) => &s.remote_folder_name,
            DestinationSettings::BucketStore(s) => &s.remote_folder_name,
            DestinationSettings::FileTransfer(s) => &s.remote_folder_name,
        }
    }
}

/// S3-compatible object store
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ObjectStoreSettings {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    /// Custom endpoint for S3-compatible servers; replaces `region` when set
    #[serde(default)]
    pub custom_server_url: Option<String>,
    #[serde(default)]
    pub remote_folder_name: String,
}

impl ObjectStoreSettings {
    pub fn is_configured(&self) -> bool {
        let has_endpoint = !self.region.trim().is_empty()
            || self
                .custom_server_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty());

        !self.disabled
            && !self.bucket_name.trim().is_empty()
            && !self.access_key.trim().is_empty()
            && !self.secret_key.trim().is_empty()
            && has_endpoint
    }
}

/// Archival cold storage (Glacier vault)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArchivalStoreSettings {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub vault_name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub remote_folder_name: String,
}

impl ArchivalStoreSettings {
    pub fn is_configured(&self) -> bool {
        !self.disabled
            && !self.vault_name.trim().is_empty()
            && !self.region.trim().is_empty()
            && !self.access_key.trim().is_empty()
            && !self.secret_key.trim().is_empty()
    }
}

/// Azure-style blob storage container
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlobStoreSettings {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub account_key: Option<String>,
    #[serde(default)]
    pub sas_token: Option<String>,
    #[serde(default)]
    pub storage_container: String,
    #[serde(default)]
    pub remote_folder_name: String,
}

impl BlobStoreSettings {
    pub fn is_configured(&self) -> bool {
        let has_credentials = [&self.account_key, &self.sas_token]
            .iter()
            .any(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()));

        !self.disabled
            && !self.account_name.trim().is_empty()
            && !self.storage_container.trim().is_empty()
            && has_credentials
    }
}

/// Google Cloud Storage style bucket
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BucketStoreSettings {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub bucket_name: String,
    /// Service account JSON document
    #[serde(default)]
    pub credentials_json: String,
    #[serde(default)]
    pub remote_folder_name: String,
}

impl BucketStoreSettings {
    pub fn is_configured(&self) -> bool {
        !self.disabled
            && !self.bucket_name.trim().is_empty()
            && !self.credentials_json.trim().is_empty()
    }
}

/// FTP/FTPS endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileTransferSettings {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
    /// Base64 certificate for FTPS
    #[serde(default)]
    pub certificate_as_base64: Option<String>,
    #[serde(default)]
    pub remote_folder_name: String,
}

impl FileTransferSettings {
    pub fn is_configured(&self) -> bool {
        !self.disabled
            && !self.url.trim().is_empty()
            && !self.user_name.trim().is_empty()
            && !self.password.is_empty()
    }
}

/// Retention policy applied by retention runners after a successful upload
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RetentionPolicy {
    #[serde(default)]
    pub disabled: bool,
    /// Backups younger than this are never pruned
    #[serde(default)]
    pub minimum_backup_age_seconds: Option<u64>,
    #[serde(default)]
    pub max_backups_to_keep: Option<u32>,
}

/// Passed unchanged to every retention runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionParameters {
    pub is_full_backup: bool,
    pub policy: RetentionPolicy,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_max_files")]
    pub log_max_files: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_directory: default_log_directory(),
            log_level: default_log_level(),
            log_max_files: default_log_max_files(),
        }
    }
}

// Default value functions

fn default_full_backup() -> bool { true }
fn default_transfer_timeout() -> u64 { 12 * 60 * 60 }
fn default_part_size_mb() -> u64 { 100 }
fn default_log_directory() -> PathBuf { PathBuf::from("~/logs") }
fn default_log_level() -> String { "info".to_string() }
fn default_log_max_files() -> u32 { 10 }
