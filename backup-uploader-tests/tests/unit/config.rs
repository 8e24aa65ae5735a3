//! Unit tests for configuration loading and validation

use backup_uploader::config::{destination_key, load_config, parse_config, ConfigError};
use test_utils::{
    all_destinations_config_toml, minimal_config_toml, DestinationKind, ResultAssertions,
    SettingsBuilder, TestContext,
};
use test_utils::{BackupType, MockDestinations};

fn render(template: &str, ctx: &TestContext) -> String {
    template
        .replace("{backup_file}", &ctx.temp_dir().join("orders.full-backup").display().to_string())
        .replace("{log_dir}", &ctx.temp_dir().join("logs").display().to_string())
}

#[test]
fn test_persisted_config_round_trips_through_loader() {
    let ctx = TestContext::from_builder(
        SettingsBuilder::new()
            .with_destinations(&[DestinationKind::ArchivalStore, DestinationKind::FileTransfer])
            .incremental(),
        MockDestinations::new(),
    );

    let loaded = load_config(ctx.config_path()).assert_ok();
    let kinds: Vec<_> = loaded
        .job
        .configured_destinations()
        .iter()
        .map(|d| d.kind())
        .collect();

    assert_eq!(kinds, vec![DestinationKind::ArchivalStore, DestinationKind::FileTransfer]);
    assert!(!loaded.job.is_full_backup);
    assert_eq!(loaded.job.database_name, "orders");
}

#[test]
fn test_minimal_config_defaults() {
    let ctx = TestContext::from_builder(SettingsBuilder::new(), MockDestinations::new());
    let path = ctx.create_file("minimal.toml", &render(minimal_config_toml(), &ctx));

    let config = load_config(&path).assert_ok();
    assert!(config.job.configured_destinations().is_empty());
    assert_eq!(config.job.backup_type, BackupType::Backup);
    assert_eq!(config.job.upload.part_size_mb, 100);
    assert!(!config.retention.disabled);
    assert_eq!(config.logging.log_level, "info");
    assert_eq!(config.logging.log_max_files, 10);
}

#[test]
fn test_all_destinations_config() {
    let ctx = TestContext::from_builder(SettingsBuilder::new(), MockDestinations::new());
    let config = parse_config(&render(all_destinations_config_toml(), &ctx)).assert_ok();

    assert_eq!(config.job.configured_destinations().len(), 5);
    assert_eq!(config.job.upload.transfer_timeout_seconds, 600);
    assert_eq!(config.job.task_name, "nightly");
    assert_eq!(config.retention.max_backups_to_keep, Some(14));
    assert_eq!(config.logging.log_level, "debug");

    let retention = config.retention_parameters();
    assert!(!retention.is_full_backup);
    assert_eq!(retention.policy.minimum_backup_age_seconds, Some(86400));

    let object_store = config.job.destinations.object_store.as_ref().unwrap();
    assert_eq!(object_store.remote_folder_name, "prod");
}

#[test]
fn test_missing_config_file() {
    let ctx = TestContext::from_builder(SettingsBuilder::new(), MockDestinations::new());
    let result = load_config(ctx.temp_dir().join("nonexistent.toml"));
    assert!(matches!(result, Err(ConfigError::ReadError(_))));
}

#[test]
fn test_malformed_toml() {
    let result = parse_config("[job\nbackup_file = ");
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_missing_job_section() {
    let result = parse_config("[logging]\nlog_level = \"info\"\n");
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_incomplete_blob_store_rejected() {
    let ctx = TestContext::from_builder(SettingsBuilder::new(), MockDestinations::new());
    let contents = format!(
        "{}\n[job.destinations.blob_store]\naccount_name = \"acct\"\nstorage_container = \"backups\"\n",
        render(minimal_config_toml(), &ctx)
    );

    let err = parse_config(&contents).unwrap_err();
    assert!(matches!(err, ConfigError::IncompleteDestination(DestinationKind::BlobStore)));
    assert_eq!(
        err.to_string(),
        "Destination 'Azure' is enabled but not fully configured"
    );
}

#[test]
fn test_zero_timeout_rejected() {
    let ctx = TestContext::from_builder(SettingsBuilder::new(), MockDestinations::new());
    let contents = format!(
        "{}\n[job.upload]\ntransfer_timeout_seconds = 0\n",
        render(minimal_config_toml(), &ctx)
    );

    parse_config(&contents).assert_err_contains("transfer_timeout_seconds");
}

#[test]
fn test_zero_log_files_rejected() {
    let ctx = TestContext::from_builder(SettingsBuilder::new(), MockDestinations::new());
    let contents = format!(
        "{}\n[logging]\nlog_max_files = 0\n",
        render(minimal_config_toml(), &ctx)
    );

    parse_config(&contents).assert_err_contains("log_max_files");
}

#[test]
fn test_destination_display_names() {
    let names: Vec<_> = DestinationKind::ALL.iter().map(|k| k.to_string()).collect();
    assert_eq!(names, vec!["S3", "Glacier", "Azure", "Google Cloud", "FTP"]);
}

#[test]
fn test_destination_key_trims_prefix_separator() {
    assert_eq!(destination_key("prod//", "folder", "file"), "prod/folder/file");
    assert_eq!(destination_key("", "folder", "file"), "folder/file");
}
