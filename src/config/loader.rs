use super::types::*;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Destination '{0}' is enabled but not fully configured")]
    IncompleteDestination(DestinationKind),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_job(&config.job)?;

    if config.logging.log_max_files == 0 {
        return Err(ConfigError::ValidationError(
            "log_max_files must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_job(job: &UploadJobSettings) -> Result<()> {
    if job.backup_file.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "backup_file must not be empty".to_string(),
        ));
    }

    for (field, value) in [
        ("folder_name", &job.folder_name),
        ("file_name", &job.file_name),
        ("database_name", &job.database_name),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} must not be empty",
                field
            )));
        }
    }

    if job.upload.transfer_timeout_seconds == 0 {
        return Err(ConfigError::ValidationError(
            "transfer_timeout_seconds must be greater than zero".to_string(),
        ));
    }

    // A present, enabled section that fails its predicate is a typo, not an opt-out
    for kind in DestinationKind::ALL {
        if let Some(settings) = job.destinations.get(kind) {
            if !settings.is_disabled() && !settings.is_configured() {
                return Err(ConfigError::IncompleteDestination(kind));
            }
        }
    }

    Ok(())
}
