//! Configuration module for backup-uploader
//!
//! This module handles loading and validating upload job configuration from TOML files.
//!
//! ## Completeness
//!
//! A destination section may be present but disabled. Present, enabled sections
//! must pass their completeness predicate at load time; the uploader applies
//! the same predicate again before spawning workers.
//!
//! ## Example Usage
//!
//! ```no_run
//! use backup_uploader::config;
//!
//! let config = config::load_config("upload-job.toml")?;
//! for destination in config.job.configured_destinations() {
//!     println!("Will upload to {}", destination.kind());
//! }
//! # Ok::<(), config::ConfigError>(())
//! ```

mod loader;
mod types;

pub use loader::{load_config, parse_config, validate_config, ConfigError, Result};
pub use types::*;

/// Build the remote key for an upload: `prefix/folder/file`, prefix omitted when blank
pub fn destination_key(remote_folder_name: &str, folder_name: &str, file_name: &str) -> String {
    let prefix = remote_folder_name.trim().trim_end_matches('/');
    if prefix.is_empty() {
        format!("{}/{}", folder_name, file_name)
    } else {
        format!("{}/{}/{}", prefix, folder_name, file_name)
    }
}

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
