//! Unit tests for backup-uploader
//!
//! Exercise the public library API without running an upload.
//! Run with: `cargo test -p backup-uploader-tests --test unit`

mod config;
mod duration;
mod progress;
