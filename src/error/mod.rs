//! Error types and handling for the runner
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`config`]: Configuration errors
//! - [`runtime`]: Runtime environment preflight errors
//! - [`asset`]: Asset download, verification and extraction errors
//! - [`storage`]: Object storage errors
//! - [`analysis`]: Audio decoding, model and analysis errors
//! - [`launch`]: Entrypoint launch errors
//! - [`fs`]: File system errors

mod macros;

pub mod analysis;
pub mod asset;
pub mod config;
pub mod fs;
pub mod launch;
pub mod runtime;
pub mod storage;

pub(crate) use macros::error_constructors;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for runner operations
#[derive(Error, Diagnostic, Debug)]
pub enum RunnerError {
    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(audioclip::config::not_found),
        help("Pass --config, set AUDIOCLIP_CONFIG, or create ./audioclip.yaml")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(audioclip::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(audioclip::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Failed to read configuration file: {path}: {reason}")]
    #[diagnostic(code(audioclip::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    // Runtime environment errors
    #[error("Runtime environment preflight failed: {problems}")]
    #[diagnostic(
        code(audioclip::runtime::preflight_failed),
        help("Install the missing tools or fix directory permissions before provisioning")
    )]
    PreflightFailed { problems: String },

    // Asset errors
    #[error("Unsupported asset URL: {url}")]
    #[diagnostic(
        code(audioclip::asset::unsupported_url),
        help("Asset URLs must use http://, https:// or file://")
    )]
    UnsupportedUrl { url: String },

    #[error("Failed to download asset from {url}: {reason}")]
    #[diagnostic(
        code(audioclip::asset::download_failed),
        help("Check network access and that the pinned URL still exists")
    )]
    DownloadFailed { url: String, reason: String },

    #[error("Asset digest mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(audioclip::asset::digest_mismatch),
        help("The archive at the pinned URL changed or was corrupted in transit")
    )]
    DigestMismatch { expected: String, actual: String },

    #[error("Corrupt asset archive {path}: {reason}")]
    #[diagnostic(code(audioclip::asset::archive_corrupt))]
    ArchiveCorrupt { path: String, reason: String },

    #[error("Archive entry escapes the asset directory: {entry}")]
    #[diagnostic(code(audioclip::asset::unsafe_entry))]
    UnsafeArchiveEntry { entry: String },

    #[error("Expected entry missing from asset bundle: {entry}")]
    #[diagnostic(
        code(audioclip::asset::missing_entry),
        help("The archive layout does not match asset.expected_entries")
    )]
    MissingExpectedEntry { entry: String },

    #[error("Asset bundle is not provisioned at {dir}")]
    #[diagnostic(
        code(audioclip::asset::not_provisioned),
        help("Run 'audioclip-runner provision' first")
    )]
    NotProvisioned { dir: String },

    #[error("Provisioned asset does not match: {reason}")]
    #[diagnostic(
        code(audioclip::asset::stamp_mismatch),
        help("Run 'audioclip-runner provision --force' to reprovision")
    )]
    StampMismatch { reason: String },

    // Storage errors
    #[error("Object storage is not configured")]
    #[diagnostic(
        code(audioclip::storage::not_configured),
        help("Set storage.backend to 'local' or 'http' in the configuration")
    )]
    StorageNotConfigured,

    #[error("Invalid object key: {key}")]
    #[diagnostic(code(audioclip::storage::invalid_key))]
    InvalidStorageKey { key: String },

    #[error("Object not found: {key}")]
    #[diagnostic(code(audioclip::storage::not_found))]
    ObjectNotFound { key: String },

    #[error("Failed to get object '{key}': {reason}")]
    #[diagnostic(code(audioclip::storage::get_failed))]
    StorageGetFailed { key: String, reason: String },

    #[error("Failed to put object '{key}': {reason}")]
    #[diagnostic(code(audioclip::storage::put_failed))]
    StoragePutFailed { key: String, reason: String },

    // Analysis errors
    #[error("Failed to decode audio {path}: {reason}")]
    #[diagnostic(code(audioclip::analysis::decode_failed))]
    AudioDecodeFailed { path: String, reason: String },

    #[error("Failed to resample audio: {reason}")]
    #[diagnostic(code(audioclip::analysis::resample_failed))]
    ResampleFailed { reason: String },

    #[error("Failed to load model {path}: {reason}")]
    #[diagnostic(code(audioclip::model::load_failed))]
    ModelLoadFailed { path: String, reason: String },

    #[error("Model inference failed: {reason}")]
    #[diagnostic(code(audioclip::model::inference_failed))]
    InferenceFailed { reason: String },

    #[error("{failed} of {total} files failed to be analyzed")]
    #[diagnostic(
        code(audioclip::analysis::batch_failed),
        help("See the log file for per-file errors")
    )]
    AnalysisFailed { failed: usize, total: usize },

    // Launch errors
    #[error("No entrypoint command configured")]
    #[diagnostic(
        code(audioclip::launch::no_command),
        help("Set launch.command or pass the command after '--'")
    )]
    NoLaunchCommand,

    #[error("Failed to start '{command}': {reason}")]
    #[diagnostic(code(audioclip::launch::spawn_failed))]
    SpawnFailed { command: String, reason: String },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(audioclip::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(audioclip::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(audioclip::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(audioclip::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        RunnerError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for RunnerError {
    fn from(err: serde_yaml::Error) -> Self {
        RunnerError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RunnerError {
    fn from(err: serde_json::Error) -> Self {
        RunnerError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, RunnerError>;
