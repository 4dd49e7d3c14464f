//! Error types for dropwalk
//!
//! This module defines the error hierarchy for the coordination core:
//! - Reload transport errors
//! - Scan I/O errors (directory page reads, file materialization)
//! - Configuration errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include the path and reason
//! - A reload failure is recovered locally (reported per job); a scan
//!   failure rejects the whole scan

use thiserror::Error;

/// Top-level error type for the coordination core
#[derive(Error, Debug)]
pub enum CoreError {
    /// Reload transport errors
    #[error("Reload error: {0}")]
    Reload(#[from] ReloadError),

    /// Scan errors
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the remote reload transport
#[derive(Error, Debug, Clone)]
pub enum ReloadError {
    /// The reload call itself failed (network error, rejected promise)
    #[error("Reload request failed: {reason}")]
    RequestFailed { reason: String },
}

/// Errors raised while scanning a drop payload
#[derive(Error, Debug, Clone)]
pub enum ScanError {
    /// A directory page read failed
    #[error("Failed to read directory '{path}': {reason}")]
    ReadDirFailed { path: String, reason: String },

    /// Materializing a file's content failed
    #[error("Failed to materialize file '{path}': {reason}")]
    MaterializeFailed { path: String, reason: String },

    /// The scan dispatch channel closed while work was outstanding
    #[error("Failed to dispatch scan task: queue closed")]
    QueueSendFailed,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid concurrency bound
    #[error("Invalid concurrency {count}: must be between 1 and {max}")]
    InvalidConcurrency { count: usize, max: usize },
}

/// Result type alias for CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Result type alias for ReloadError
pub type ReloadResult<T> = std::result::Result<T, ReloadError>;

/// Result type alias for ScanError
pub type ScanResult<T> = std::result::Result<T, ScanError>;
