//! Error types for Trawl.
//!
//! Uses `thiserror` for ergonomic error definitions. Only structural problems
//! with a scan request are errors; a port that does not answer is a normal
//! negative result and never shows up here.

use crate::types::{PortError, ScanIdError, TargetError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a scan before (or instead of) producing a report.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid ports: {0}")]
    InvalidPorts(#[from] PortError),

    #[error("invalid target: {0}")]
    InvalidTarget(#[from] TargetError),

    #[error("port {0} is out of range (0-65535)")]
    PortOutOfRange(u32),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("scan cancelled")]
    Cancelled,
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Malformed input handed to a single probe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors from the scan result store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("scan not found: {0}")]
    ScanNotFound(String),

    #[error("ambiguous scan id prefix '{prefix}': {matches} matches")]
    AmbiguousPrefix { prefix: String, matches: usize },

    #[error("failed to save scan: {0}")]
    SaveFailed(String),

    #[error("failed to load scan: {0}")]
    LoadFailed(String),

    #[error("storage directory error: {0}")]
    DirectoryError(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from settings and path handling.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a home directory for configuration")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from scan profile management.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("profile not found: {0}")]
    NotFound(String),

    #[error("profile already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid profile name: {0}")]
    InvalidName(String),

    #[error("invalid profile: {0}")]
    Invalid(String),

    #[error("invalid profile ports: {0}")]
    Ports(#[from] PortError),

    #[error("failed to save profile: {0}")]
    SaveFailed(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Umbrella error for command handlers.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    ScanId(#[from] ScanIdError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for command handlers.
pub type CliResult<T> = Result<T, CliError>;
