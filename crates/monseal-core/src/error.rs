//! Core error types for monseal-core.
//!
//! This module defines the error hierarchy using thiserror. Expected
//! branches (zero new contributions, a missing catalog entry on advance)
//! are modeled as ordinary control flow elsewhere, never as errors.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for monseal-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Document store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Contribution source errors
    #[error("Contribution source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog roster errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Reconciliation errors
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Document-store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store is temporarily unable to serve requests
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Store migration failed: {0}")]
    MigrationFailed(String),
}

impl StoreError {
    /// Whether this error means "record missing" rather than "store broken".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound("row".to_string()),
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseBusy
                    || code.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StoreError::Unavailable(err.to_string())
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Contribution-source-specific errors.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source rejected the supplied credential
    #[error("Contribution source rejected the credential")]
    Auth,

    /// The source throttled the request
    #[error("Contribution source rate limit exceeded")]
    RateLimited,

    /// The source is unreachable or returned a server-side failure
    #[error("Contribution source unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The source answered with a body the client cannot interpret
    #[error("Malformed contribution source response: {0}")]
    MalformedResponse(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Catalog roster errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A roster must contain at least one monster
    #[error("Catalog roster is empty")]
    Empty,

    /// Roster file could not be read
    #[error("Failed to read roster from {path}: {message}")]
    ReadFailed { path: PathBuf, message: String },

    /// Roster file could not be parsed
    #[error("Failed to parse roster: {0}")]
    ParseFailed(String),
}

/// Errors surfaced by the reconciliation boundary operation.
///
/// Any store failure that is not a missing record is reported as
/// `StoreWrite` -- by the time the store misbehaves mid-reconciliation
/// the distinction between read and write no longer helps the caller.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The user or their current-monster record is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persisting the reconciliation result failed
    #[error("Reconciliation store write failed: {0}")]
    StoreWrite(#[source] StoreError),
}

impl From<StoreError> for ReconcileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ReconcileError::NotFound(what),
            other => ReconcileError::StoreWrite(other),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
