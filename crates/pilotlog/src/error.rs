//! Error types for pilotlog.
//!
//! This module defines all error types used throughout the pilotlog crate,
//! from the two domain failures of the flight lifecycle down to storage,
//! configuration and report encoding problems.

use std::path::PathBuf;
use thiserror::Error;

use crate::flight::FlightStatus;

/// The main error type for pilotlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Domain Errors ===
    /// No flight exists with the requested identifier.
    #[error("flight {id} not found")]
    FlightNotFound {
        /// The identifier that was looked up.
        id: i64,
    },

    /// The requested transition is not legal from the flight's current status.
    #[error("flight {id} has status {status}; only open flights can be {action}")]
    InvalidFlightStatus {
        /// The flight that rejected the transition.
        id: i64,
        /// The status the flight is currently in.
        status: FlightStatus,
        /// The transition that was attempted, e.g. "completed".
        action: &'static str,
    },

    /// A request carried a malformed or out-of-range parameter.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system or socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML serialization failed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::SeError),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for pilotlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Check if this error reports a missing flight.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FlightNotFound { .. })
    }

    /// Check if this error reports an illegal lifecycle transition.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidFlightStatus { .. })
    }

    /// Check if this error was caused by the caller rather than the service.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::FlightNotFound { .. } | Self::InvalidFlightStatus { .. } | Self::InvalidRequest(_)
        )
    }
}
