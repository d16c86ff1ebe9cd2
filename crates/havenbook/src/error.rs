//! Error types for havenbook.
//!
//! This module defines all error types used throughout the havenbook crate,
//! covering the duress-gate preconditions as well as storage and
//! configuration failures.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for havenbook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Access-Mode Errors ===
    /// Attempted to enable duress mode without a stored PIN.
    #[error("a security PIN must be set before duress mode can be enabled")]
    PinRequired,

    /// A PIN did not match the required six-decimal-digit format.
    #[error("PIN must be exactly six decimal digits")]
    InvalidPin,

    /// An import batch exceeded the configured size limit.
    #[error("import batch exceeds the configured limit of {limit} contacts")]
    BatchTooLarge {
        /// The configured maximum batch size.
        limit: usize,
    },

    // === Capability Errors ===
    /// A share token is missing, foreign, or expired. The three cases are
    /// deliberately indistinguishable so callers cannot probe for existence.
    #[error("link not found or expired")]
    NotFoundOrExpired,

    /// A mutation targeted a resource owned by a different account.
    #[error("resource is not owned by the calling account")]
    NotOwner,

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
    /// File system operation failed.
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
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for havenbook operations.
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

    /// Check if this error is the uniform not-found/expired outcome.
    #[must_use]
    pub fn is_not_found_or_expired(&self) -> bool {
        matches!(self, Self::NotFoundOrExpired)
    }

    /// Check if this error is the missing-PIN precondition.
    #[must_use]
    pub fn is_pin_required(&self) -> bool {
        matches!(self, Self::PinRequired)
    }

    /// Check if this error is an ownership violation.
    #[must_use]
    pub fn is_not_owner(&self) -> bool {
        matches!(self, Self::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PinRequired;
        assert!(err.to_string().contains("PIN"));

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_error_is_pin_required() {
        assert!(Error::PinRequired.is_pin_required());
        assert!(!Error::InvalidPin.is_pin_required());
    }

    #[test]
    fn test_error_is_not_found_or_expired() {
        assert!(Error::NotFoundOrExpired.is_not_found_or_expired());
        assert!(!Error::NotOwner.is_not_found_or_expired());
    }

    #[test]
    fn test_error_is_not_owner() {
        assert!(Error::NotOwner.is_not_owner());
        assert!(!Error::NotFoundOrExpired.is_not_owner());
    }

    #[test]
    fn test_not_found_and_expired_share_one_message() {
        // Missing and expired tokens must be indistinguishable; there is a
        // single variant with a single message by construction.
        let err = Error::NotFoundOrExpired;
        assert_eq!(err.to_string(), "link not found or expired");
    }

    #[test]
    fn test_invalid_pin_display() {
        let err = Error::InvalidPin;
        assert!(err.to_string().contains("six decimal digits"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "token_length too small".to_string(),
        };
        assert!(err.to_string().contains("token_length"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
