//! Unified error type for the service.
//!
//! Core functions return [`Result`]; the api layer decides how each variant is
//! rendered as an HTTP response.

use crate::core::validation::FieldErrors;
use thiserror::Error;

/// Every failure the service can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// One or more payload fields were missing or invalid
    #[error("Validation failed: {errors}")]
    Validation {
        /// Messages keyed by field name
        errors: FieldErrors,
    },

    /// No record with this id is visible to the caller
    #[error("{resource} {id} not found")]
    NotFound {
        /// Resource kind, e.g. `"receipt"`
        resource: &'static str,
        /// Requested id
        id: i64,
    },

    /// Missing, unknown or rejected credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Reason shown to the client
        message: String,
    },

    /// Authenticated, but not allowed to touch this record
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Reason shown to the client
        message: String,
    },

    /// The record would clash with an existing one
    #[error("Conflict: {message}")]
    Conflict {
        /// Reason shown to the client
        message: String,
    },

    /// The identity provider could not be reached or answered garbage
    #[error("Identity provider error: {0}")]
    IdentityProvider(#[from] reqwest::Error),

    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable problem
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for a not-found error on `resource`.
    #[must_use]
    pub const fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound { resource, id }
    }

    /// Builds a validation error carrying a single field message.
    #[must_use]
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation { errors }
    }

    /// Shorthand for an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }
}

impl From<FieldErrors> for Error {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation { errors }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
