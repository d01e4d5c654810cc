//! Domain error types
//!
//! This module defines the error hierarchy for idsnap.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main idsnap error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum IdsnapError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Identity platform errors (inventory listing, export jobs, rules)
    #[error("Identity platform error: {0}")]
    Identity(#[from] IdentityError),

    /// Version-control host errors
    #[error("Version-control host error: {0}")]
    Vcs(#[from] VcsError),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Identity platform errors
///
/// Errors that occur when talking to the identity-governance platform.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Failed to reach the platform
    #[error("Failed to connect to identity platform: {0}")]
    ConnectionFailed(String),

    /// Token rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Response body could not be understood
    #[error("Invalid response from identity platform: {0}")]
    InvalidResponse(String),

    /// Any other non-success status
    #[error("Request failed: {status} - {message}")]
    RequestFailed { status: u16, message: String },
}

/// Version-control host errors
#[derive(Debug, Error)]
pub enum VcsError {
    /// Failed to reach the host
    #[error("Failed to connect to version-control host: {0}")]
    ConnectionFailed(String),

    /// Token rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Response body could not be understood
    #[error("Invalid response from version-control host: {0}")]
    InvalidResponse(String),

    /// Any other non-success status
    #[error("Request failed: {status} - {message}")]
    RequestFailed { status: u16, message: String },

    /// The non-forcing ref update was refused because the branch moved
    #[error("Update of branch '{branch}' rejected ({status}): {message}")]
    RefUpdateRejected {
        branch: String,
        status: u16,
        message: String,
    },
}

impl VcsError {
    /// Whether the host refused a non-fast-forward ref update
    pub fn is_rejection(&self) -> bool {
        matches!(self, VcsError::RefUpdateRejected { .. })
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for IdsnapError {
    fn from(err: std::io::Error) -> Self {
        IdsnapError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for IdsnapError {
    fn from(err: serde_json::Error) -> Self {
        IdsnapError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for IdsnapError {
    fn from(err: toml::de::Error) -> Self {
        IdsnapError::Configuration(format!("TOML parse error: {err}"))
    }
}
