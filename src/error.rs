//! Crate-level error type
//!
//! Field failures pass through unchanged; the remaining variants cover the
//! registry shell around the field subsystem.

use thiserror::Error;

use crate::field::FieldError;

/// Result type for registry and configuration operations
pub type SisResult<T> = Result<T, SisError>;

/// Errors surfaced by `sisdb`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SisError {
    /// Field resolution or coercion failed
    #[error(transparent)]
    Field(#[from] FieldError),

    /// A raw schema descriptor is not a named mapping
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// No schema with this name is registered
    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    /// The remote service rejected or failed a request
    #[error("Client error: {0}")]
    Client(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SisError {
    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        Self::InvalidSchema(msg.into())
    }

    pub fn client(msg: impl Into<String>) -> Self {
        Self::Client(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Field(err) => err.code(),
            Self::InvalidSchema(_) => "SIS_INVALID_SCHEMA",
            Self::UnknownSchema(_) => "SIS_UNKNOWN_SCHEMA",
            Self::Client(_) => "SIS_CLIENT_ERROR",
            Self::Config(_) => "SIS_CONFIG_ERROR",
        }
    }
}
