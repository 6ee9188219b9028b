//! Domain-specific error types for veridex

use thiserror::Error;

/// Main error type for the veridex engine
#[derive(Error, Debug)]
pub enum VeridexError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Intake error: {message}")]
    Intake { message: String },

    #[error("Provider error: {message}")]
    Provider { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<anyhow::Error> for VeridexError {
    fn from(err: anyhow::Error) -> Self {
        VeridexError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for VeridexError {
    fn from(err: rusqlite::Error) -> Self {
        VeridexError::Store {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for VeridexError {
    fn from(err: serde_json::Error) -> Self {
        VeridexError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for VeridexError {
    fn from(err: reqwest::Error) -> Self {
        VeridexError::Provider {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

impl From<std::io::Error> for VeridexError {
    fn from(err: std::io::Error) -> Self {
        VeridexError::Intake {
            message: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for VeridexError {
    fn from(err: chrono::ParseError) -> Self {
        VeridexError::Validation {
            message: format!("Date parsing error: {}", err),
        }
    }
}

/// Result type alias for veridex operations
pub type Result<T> = std::result::Result<T, VeridexError>;
