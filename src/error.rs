//! Error types for Corkboard
//!
//! Provides a unified error type for all operations.
//!
//! Two classes of variant live here: recoverable, client-caused errors
//! (`Validation`, `NotFound`) that the HTTP layer maps to 4xx responses,
//! and fatal, process-level errors (`Io`, `Corruption`, `Serialization`,
//! `Storage`) that surface as a generic 500.

use std::fmt;

use thiserror::Error;

/// Result type alias using CorkboardError
pub type Result<T> = std::result::Result<T, CorkboardError>;

/// A single failed field constraint from input validation
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    /// Name of the offending input field
    pub field: String,
    /// Human-readable description of the constraint that failed
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Unified error type for Corkboard operations
#[derive(Debug, Error)]
pub enum CorkboardError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("data file corruption detected: {0}")]
    Corruption(String),

    #[error("storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Service Errors
    // -------------------------------------------------------------------------
    #[error("validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("message not found: {id}")]
    NotFound { id: String },
}

impl CorkboardError {
    /// Shorthand for a single-field validation error
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CorkboardError::Validation(vec![FieldError::new(field, message)])
    }

    /// Whether this error is caused by client input (4xx) rather than a
    /// process-level fault (5xx)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CorkboardError::Validation(_) | CorkboardError::NotFound { .. }
        )
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<bincode::Error> for CorkboardError {
    fn from(err: bincode::Error) -> Self {
        CorkboardError::Serialization(err.to_string())
    }
}
