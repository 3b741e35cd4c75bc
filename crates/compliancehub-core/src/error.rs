//! Validation errors raised before a request leaves the client.

use thiserror::Error;

/// Errors produced by the pure helpers in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("File size exceeds {limit_mb}MB limit")]
    FileTooLarge { size: u64, limit_mb: u64 },

    #[error("File type .{extension} is not allowed")]
    FileTypeNotAllowed { extension: String },

    #[error("Passwords do not match.")]
    PasswordMismatch,
}

impl CoreError {
    /// Shorthand for an `InvalidInput` error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
