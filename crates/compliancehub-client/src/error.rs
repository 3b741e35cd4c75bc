//! Client error type.

use compliancehub_core::CoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by every client call.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No session is stored; the caller has to log in first
    #[error("Not logged in")]
    NotAuthenticated,

    /// The refresh token was rejected or missing; the session was cleared
    #[error("Session expired")]
    SessionExpired,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No company selected")]
    NoCompanySelected,
}

impl ClientError {
    /// Text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::NotAuthenticated => "You are not logged in.".to_string(),
            ClientError::SessionExpired => {
                "Your session has expired. Please log in again.".to_string()
            }
            ClientError::Unauthorized(msg)
            | ClientError::Forbidden(msg)
            | ClientError::NotFound(msg) => msg.clone(),
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Http(_) => "Could not reach the server.".to_string(),
            ClientError::Timeout(after) => format!(
                "The server did not respond within {}.",
                humantime::format_duration(*after)
            ),
            ClientError::Parse(_) => "The server sent an unexpected response.".to_string(),
            ClientError::Config(msg) => format!("Invalid configuration: {msg}"),
            ClientError::Validation(err) => err.to_string(),
            ClientError::Io(err) => err.to_string(),
            ClientError::NoCompanySelected => {
                "Select a company first.".to_string()
            }
        }
    }

    /// HTTP status behind this error, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Forbidden(_) => Some(403),
            ClientError::NotFound(_) => Some(404),
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the user has to log in again to continue.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ClientError::NotAuthenticated | ClientError::SessionExpired
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_passes_server_text_through() {
        let err = ClientError::Api {
            status: 400,
            message: "Reason is required for rejection".into(),
        };
        assert_eq!(err.user_message(), "Reason is required for rejection");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_validation_error_message() {
        let err: ClientError = CoreError::FileTooLarge {
            size: 200 * 1024 * 1024,
            limit_mb: 100,
        }
        .into();
        assert_eq!(err.user_message(), "File size exceeds 100MB limit");
    }

    #[test]
    fn test_requires_login() {
        assert!(ClientError::SessionExpired.requires_login());
        assert!(ClientError::NotAuthenticated.requires_login());
        assert!(!ClientError::Forbidden("no".into()).requires_login());
    }

    #[test]
    fn test_timeout_message_is_human_readable() {
        let err = ClientError::Timeout(Duration::from_secs(30));
        assert_eq!(err.user_message(), "The server did not respond within 30s.");
    }
}
