//! Token handling.
//!
//! Access and refresh tokens are bearer credentials: anyone holding them can
//! act as the user. They are wrapped in [`SecretString`] as soon as they
//! arrive, so they cannot show up in `Debug`/`Display` output or log lines,
//! and they are zeroed on drop. The raw value is only exposed where it is
//! put on the wire (the `Authorization` header and the refresh body) or
//! persisted by a [`SessionStore`](super::SessionStore).

use compliancehub_core::{RefreshResponse, TokenPair};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// Where the current tokens came from.
///
/// Useful when debugging auth problems without exposing the tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `POST auth/token/`
    Login,
    /// `POST auth/token/refresh/`
    Refresh,
    /// Read back from a session file
    File,
    /// Handed to the client directly
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Login => write!(f, "login"),
            CredentialSource::Refresh => write!(f, "refresh"),
            CredentialSource::File => write!(f, "file"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// An access/refresh token pair.
pub struct SessionTokens {
    access: SecretString,
    refresh: Option<SecretString>,
    source: CredentialSource,
}

impl SessionTokens {
    pub fn new(
        access: impl Into<String>,
        refresh: Option<String>,
        source: CredentialSource,
    ) -> Self {
        Self {
            access: SecretString::from(access.into()),
            refresh: refresh.map(SecretString::from),
            source,
        }
    }

    /// Tokens from a login response.
    pub fn from_login(pair: &TokenPair) -> Self {
        Self::new(
            pair.access.clone(),
            Some(pair.refresh.clone()),
            CredentialSource::Login,
        )
    }

    /// Expose the access token for the `Authorization` header.
    ///
    /// Only call this at the point of use; never store the exposed value.
    pub fn access(&self) -> &str {
        self.access.expose_secret()
    }

    /// Expose the refresh token, if one is held.
    pub fn refresh(&self) -> Option<&str> {
        self.refresh.as_ref().map(|s| s.expose_secret())
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// Whether `other` carries the same access token.
    pub fn same_access(&self, other: &SessionTokens) -> bool {
        self.access() == other.access()
    }

    /// Apply a refresh response. The refresh token is replaced when the
    /// server rotated it and kept otherwise.
    pub fn refreshed(&self, response: &RefreshResponse) -> Self {
        let refresh = match &response.refresh {
            Some(rotated) => Some(SecretString::from(rotated.clone())),
            None => self.refresh.as_ref().map(clone_secret),
        };
        Self {
            access: SecretString::from(response.access.clone()),
            refresh,
            source: CredentialSource::Refresh,
        }
    }
}

fn clone_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}

impl Clone for SessionTokens {
    fn clone(&self) -> Self {
        Self {
            access: clone_secret(&self.access),
            refresh: self.refresh.as_ref().map(clone_secret),
            source: self.source,
        }
    }
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access", &REDACTED)
            .field("refresh", &self.refresh.as_ref().map(|_| REDACTED))
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (source: {})", REDACTED, self.source)
    }
}
