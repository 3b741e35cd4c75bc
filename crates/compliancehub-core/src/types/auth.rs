//! Authentication, registration and profile payloads.
//!
//! Anything carrying a password or token implements `Debug` by hand so the
//! secret never reaches a log line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{CompanyId, UserId};
use crate::roles::Role;

const REDACTED: &str = "[REDACTED]";

/// Body of `POST auth/token/`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &REDACTED)
            .finish()
    }
}

/// A company the user belongs to, as listed in the login response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyAccess {
    pub id: CompanyId,
    pub name: String,
    pub role: Role,
}

/// Response of `POST auth/token/`.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,

    /// Companies the user is an active member of
    #[serde(default)]
    pub companies: Vec<CompanyAccess>,

    /// Present when the user belongs to exactly one company
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &REDACTED)
            .field("refresh", &REDACTED)
            .field("companies", &self.companies)
            .field("company_id", &self.company_id)
            .finish()
    }
}

/// Response of `POST auth/token/refresh/`.
///
/// The server rotates refresh tokens, so a new one is usually included.
#[derive(Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl fmt::Debug for RefreshResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshResponse")
            .field("access", &REDACTED)
            .field("refresh", &self.refresh.as_ref().map(|_| REDACTED))
            .finish()
    }
}

/// Body of `POST auth/register/`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("password_confirm", &REDACTED)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// Response of `POST auth/register/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    pub user: User,
}

/// A user account as returned by `auth/me/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl User {
    /// "First Last", or the email when both names are blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

/// Body of `PATCH auth/me/`. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }
}

/// Body of `POST auth/change-password/`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

impl fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangePasswordRequest { [REDACTED] }")
    }
}

/// Body of `POST auth/password-reset/confirm/`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

impl fmt::Debug for PasswordResetConfirm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordResetConfirm { [REDACTED] }")
    }
}

/// Response of `POST auth/password-reset/`.
///
/// In development deployments without mail delivery the server returns the
/// reset link directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequested {
    pub message: String,
    #[serde(default)]
    pub reset_link: Option<String>,
    #[serde(default)]
    pub expires_in_minutes: Option<u32>,
}

/// Response of `GET auth/password-reset/validate/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetTokenStatus {
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Generic `{"message": "..."}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_pair_with_single_company() {
        let body = serde_json::json!({
            "access": "aaa.bbb.ccc",
            "refresh": "ddd.eee.fff",
            "companies": [{"id": "c-1", "name": "Acme", "role": "owner"}],
            "company_id": "c-1"
        });
        let pair: TokenPair = serde_json::from_value(body).unwrap();
        assert_eq!(pair.companies.len(), 1);
        assert_eq!(pair.companies[0].role, Role::Owner);
        assert_eq!(pair.company_id, Some(CompanyId::from("c-1")));
    }

    #[test]
    fn test_secrets_not_in_debug() {
        let pair = TokenPair {
            access: "secret-access".into(),
            refresh: "secret-refresh".into(),
            companies: vec![],
            company_id: None,
        };
        let debug = format!("{:?}", pair);
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));

        let login = LoginRequest::new("a@b.co", "hunter22");
        assert!(!format!("{:?}", login).contains("hunter22"));
    }

    #[test]
    fn test_profile_update_sends_only_set_fields() {
        let update = ProfileUpdate {
            first_name: Some("Ada".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"first_name": "Ada"})
        );
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "u-1", "email": "ops@acme.io", "first_name": "", "last_name": ""
        }))
        .unwrap();
        assert_eq!(user.display_name(), "ops@acme.io");
        assert!(user.is_active);
    }
}
