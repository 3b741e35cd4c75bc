//! Client-side input checks.
//!
//! These mirror the server's serializer rules closely enough to fail fast
//! on obvious mistakes. Passing them does not guarantee the server accepts
//! the request (uniqueness and password-strength rules live server-side).

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::CoreError;
use crate::types::auth::{ChangePasswordRequest, PasswordResetConfirm, RegisterRequest};

lazy_static! {
    /// `local@domain.tld`, simplified
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
}

/// Fail with `InvalidInput` when `value` is blank. Returns the trimmed value.
pub fn require_non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CoreError::invalid(field, "This field may not be blank."))
    } else {
        Ok(trimmed)
    }
}

pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let email = require_non_blank("email", email)?;
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(CoreError::invalid("email", "Enter a valid email address."))
    }
}

pub fn validate_registration(req: &RegisterRequest) -> Result<(), CoreError> {
    validate_email(&req.email)?;
    require_non_blank("username", &req.username)?;
    require_non_blank("first_name", &req.first_name)?;
    require_non_blank("last_name", &req.last_name)?;
    require_non_blank("password", &req.password)?;
    if req.password != req.password_confirm {
        return Err(CoreError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_password_change(req: &ChangePasswordRequest) -> Result<(), CoreError> {
    if req.old_password.is_empty() || req.new_password.is_empty() || req.new_password_confirm.is_empty()
    {
        return Err(CoreError::invalid(
            "password",
            "All password fields are required.",
        ));
    }
    if req.new_password != req.new_password_confirm {
        return Err(CoreError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_password_reset(req: &PasswordResetConfirm) -> Result<(), CoreError> {
    require_non_blank("token", &req.token)?;
    if req.new_password.is_empty() || req.new_password_confirm.is_empty() {
        return Err(CoreError::invalid(
            "password",
            "Both password fields are required.",
        ));
    }
    if req.new_password != req.new_password_confirm {
        return Err(CoreError::PasswordMismatch);
    }
    Ok(())
}

/// Company names must be non-blank; returns the trimmed name.
pub fn validate_company_name(name: &str) -> Result<String, CoreError> {
    require_non_blank("name", name)
        .map(str::to_string)
        .map_err(|_| CoreError::invalid("name", "Company name is required"))
}
