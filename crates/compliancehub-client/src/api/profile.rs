//! The current user's profile and password.

use compliancehub_core::validation;
use compliancehub_core::{
    ChangePasswordRequest, CoreError, ListQuery, MessageResponse, PasswordResetConfirm,
    PasswordResetRequested, ProfileUpdate, ResetTokenStatus, User,
};

use crate::error::Result;
use crate::transport::{RequestSpec, Transport};

const ME: &str = "auth/me/";
const CHANGE_PASSWORD: &str = "auth/change-password/";
const RESET: &str = "auth/password-reset/";
const RESET_CONFIRM: &str = "auth/password-reset/confirm/";
const RESET_VALIDATE: &str = "auth/password-reset/validate/";

pub struct ProfileApi<'a> {
    transport: &'a Transport,
}

impl<'a> ProfileApi<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    pub async fn me(&self) -> Result<User> {
        self.transport.get(ME, &ListQuery::new()).await
    }

    pub async fn update(&self, update: &ProfileUpdate) -> Result<User> {
        if update.is_empty() {
            return Err(CoreError::invalid("profile", "Nothing to update.").into());
        }
        if let Some(email) = &update.email {
            validation::validate_email(email)?;
        }
        let spec = RequestSpec::patch(ME).json(update)?.invalidates(&[ME, "memberships/"]);
        self.transport.send(spec).await
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<MessageResponse> {
        validation::validate_password_change(request)?;
        let spec = RequestSpec::post(CHANGE_PASSWORD).json(request)?;
        self.transport.send(spec).await
    }

    /// Ask for a reset link. The server answers the same way whether or not
    /// the address exists.
    pub async fn request_password_reset(&self, email: &str) -> Result<PasswordResetRequested> {
        validation::validate_email(email)?;
        let spec = RequestSpec::post(RESET)
            .json(&serde_json::json!({ "email": email.trim() }))?
            .anonymous();
        self.transport.send(spec).await
    }

    pub async fn confirm_password_reset(
        &self,
        request: &PasswordResetConfirm,
    ) -> Result<MessageResponse> {
        validation::validate_password_reset(request)?;
        let spec = RequestSpec::post(RESET_CONFIRM).json(request)?.anonymous();
        self.transport.send(spec).await
    }

    pub async fn validate_reset_token(&self, token: &str) -> Result<ResetTokenStatus> {
        let token = validation::require_non_blank("token", token)?;
        let spec = RequestSpec::get(RESET_VALIDATE).param("token", token).anonymous();
        self.transport.send(spec).await
    }
}
