//! Login, registration, logout and token refresh.

use compliancehub_core::validation;
use compliancehub_core::{CoreError, LoginRequest, RegisterRequest, RegisterResponse, TokenPair};
use tracing::{info, warn};

use crate::error::{ClientError, Result};
use crate::session::Session;
use crate::transport::{RequestSpec, Transport};

const TOKEN: &str = "auth/token/";
const REGISTER: &str = "auth/register/";
const LOGOUT: &str = "auth/logout/";

pub struct AuthApi<'a> {
    transport: &'a Transport,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    /// Exchange credentials for tokens and store the new session.
    ///
    /// A user with exactly one company gets it selected.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = validation::require_non_blank("email", email)?;
        if password.is_empty() {
            return Err(CoreError::invalid("password", "This field may not be blank.").into());
        }

        let spec = RequestSpec::post(TOKEN)
            .json(&LoginRequest::new(email, password))?
            .anonymous();
        let pair: TokenPair = self.transport.send(spec).await?;

        let session = Session::from_login(email, &pair);
        self.transport.clear_session().await?;
        self.transport.save_session(&session).await?;
        info!(
            companies = session.companies.len(),
            company_selected = session.company_id.is_some(),
            "Logged in"
        );
        Ok(session)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse> {
        validation::validate_registration(request)?;
        let spec = RequestSpec::post(REGISTER).json(request)?.anonymous();
        self.transport.send(spec).await
    }

    /// Blacklist the refresh token server-side and forget the session.
    ///
    /// The local session is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<()> {
        let session = self.transport.session().await?;
        let server_result = match session.as_ref().and_then(|s| s.tokens.refresh()) {
            Some(refresh) => {
                let spec = RequestSpec::post(LOGOUT).json(&serde_json::json!({ "refresh": refresh }))?;
                self.transport.send_no_content(spec).await
            }
            None => Ok(()),
        };
        self.transport.clear_session().await?;

        if let Err(err) = &server_result {
            warn!(error = %err, "Server-side logout failed; local session cleared");
        } else {
            info!("Logged out");
        }
        // An already-dead session is still a successful logout
        match server_result {
            Err(ClientError::SessionExpired) | Err(ClientError::NotAuthenticated) => Ok(()),
            other => other,
        }
    }

    /// Refresh the access token without waiting for a 401.
    pub async fn refresh(&self) -> Result<Session> {
        self.transport.refresh().await
    }

    /// The stored session, if logged in.
    pub async fn session(&self) -> Result<Option<Session>> {
        self.transport.session().await
    }
}
