//! # compliancehub-client
//!
//! Async client for the ComplianceHub REST API.
//!
//! The client keeps the login session in a [`SessionStore`], sends the
//! selected company as the `X-Company-ID` header, refreshes an expired
//! access token once per 401 and caches GET responses until a mutation
//! makes them stale.
//!
//! ## Example
//!
//! ```rust,no_run
//! use compliancehub_client::{ApiClient, FileSessionStore};
//! use compliancehub_core::ListQuery;
//! use std::sync::Arc;
//!
//! # async fn run() -> compliancehub_client::Result<()> {
//! let client = ApiClient::builder()
//!     .base_url("https://grc.example.com/api")
//!     .store(Arc::new(FileSessionStore::new("/tmp/chub-session.json")))
//!     .on_session_expired(|| eprintln!("Session expired, please log in again"))
//!     .build()?;
//!
//! client.auth().login("alice@example.com", "correct horse").await?;
//! let pending = client
//!     .evidence()
//!     .list(&ListQuery::new().filter("verification_status", "pending"))
//!     .await?;
//! println!("{} evidence items awaiting review", pending.count);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;

use compliancehub_core::CompanyId;
use std::sync::Arc;
use std::time::Duration;

pub use api::{
    AuthApi, ComplianceApi, ControlsApi, DepartmentsApi, EvidenceApi, LibraryApi,
    OrganizationsApi, ProfileApi, TeamApi,
};
pub use api::evidence::UploadFile;
pub use cache::ResponseCache;
pub use config::{CacheConfig, ClientConfig};
pub use error::{ClientError, Result};
pub use session::{
    CredentialSource, FileSessionStore, MemorySessionStore, Session, SessionStore, SessionTokens,
};
pub use transport::Transport;

/// Entry point to the API. Cloning is cheap; clones share the session,
/// cache and connection pool.
#[derive(Clone)]
pub struct ApiClient {
    transport: Transport,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// A client with an in-memory session store.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(&self.transport)
    }

    pub fn profile(&self) -> ProfileApi<'_> {
        ProfileApi::new(&self.transport)
    }

    pub fn organizations(&self) -> OrganizationsApi<'_> {
        OrganizationsApi::new(&self.transport)
    }

    pub fn departments(&self) -> DepartmentsApi<'_> {
        DepartmentsApi::new(&self.transport)
    }

    pub fn team(&self) -> TeamApi<'_> {
        TeamApi::new(&self.transport)
    }

    pub fn library(&self) -> LibraryApi<'_> {
        LibraryApi::new(&self.transport)
    }

    pub fn controls(&self) -> ControlsApi<'_> {
        ControlsApi::new(&self.transport)
    }

    pub fn evidence(&self) -> EvidenceApi<'_> {
        EvidenceApi::new(&self.transport)
    }

    pub fn compliance(&self) -> ComplianceApi<'_> {
        ComplianceApi::new(&self.transport)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.transport.base_url())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ApiClient`]. Explicit values win over the config.
pub struct ApiClientBuilder {
    config: ClientConfig,
    base_url: Option<String>,
    company: Option<CompanyId>,
    timeout: Option<Duration>,
    store: Option<Arc<dyn SessionStore>>,
    on_expired: Option<transport::SessionExpiredHook>,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            base_url: None,
            company: None,
            timeout: None,
            store: None,
            on_expired: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn company(mut self, company: CompanyId) -> Self {
        self.company = Some(company);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Where the session lives. Defaults to memory.
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Called after a failed refresh has cleared the session.
    pub fn on_session_expired<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_expired = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let mut config = self.config;
        if let Some(url) = self.base_url {
            config.base_url = url;
        }
        if let Some(company) = self.company {
            config.company_id = Some(company);
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::new()));
        let transport = Transport::new(&config, store)?;
        if let Some(hook) = self.on_expired {
            transport.set_session_expired_hook(hook);
        }
        Ok(ApiClient { transport })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
