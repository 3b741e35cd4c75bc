//! HTTP transport.
//!
//! Every API call goes through [`Transport::execute`], which attaches the
//! bearer token and tenant header and handles expired access tokens:
//!
//! 1. no stored session: fail with [`ClientError::NotAuthenticated`], no request made
//! 2. a 401 triggers one refresh (`POST auth/token/refresh/`), then the
//!    request is replayed once with the new token
//! 3. refreshes are single-flight: concurrent 401s wait on one refresh, and
//!    a waiter whose token was already replaced skips its own refresh call
//! 4. a failed refresh clears the session, fires the session-expired hook
//!    and returns [`ClientError::SessionExpired`]
//!
//! There is no other retry.

use compliancehub_core::{error_message, CompanyId, DownloadedFile, ListQuery, Page, RefreshResponse};
use lazy_static::lazy_static;
use parking_lot::RwLock;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, ResponseCache};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::session::{Session, SessionStore};

/// Tenant header checked by the server against the user's memberships.
pub const COMPANY_HEADER: &str = "X-Company-ID";

/// Page limit for [`Transport::collect_pages`] callers that have no better bound.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

pub(crate) const REFRESH_PATH: &str = "auth/token/refresh/";

lazy_static! {
    static ref FILENAME_EXT: Regex =
        Regex::new(r#"(?i)filename\*\s*=\s*(?:UTF-8'[^']*')?"?([^";]+)"?"#).unwrap();
    static ref FILENAME_QUOTED: Regex = Regex::new(r#"(?i)filename\s*=\s*"([^"]*)""#).unwrap();
    static ref FILENAME_BARE: Regex = Regex::new(r#"(?i)filename\s*=\s*([^";\s]+)"#).unwrap();
}

/// Called after a failed refresh has cleared the session.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// Whether a request carries the session's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Bearer,
    /// Login, register, refresh, password reset, invitation preview
    Anonymous,
}

/// File part of a multipart request.
#[derive(Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Multipart body kept as plain data so it can be rebuilt for a replay.
#[derive(Clone, Default)]
pub struct MultipartSpec {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

impl MultipartSpec {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields, file: None }
    }

    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.file = Some(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        });
        self
    }

    fn to_form(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        if let Some(file) = &self.file {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)
                .map_err(|e| ClientError::Http(e.to_string()))?;
            form = form.part(file.field.clone(), part);
        }
        Ok(form)
    }
}

#[derive(Clone)]
pub enum Body {
    Empty,
    Json(Value),
    Multipart(MultipartSpec),
}

/// A request, described as data.
#[derive(Clone)]
pub struct RequestSpec {
    pub method: Method,
    /// Path relative to the base URL
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
    pub auth: AuthMode,
    /// Cache prefixes dropped once this request succeeds
    pub invalidates: Vec<&'static str>,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
            auth: AuthMode::Bearer,
            invalidates: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, query: &ListQuery) -> Self {
        self.query = query.pairs();
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::Parse(format!("cannot encode request body: {}", e)))?;
        self.body = Body::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, spec: MultipartSpec) -> Self {
        self.body = Body::Multipart(spec);
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.auth = AuthMode::Anonymous;
        self
    }

    pub fn invalidates(mut self, prefixes: &[&'static str]) -> Self {
        self.invalidates.extend_from_slice(prefixes);
        self
    }
}

// Bodies may hold passwords or tokens; only their kind is shown.
impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match &self.body {
            Body::Empty => "empty",
            Body::Json(_) => "json",
            Body::Multipart(_) => "multipart",
        };
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &body)
            .field("auth", &self.auth)
            .finish()
    }
}

/// Shared HTTP plumbing behind every API module. Cheap to clone.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    store: Arc<dyn SessionStore>,
    /// Company from config or the builder; survives logout
    configured_company: Option<CompanyId>,
    /// Company that overrides the session's selection
    company: RwLock<Option<CompanyId>>,
    cache: ResponseCache,
    refresh_lock: Mutex<()>,
    on_expired: RwLock<Option<SessionExpiredHook>>,
}

impl Transport {
    pub fn new(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ClientError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                timeout: config.timeout,
                store,
                configured_company: config.company_id.clone(),
                company: RwLock::new(config.company_id.clone()),
                cache: ResponseCache::from_config(&config.cache),
                refresh_lock: Mutex::new(()),
                on_expired: RwLock::new(None),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    pub fn set_session_expired_hook(&self, hook: SessionExpiredHook) {
        *self.inner.on_expired.write() = Some(hook);
    }

    pub async fn session(&self) -> Result<Option<Session>> {
        self.inner.store.load().await
    }

    pub async fn save_session(&self, session: &Session) -> Result<()> {
        self.inner.store.save(session).await
    }

    /// Forget the session, any company selected during it and everything
    /// cached under it.
    pub async fn clear_session(&self) -> Result<()> {
        self.reset_company();
        self.inner.cache.invalidate_all();
        self.inner.store.clear().await
    }

    /// Back to the configured company, if any.
    fn reset_company(&self) {
        *self.inner.company.write() = self.inner.configured_company.clone();
    }

    /// The company requests are currently sent for.
    pub async fn company(&self) -> Result<Option<CompanyId>> {
        if let Some(company) = self.inner.company.read().clone() {
            return Ok(Some(company));
        }
        Ok(self.session().await?.and_then(|s| s.company_id))
    }

    /// Send later requests for `company`, remembering the choice in the
    /// session when there is one. Cached responses are dropped.
    pub async fn select_company(&self, company: CompanyId) -> Result<()> {
        *self.inner.company.write() = Some(company.clone());
        if let Some(mut session) = self.session().await? {
            session.company_id = Some(company.clone());
            self.save_session(&session).await?;
        }
        self.inner.cache.invalidate_all();
        info!(company = %company, "Company selected");
        Ok(())
    }

    fn company_for(&self, session: &Session) -> Option<CompanyId> {
        self.inner
            .company
            .read()
            .clone()
            .or_else(|| session.company_id.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and return the successful response.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<Response> {
        if spec.auth == AuthMode::Anonymous {
            let response = self.send_once(spec, None, None).await?;
            return check_status(response).await;
        }

        let session = self
            .inner
            .store
            .load()
            .await?
            .ok_or(ClientError::NotAuthenticated)?;
        let company = self.company_for(&session);
        let response = self
            .send_once(spec, Some(session.tokens.access()), company.as_ref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        debug!(method = %spec.method, path = %spec.path, "Access token rejected, refreshing");
        let session = self.refresh_after(&session).await?;
        let company = self.company_for(&session);
        let response = self
            .send_once(spec, Some(session.tokens.access()), company.as_ref())
            .await?;
        // A second 401 is final
        check_status(response).await
    }

    /// Refresh the access token now.
    pub async fn refresh(&self) -> Result<Session> {
        let _guard = self.inner.refresh_lock.lock().await;
        let session = self
            .inner
            .store
            .load()
            .await?
            .ok_or(ClientError::NotAuthenticated)?;
        self.refresh_locked(session).await
    }

    /// Refresh after `stale`'s access token was rejected, unless another
    /// request already did.
    async fn refresh_after(&self, stale: &Session) -> Result<Session> {
        let _guard = self.inner.refresh_lock.lock().await;
        match self.inner.store.load().await? {
            Some(current) if !current.tokens.same_access(&stale.tokens) => {
                debug!("Access token already refreshed");
                Ok(current)
            }
            Some(current) => self.refresh_locked(current).await,
            // Cleared by a failed refresh while we waited
            None => Err(ClientError::SessionExpired),
        }
    }

    async fn refresh_locked(&self, session: Session) -> Result<Session> {
        let Some(refresh) = session.tokens.refresh() else {
            warn!("No refresh token held, session expired");
            self.expire().await;
            return Err(ClientError::SessionExpired);
        };

        let spec = RequestSpec::post(REFRESH_PATH)
            .json(&serde_json::json!({ "refresh": refresh }))?
            .anonymous();
        let outcome = match self.send_once(&spec, None, None).await {
            Ok(response) => match check_status(response).await {
                Ok(response) => parse_json::<RefreshResponse>(response, REFRESH_PATH).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(refreshed) => {
                let updated = Session {
                    tokens: session.tokens.refreshed(&refreshed),
                    ..session
                };
                self.inner.store.save(&updated).await?;
                info!(rotated = refreshed.refresh.is_some(), "Access token refreshed");
                Ok(updated)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed, session expired");
                self.expire().await;
                Err(ClientError::SessionExpired)
            }
        }
    }

    async fn expire(&self) {
        if let Err(e) = self.inner.store.clear().await {
            warn!(error = %e, "Failed to clear expired session");
        }
        self.reset_company();
        self.inner.cache.invalidate_all();
        let hook = self.inner.on_expired.read().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    async fn send_once(
        &self,
        spec: &RequestSpec,
        token: Option<&str>,
        company: Option<&CompanyId>,
    ) -> Result<Response> {
        let mut request = self.inner.http.request(spec.method.clone(), self.url(&spec.path));
        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(company) = company {
            request = request.header(COMPANY_HEADER, company.as_str());
        }
        request = match &spec.body {
            Body::Empty => request,
            Body::Json(value) => request.json(value),
            Body::Multipart(multipart) => request.multipart(multipart.to_form()?),
        };

        debug!(method = %spec.method, path = %spec.path, "Sending request");
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.inner.timeout)
            } else {
                ClientError::Http(e.to_string())
            }
        })?;
        debug!(
            method = %spec.method,
            path = %spec.path,
            status = response.status().as_u16(),
            "Response received"
        );
        Ok(response)
    }

    /// Execute `spec` and decode the JSON response. Successful mutations
    /// drop the cache prefixes the spec declares.
    pub async fn send<T: DeserializeOwned>(&self, spec: RequestSpec) -> Result<T> {
        let response = self.execute(&spec).await?;
        self.after_success(&spec).await;
        parse_json(response, &spec.path).await
    }

    /// Execute `spec`, ignoring any response body.
    pub async fn send_no_content(&self, spec: RequestSpec) -> Result<()> {
        self.execute(&spec).await?;
        self.after_success(&spec).await;
        Ok(())
    }

    async fn after_success(&self, spec: &RequestSpec) {
        if spec.method != Method::GET {
            self.inner.cache.invalidate_prefixes(&spec.invalidates).await;
        }
    }

    /// Cached GET.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &ListQuery) -> Result<T> {
        self.get_with(path, query, true).await
    }

    /// GET that skips the cache lookup. The fresh response replaces any
    /// cached one.
    pub async fn get_fresh<T: DeserializeOwned>(&self, path: &str, query: &ListQuery) -> Result<T> {
        self.get_with(path, query, false).await
    }

    async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &ListQuery,
        use_cache: bool,
    ) -> Result<T> {
        let scope = self.company().await?;
        let key = CacheKey::new(scope.as_ref().map(CompanyId::as_str), path, &query.render());

        if use_cache {
            if let Some(hit) = self.inner.cache.get(&key).await {
                debug!(path, "Cache hit");
                return decode(&hit, path);
            }
        }

        // A mutation finishing while this GET is in flight makes its body stale
        let generation = self.inner.cache.generation();
        let value: Value = self.send(RequestSpec::get(path).query(query)).await?;
        let value = Arc::new(value);
        if !self
            .inner
            .cache
            .insert_if_unchanged(key, value.clone(), generation)
            .await
        {
            debug!(path, "Response not cached, invalidated while in flight");
        }
        decode(&value, path)
    }

    /// Follow page numbers from `query`'s page until the server reports no
    /// next page, reading at most `max_pages` pages.
    pub async fn collect_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &ListQuery,
        max_pages: u32,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = query.current_page();
        for _ in 0..max_pages.max(1) {
            let current: Page<T> = self.get(path, &query.clone().page(page)).await?;
            let more = current.has_next();
            items.extend(current.results);
            if !more {
                return Ok(items);
            }
            page += 1;
        }
        warn!(path, max_pages, "Stopped following pages at the page limit");
        Ok(items)
    }

    /// Execute `spec` and return the raw body with its file name.
    pub async fn download(&self, spec: RequestSpec) -> Result<DownloadedFile> {
        let response = self.execute(&spec).await?;
        let headers = response.headers();
        let filename = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename);
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?
            .to_vec();
        Ok(DownloadedFile {
            filename,
            content_type,
            bytes,
        })
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.inner.base_url)
            .field("timeout", &self.inner.timeout)
            .field("cache", &self.inner.cache)
            .finish()
    }
}

/// Map a non-2xx response to an error carrying the server's message.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    let body: Option<Value> = response
        .bytes()
        .await
        .ok()
        .and_then(|b| serde_json::from_slice(&b).ok());
    let message = error_message::describe(code, body.as_ref());
    debug!(status = code, %message, "Request failed");

    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        _ => ClientError::Api {
            status: code,
            message,
        },
    })
}

async fn parse_json<T: DeserializeOwned>(response: Response, path: &str) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ClientError::Http(e.to_string()))?;
    // 204 and empty 200s decode as null
    let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
    serde_json::from_slice(bytes).map_err(|e| ClientError::Parse(format!("{}: {}", path, e)))
}

fn decode<T: DeserializeOwned>(value: &Value, path: &str) -> Result<T> {
    T::deserialize(value).map_err(|e| ClientError::Parse(format!("{}: {}", path, e)))
}

/// File name from a `Content-Disposition` header. `filename*` wins over
/// `filename`.
pub fn disposition_filename(value: &str) -> Option<String> {
    if let Some(caps) = FILENAME_EXT.captures(value) {
        return Some(percent_decode(caps[1].trim()));
    }
    FILENAME_QUOTED
        .captures(value)
        .or_else(|| FILENAME_BARE.captures(value))
        .map(|caps| caps[1].to_string())
        .filter(|name| !name.is_empty())
}

fn percent_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(byte) = hex {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_quoted() {
        assert_eq!(
            disposition_filename(r#"attachment; filename="Q1 access review.pdf""#).as_deref(),
            Some("Q1 access review.pdf")
        );
    }

    #[test]
    fn test_disposition_bare() {
        assert_eq!(
            disposition_filename("attachment; filename=report.xlsx").as_deref(),
            Some("report.xlsx")
        );
    }

    #[test]
    fn test_disposition_extended_wins() {
        let header = r#"attachment; filename="fallback.pdf"; filename*=UTF-8''Pr%C3%BCfbericht%202024.pdf"#;
        assert_eq!(
            disposition_filename(header).as_deref(),
            Some("Prüfbericht 2024.pdf")
        );
    }

    #[test]
    fn test_disposition_without_name() {
        assert_eq!(disposition_filename("inline"), None);
        assert_eq!(disposition_filename(r#"attachment; filename="""#), None);
    }

    #[test]
    fn test_percent_decode_leaves_stray_percent() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("a%2"), "a%2");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn test_request_spec_debug_hides_body() {
        let spec = RequestSpec::post("auth/token/")
            .json(&serde_json::json!({"email": "a@b.io", "password": "hunter2"}))
            .unwrap()
            .anonymous();
        let debug = format!("{:?}", spec);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("auth/token/"));
    }

    #[test]
    fn test_request_spec_builders() {
        let spec = RequestSpec::delete("evidence/evidence/e1/")
            .param("force", true)
            .invalidates(&["evidence/", "controls/"]);
        assert_eq!(spec.method, Method::DELETE);
        assert_eq!(spec.query, vec![("force".to_string(), "true".to_string())]);
        assert_eq!(spec.invalidates, vec!["evidence/", "controls/"]);
        assert_eq!(spec.auth, AuthMode::Bearer);
    }
}
