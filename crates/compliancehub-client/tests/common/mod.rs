//! In-process fake of the ComplianceHub backend.

#![allow(dead_code)]

use axum::extract::{Multipart, Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use compliancehub_client::{
    ApiClient, CacheConfig, ClientConfig, CredentialSource, MemorySessionStore, Session,
    SessionStore, SessionTokens,
};
use compliancehub_core::CompanyId;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const PASSWORD: &str = "correct horse";

/// Pages served by the department listing
pub const DEPARTMENT_PAGES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// New access and refresh token
    Rotate,
    /// New access token only
    AccessOnly,
    Reject,
}

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

pub struct Backend {
    pub access: Mutex<String>,
    pub refresh: Mutex<String>,
    pub refresh_mode: Mutex<RefreshMode>,
    /// Answer every authenticated request with 401
    pub reject_all: AtomicBool,
    generation: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub evidence_list_calls: AtomicUsize,
    pub authenticated_requests: AtomicUsize,
    pub company_headers: Mutex<Vec<Option<String>>>,
    pub upload_parts: Mutex<Vec<Part>>,
    /// `company_id` returned by login
    pub login_company: Mutex<String>,
    /// Answer logout with 500
    pub fail_logout: AtomicBool,
    pub logout_calls: AtomicUsize,
    /// Evidence rows held; uploads add one
    pub evidence_count: AtomicUsize,
    /// Delay before the evidence list answers, read after the count
    pub evidence_list_delay_ms: AtomicU64,
    pub department_page_calls: AtomicUsize,
}

impl Backend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            access: Mutex::new("access-1".to_string()),
            refresh: Mutex::new("refresh-1".to_string()),
            refresh_mode: Mutex::new(RefreshMode::Rotate),
            reject_all: AtomicBool::new(false),
            generation: AtomicUsize::new(1),
            refresh_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            evidence_list_calls: AtomicUsize::new(0),
            authenticated_requests: AtomicUsize::new(0),
            company_headers: Mutex::new(Vec::new()),
            upload_parts: Mutex::new(Vec::new()),
            login_company: Mutex::new("c-1".to_string()),
            fail_logout: AtomicBool::new(false),
            logout_calls: AtomicUsize::new(0),
            evidence_count: AtomicUsize::new(1),
            evidence_list_delay_ms: AtomicU64::new(0),
            department_page_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.refresh_mode.lock() = mode;
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn last_company_header(&self) -> Option<String> {
        self.company_headers.lock().last().cloned().flatten()
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        self.authenticated_requests.fetch_add(1, Ordering::SeqCst);
        let company = headers
            .get("x-company-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.company_headers.lock().push(company);

        let expected = format!("Bearer {}", self.access.lock());
        let given = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if self.reject_all.load(Ordering::SeqCst) || given != Some(expected.as_str()) {
            return Err(error(
                StatusCode::UNAUTHORIZED,
                json!({
                    "detail": "Given token not valid for any token type",
                    "code": "token_not_valid"
                }),
            ));
        }
        Ok(())
    }
}

fn error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

type Shared = State<Arc<Backend>>;

async fn login(State(backend): Shared, Json(body): Json<Value>) -> Response {
    if body["password"].as_str() != Some(PASSWORD) {
        return error(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "No active account found with the given credentials"}),
        );
    }
    let access = backend.access.lock().clone();
    let refresh = backend.refresh.lock().clone();
    let company = backend.login_company.lock().clone();
    Json(json!({
        "access": access,
        "refresh": refresh,
        "companies": [{"id": company, "name": "Acme", "role": "admin"}],
        "company_id": company
    }))
    .into_response()
}

async fn logout(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Err(denied) = backend.authorize(&headers) {
        return denied;
    }
    backend.logout_calls.fetch_add(1, Ordering::SeqCst);
    if backend.fail_logout.load(Ordering::SeqCst) {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Token blacklist unavailable"}),
        );
    }
    StatusCode::RESET_CONTENT.into_response()
}

async fn refresh(State(backend): Shared, Json(body): Json<Value>) -> Response {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // Long enough for concurrent 401s to queue behind this refresh
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mode = *backend.refresh_mode.lock();
    let current = backend.refresh.lock().clone();
    if mode == RefreshMode::Reject || body["refresh"].as_str() != Some(current.as_str()) {
        return error(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}),
        );
    }

    let n = backend.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let access = format!("access-{}", n);
    *backend.access.lock() = access.clone();
    match mode {
        RefreshMode::Rotate => {
            let rotated = format!("refresh-{}", n);
            *backend.refresh.lock() = rotated.clone();
            Json(json!({"access": access, "refresh": rotated})).into_response()
        }
        _ => Json(json!({"access": access})).into_response(),
    }
}

async fn me(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Err(denied) = backend.authorize(&headers) {
        return denied;
    }
    backend.me_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({"id": "u-1", "email": "alice@example.com", "first_name": "Alice"})).into_response()
}

async fn list_evidence(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Err(denied) = backend.authorize(&headers) {
        return denied;
    }
    backend.evidence_list_calls.fetch_add(1, Ordering::SeqCst);
    let count = backend.evidence_count.load(Ordering::SeqCst);
    let delay = backend.evidence_list_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    Json(json!({
        "count": count,
        "next": null,
        "previous": null,
        "results": [{"id": "e-1", "name": "Firewall ruleset", "verification_status": "pending"}]
    }))
    .into_response()
}

async fn upload_evidence(
    State(backend): Shared,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Err(denied) = backend.authorize(&headers) {
        return denied;
    }
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push(Part {
            name,
            file_name,
            content_type,
            data,
        });
    }
    let name = parts
        .iter()
        .find(|p| p.name == "name")
        .map(Part::text)
        .unwrap_or_default();
    *backend.upload_parts.lock() = parts;
    backend.evidence_count.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::CREATED,
        Json(json!({"id": "e-2", "name": name, "verification_status": "pending"})),
    )
        .into_response()
}

async fn gap_analysis(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Err(denied) = backend.authorize(&headers) {
        return denied;
    }
    error(
        StatusCode::NOT_FOUND,
        json!({"error": "No compliance result found for this framework"}),
    )
}

async fn calculate(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Err(denied) = backend.authorize(&headers) {
        return denied;
    }
    error(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "Calculation failed: division by zero"}),
    )
}

async fn download_report(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Err(denied) = backend.authorize(&headers) {
        return denied;
    }
    (
        [
            (CONTENT_TYPE, "application/pdf"),
            (CONTENT_DISPOSITION, "attachment; filename=\"q3-summary.pdf\""),
        ],
        b"%PDF-1.7".to_vec(),
    )
        .into_response()
}

async fn list_departments(
    State(backend): Shared,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(denied) = backend.authorize(&headers) {
        return denied;
    }
    backend.department_page_calls.fetch_add(1, Ordering::SeqCst);
    let page: usize = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let next = (page < DEPARTMENT_PAGES)
        .then(|| format!("http://testserver/api/organizations/departments/?page={}", page + 1));
    Json(json!({
        "count": DEPARTMENT_PAGES,
        "next": next,
        "previous": null,
        "results": [{"id": format!("d-{}", page), "name": format!("Department {}", page)}]
    }))
    .into_response()
}

pub fn router(backend: Arc<Backend>) -> Router {
    Router::new()
        .route("/api/auth/token/", post(login))
        .route("/api/auth/logout/", post(logout))
        .route("/api/organizations/departments/", get(list_departments))
        .route("/api/auth/token/refresh/", post(refresh))
        .route("/api/auth/me/", get(me))
        .route(
            "/api/evidence/evidence/",
            get(list_evidence).post(upload_evidence),
        )
        .route("/api/compliance/results/gap_analysis/", get(gap_analysis))
        .route("/api/compliance/results/calculate/", post(calculate))
        .route(
            "/api/compliance/reports/:id/download/",
            get(download_report),
        )
        .with_state(backend)
}

/// Serve the fake on an ephemeral port and return its API base URL.
pub async fn spawn(backend: Arc<Backend>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let app = router(backend);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve fake backend");
    });
    format!("http://{}/api", addr)
}

pub fn config(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

pub fn uncached_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        cache: CacheConfig {
            enabled: false,
            ..Default::default()
        },
        ..config(base_url)
    }
}

/// A session for company `c-1` holding the given tokens.
pub fn session(access: &str, refresh: Option<&str>) -> Session {
    let mut session = Session::new(SessionTokens::new(
        access,
        refresh.map(str::to_string),
        CredentialSource::Programmatic,
    ));
    session.user_email = Some("alice@example.com".to_string());
    session.company_id = Some(CompanyId::from("c-1"));
    session
}

pub fn client_with(config: ClientConfig, store: Arc<dyn SessionStore>) -> ApiClient {
    ApiClient::builder()
        .config(config)
        .store(store)
        .build()
        .expect("build client")
}

/// A client whose stored access token the backend no longer accepts.
pub fn stale_client(base_url: &str) -> (ApiClient, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::with_session(session(
        "access-stale",
        Some("refresh-1"),
    )));
    let client = client_with(uncached_config(base_url), store.clone());
    (client, store)
}
