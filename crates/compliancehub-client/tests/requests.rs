//! Request shaping and error surfacing against the fake backend.

mod common;

use common::Backend;
use compliancehub_client::{ClientError, MemorySessionStore, SessionStore, UploadFile};
use compliancehub_core::{
    CompanyAccess, CompanyId, CreateInvitation, Department, EvidenceId, EvidenceType,
    EvidenceUpload, FrameworkId, ListQuery, MembershipId, ReportId, Role,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
async fn test_login_stores_session_and_selects_company() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let store = Arc::new(MemorySessionStore::new());
    let client = common::client_with(common::config(&url), store.clone());

    let session = client
        .auth()
        .login("alice@example.com", common::PASSWORD)
        .await
        .unwrap();
    assert_eq!(session.company_id, Some(CompanyId::from("c-1")));
    assert_eq!(session.companies.len(), 1);

    let stored = store.load().await.unwrap().unwrap();
    assert_eq!(stored.user_email.as_deref(), Some("alice@example.com"));
    assert_eq!(stored.tokens.access(), "access-1");

    client.profile().me().await.unwrap();
    assert_eq!(backend.last_company_header().as_deref(), Some("c-1"));
}

#[tokio::test]
async fn test_wrong_password_surfaces_server_message() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let store = Arc::new(MemorySessionStore::new());
    let client = common::client_with(common::config(&url), store.clone());

    let err = client
        .auth()
        .login("alice@example.com", "hunter2")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(
        err.user_message(),
        "No active account found with the given credentials"
    );
    assert!(store.load().await.unwrap().is_none());
    // A failed login is not a refresh trigger
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn test_selected_company_is_sent_as_header() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let store = Arc::new(MemorySessionStore::with_session(common::session(
        "access-1",
        Some("refresh-1"),
    )));
    let client = common::client_with(common::uncached_config(&url), store.clone());

    client.profile().me().await.unwrap();
    assert_eq!(backend.last_company_header().as_deref(), Some("c-1"));

    client
        .organizations()
        .select_company(&CompanyId::from("c-2"))
        .await
        .unwrap();
    client.profile().me().await.unwrap();
    assert_eq!(backend.last_company_header().as_deref(), Some("c-2"));

    let stored = store.load().await.unwrap().unwrap();
    assert_eq!(stored.company_id, Some(CompanyId::from("c-2")));
}

#[tokio::test]
async fn test_error_bodies_become_messages() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let store = Arc::new(MemorySessionStore::with_session(common::session(
        "access-1",
        Some("refresh-1"),
    )));
    let client = common::client_with(common::config(&url), store);
    let framework = FrameworkId::from("f-1");

    let err = client
        .compliance()
        .gap_analysis(&framework)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(
        err.user_message(),
        "No compliance result found for this framework"
    );

    let err = client
        .compliance()
        .calculate(&framework, None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), "Calculation failed: division by zero");
}

#[tokio::test]
async fn test_upload_sends_file_part_and_text_fields() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let store = Arc::new(MemorySessionStore::with_session(common::session(
        "access-1",
        Some("refresh-1"),
    )));
    let client = common::client_with(common::config(&url), store);

    let mut meta = EvidenceUpload::new("Firewall ruleset", EvidenceType::Configuration);
    meta.description = "Production edge firewall".to_string();
    let file = UploadFile::new("rules.json", br#"{"allow": ["443/tcp"]}"#.to_vec());

    let evidence = client.evidence().upload(&meta, &file).await.unwrap();
    assert_eq!(evidence.name, "Firewall ruleset");

    let parts = backend.upload_parts.lock().clone();
    let file_part = parts.iter().find(|p| p.name == "file").unwrap();
    assert_eq!(file_part.file_name.as_deref(), Some("rules.json"));
    assert_eq!(file_part.content_type.as_deref(), Some("application/json"));
    assert_eq!(file_part.data, file.bytes);

    let text = |name: &str| parts.iter().find(|p| p.name == name).map(|p| p.text());
    assert_eq!(text("name").as_deref(), Some("Firewall ruleset"));
    assert_eq!(text("evidence_type").as_deref(), Some("configuration"));
    assert_eq!(text("description").as_deref(), Some("Production edge firewall"));
    assert_eq!(text("is_confidential"), None);
}

#[tokio::test]
async fn test_disallowed_upload_never_reaches_server() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let store = Arc::new(MemorySessionStore::with_session(common::session(
        "access-1",
        Some("refresh-1"),
    )));
    let client = common::client_with(common::config(&url), store);

    let meta = EvidenceUpload::new("Installer", EvidenceType::Other);
    let file = UploadFile::new("setup.exe", vec![0x4d, 0x5a]);
    let err = client.evidence().upload(&meta, &file).await.unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(backend.authenticated_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_blank_rejection_reason_is_refused_locally() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let store = Arc::new(MemorySessionStore::with_session(common::session(
        "access-1",
        Some("refresh-1"),
    )));
    let client = common::client_with(common::config(&url), store);

    let err = client
        .evidence()
        .reject(&EvidenceId::from("e-1"), "   ")
        .await
        .unwrap_err();

    assert!(err.user_message().contains("Rejection reason is required"));
    assert_eq!(backend.authenticated_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_report_download_keeps_file_name() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let store = Arc::new(MemorySessionStore::with_session(common::session(
        "access-1",
        Some("refresh-1"),
    )));
    let client = common::client_with(common::config(&url), store);

    let file = client
        .compliance()
        .reports()
        .download(&ReportId::from("r-9"))
        .await
        .unwrap();

    assert_eq!(file.filename.as_deref(), Some("q3-summary.pdf"));
    assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(file.bytes, b"%PDF-1.7".to_vec());
}

#[tokio::test]
async fn test_relogin_sends_new_company_not_previous_selection() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let store = Arc::new(MemorySessionStore::new());
    let client = common::client_with(common::config(&url), store.clone());

    client
        .auth()
        .login("alice@example.com", common::PASSWORD)
        .await
        .unwrap();
    client
        .organizations()
        .select_company(&CompanyId::from("c-9"))
        .await
        .unwrap();
    client.profile().me().await.unwrap();
    assert_eq!(backend.last_company_header().as_deref(), Some("c-9"));

    client.auth().logout().await.unwrap();
    *backend.login_company.lock() = "c-2".to_string();
    let session = client
        .auth()
        .login("alice@example.com", common::PASSWORD)
        .await
        .unwrap();
    assert_eq!(session.company_id, Some(CompanyId::from("c-2")));

    client.profile().me().await.unwrap();
    assert_eq!(backend.last_company_header().as_deref(), Some("c-2"));
    assert_eq!(
        client.organizations().current().await.unwrap(),
        Some(CompanyId::from("c-2"))
    );
}

#[tokio::test]
async fn test_logout_clears_session_when_server_fails() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let store = Arc::new(MemorySessionStore::with_session(common::session(
        "access-1",
        Some("refresh-1"),
    )));
    let client = common::client_with(common::uncached_config(&url), store.clone());
    backend.fail_logout.store(true, Ordering::SeqCst);

    let err = client.auth().logout().await.unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Token blacklist unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(backend.logout_calls.load(Ordering::SeqCst), 1);
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_logout_reaches_server_and_clears_session() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let store = Arc::new(MemorySessionStore::with_session(common::session(
        "access-1",
        Some("refresh-1"),
    )));
    let client = common::client_with(common::uncached_config(&url), store.clone());

    client.auth().logout().await.unwrap();

    assert_eq!(backend.logout_calls.load(Ordering::SeqCst), 1);
    assert!(store.load().await.unwrap().is_none());
}

/// A client logged in to `c-1` with the given role there.
fn client_with_role(url: &str, role: Role) -> compliancehub_client::ApiClient {
    let mut session = common::session("access-1", Some("refresh-1"));
    session.companies = vec![CompanyAccess {
        id: CompanyId::from("c-1"),
        name: "Acme".to_string(),
        role,
    }];
    let store = Arc::new(MemorySessionStore::with_session(session));
    common::client_with(common::uncached_config(url), store)
}

#[tokio::test]
async fn test_role_checks_refuse_without_request() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;

    let analyst = client_with_role(&url, Role::Analyst);
    let err = analyst
        .team()
        .change_role(&MembershipId::from("m-1"), Role::Viewer)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Forbidden(_)), "{err:?}");

    let err = analyst
        .team()
        .invite(&CreateInvitation {
            email: Some("bob@example.com".to_string()),
            role: Role::Viewer,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Forbidden(_)), "{err:?}");

    let admin = client_with_role(&url, Role::Admin);
    let err = admin
        .team()
        .change_role(&MembershipId::from("m-1"), Role::Owner)
        .await
        .unwrap_err();
    match err {
        ClientError::Forbidden(message) => {
            assert_eq!(message, "Only owners can grant the owner role.")
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = admin
        .team()
        .invite(&CreateInvitation {
            email: None,
            role: Role::Owner,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Forbidden(_)), "{err:?}");

    assert_eq!(backend.authenticated_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_collect_pages_follows_next() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let client = client_with_role(&url, Role::Viewer);

    let all: Vec<Department> = client
        .transport()
        .collect_pages("organizations/departments/", &ListQuery::new(), 20)
        .await
        .unwrap();

    let ids: Vec<&str> = all.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["d-1", "d-2", "d-3"]);
    assert_eq!(
        backend.department_page_calls.load(Ordering::SeqCst),
        common::DEPARTMENT_PAGES
    );
}

#[tokio::test]
async fn test_collect_pages_stops_at_limit() {
    let backend = Backend::new();
    let url = common::spawn(backend.clone()).await;
    let client = client_with_role(&url, Role::Viewer);

    let first_two: Vec<Department> = client
        .transport()
        .collect_pages("organizations/departments/", &ListQuery::new(), 2)
        .await
        .unwrap();

    assert_eq!(first_two.len(), 2);
    assert_eq!(backend.department_page_calls.load(Ordering::SeqCst), 2);
}
