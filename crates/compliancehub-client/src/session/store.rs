//! Session persistence.

use async_trait::async_trait;
use compliancehub_core::{CompanyAccess, CompanyId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{CredentialSource, Session, SessionTokens};
use crate::error::ClientError;

/// Where the client keeps its session between requests.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The stored session, or `None` when logged out.
    async fn load(&self) -> Result<Option<Session>, ClientError>;

    async fn save(&self, session: &Session) -> Result<(), ClientError>;

    /// Forget the session. Clearing an empty store is not an error.
    async fn clear(&self) -> Result<(), ClientError>;
}

/// In-process store. The session lives as long as the client.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, ClientError> {
        Ok(self.session.read().clone())
    }

    async fn save(&self, session: &Session) -> Result<(), ClientError> {
        *self.session.write() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        *self.session.write() = None;
        Ok(())
    }
}

/// JSON file store, used by the CLI so a login survives between runs.
///
/// The file holds live tokens: on Unix it is created readable by the owner
/// only, and it is replaced atomically through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

/// On-disk shape of a session.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
    #[serde(default)]
    user_email: Option<String>,
    #[serde(default)]
    company_id: Option<CompanyId>,
    #[serde(default)]
    companies: Vec<CompanyAccess>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>, ClientError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = serde_json::from_str(&text).map_err(|e| {
            ClientError::Parse(format!("session file {}: {}", self.path.display(), e))
        })?;
        Ok(Some(Session {
            tokens: SessionTokens::new(stored.access, stored.refresh, CredentialSource::File),
            user_email: stored.user_email,
            company_id: stored.company_id,
            companies: stored.companies,
        }))
    }

    async fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let stored = StoredSession {
            access: session.tokens.access().to_string(),
            refresh: session.tokens.refresh().map(str::to_string),
            user_email: session.user_email.clone(),
            company_id: session.company_id.clone(),
            companies: session.companies.clone(),
        };
        let body = serde_json::to_vec_pretty(&stored)
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        let temp = self.temp_path();
        write_private(&temp, &body).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_private(path: &Path, body: &[u8]) -> Result<(), ClientError> {
    use tokio::io::AsyncWriteExt;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(body).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliancehub_core::Role;

    fn session() -> Session {
        Session {
            tokens: SessionTokens::new("acc", Some("ref".into()), CredentialSource::Login),
            user_email: Some("ada@acme.io".into()),
            company_id: Some(CompanyId::new("c1")),
            companies: vec![CompanyAccess {
                id: CompanyId::new("c1"),
                name: "Acme".into(),
                role: Role::Manager,
            }],
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("chub-store-{}-{}", std::process::id(), name))
            .join("session.json")
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemorySessionStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&session()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.tokens.access(), "acc");

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_persists_session() {
        let path = temp_file("persist");
        let store = FileSessionStore::new(&path);
        assert!(store.load().await.unwrap().is_none());

        store.save(&session()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.tokens.access(), "acc");
        assert_eq!(loaded.tokens.refresh(), Some("ref"));
        assert_eq!(loaded.tokens.source(), CredentialSource::File);
        assert_eq!(loaded.current_role(), Some(Role::Manager));
        assert!(!store.temp_path().exists());

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_file("mode");
        let store = FileSessionStore::new(&path);
        store.save(&session()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_parse_error() {
        let path = temp_file("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let err = FileSessionStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
