//! Evidence files, their control links and comments.
//!
//! The evidence endpoints only accept form bodies (multipart or
//! urlencoded), so even metadata-only calls such as `approve` go out as
//! multipart. Links and comments take JSON.

use compliancehub_core::{upload, validation};
use compliancehub_core::{
    AccessLog, BulkLinkRequest, BulkLinkResponse, CommentId, CoreError, DownloadedFile, Evidence,
    EvidenceAnalytics, EvidenceComment, EvidenceId, EvidenceLink, EvidenceLinkId, EvidenceSummary,
    EvidenceUpdate, EvidenceUpload, ListQuery, NewComment, NewEvidenceLink, Page, StorageQuota,
};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use super::{action, detail, route};
use crate::error::{ClientError, Result};
use crate::transport::{MultipartSpec, RequestSpec, Transport};

const PREFIX: &str = "evidence/";
const EVIDENCE: &str = "evidence/evidence/";
const LINKS: &str = "evidence/control-evidence-links/";
const COMMENTS: &str = "evidence/comments/";

/// Links change control and compliance numbers too.
const LINK_INVALIDATES: &[&str] = &[PREFIX, "controls/", "compliance/"];

/// A file to upload, held in memory.
#[derive(Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk; the upload is named after its file name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::invalid("file", "Path has no usable file name."))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { name, bytes })
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Size and type checks the server would otherwise reject.
    pub fn validate(&self) -> Result<()> {
        upload::validate(&self.name, self.size())?;
        Ok(())
    }
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("size", &upload::display_size(self.size()))
            .finish()
    }
}

fn with_file(spec: MultipartSpec, file: &UploadFile) -> MultipartSpec {
    spec.file(
        "file",
        file.name.clone(),
        upload::content_type(&file.name),
        file.bytes.clone(),
    )
}

/// Flatten a serializable value into multipart text fields. Nulls are
/// skipped; nested values are sent as JSON text.
fn form_fields<T: Serialize>(value: &T) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(value)
        .map_err(|e| ClientError::Parse(format!("cannot encode form: {}", e)))?;
    let Value::Object(map) = value else {
        return Err(ClientError::Parse("form body must be an object".to_string()));
    };
    Ok(map
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, text)
        })
        .collect())
}

pub struct EvidenceApi<'a> {
    transport: &'a Transport,
}

impl<'a> EvidenceApi<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    pub fn links(&self) -> EvidenceLinksApi<'a> {
        EvidenceLinksApi {
            transport: self.transport,
        }
    }

    pub fn comments(&self) -> CommentsApi<'a> {
        CommentsApi {
            transport: self.transport,
        }
    }

    /// Filter with `evidence_type`, `verification_status`, `is_valid`,
    /// `uploaded_by` or `is_confidential`; search covers name, description
    /// and tags.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<EvidenceSummary>> {
        self.transport.get(EVIDENCE, query).await
    }

    pub async fn get(&self, id: &EvidenceId) -> Result<Evidence> {
        self.transport.get(&detail(EVIDENCE, id), &ListQuery::new()).await
    }

    /// Upload a new evidence file. The file is checked against the size
    /// limit and extension allow-list before anything is sent.
    pub async fn upload(&self, meta: &EvidenceUpload, file: &UploadFile) -> Result<Evidence> {
        validation::require_non_blank("name", &meta.name)?;
        file.validate()?;
        let body = with_file(MultipartSpec::new(meta.form_fields()), file);
        let spec = RequestSpec::post(EVIDENCE)
            .multipart(body)
            .invalidates(&[PREFIX]);
        self.transport.send(spec).await
    }

    pub async fn update(&self, id: &EvidenceId, update: &EvidenceUpdate) -> Result<Evidence> {
        let fields = form_fields(update)?;
        if fields.is_empty() {
            return Err(CoreError::invalid("evidence", "Nothing to update.").into());
        }
        let spec = RequestSpec::patch(detail(EVIDENCE, id))
            .multipart(MultipartSpec::new(fields))
            .invalidates(&[PREFIX]);
        self.transport.send(spec).await
    }

    pub async fn delete(&self, id: &EvidenceId) -> Result<()> {
        let spec = RequestSpec::delete(detail(EVIDENCE, id)).invalidates(LINK_INVALIDATES);
        self.transport.send_no_content(spec).await
    }

    /// Fetch the file. The server logs the download.
    pub async fn download(&self, id: &EvidenceId) -> Result<DownloadedFile> {
        let spec = RequestSpec::get(action(EVIDENCE, id, "download"));
        self.transport.download(spec).await
    }

    pub async fn approve(&self, id: &EvidenceId, notes: &str) -> Result<Evidence> {
        let body = MultipartSpec::new(vec![("notes".to_string(), notes.to_string())]);
        let spec = RequestSpec::post(action(EVIDENCE, id, "approve"))
            .multipart(body)
            .invalidates(LINK_INVALIDATES);
        self.transport.send(spec).await
    }

    /// Reject evidence. A reason is mandatory.
    pub async fn reject(&self, id: &EvidenceId, reason: &str) -> Result<Evidence> {
        let reason = validation::require_non_blank("reason", reason)
            .map_err(|_| CoreError::invalid("reason", "Rejection reason is required"))?;
        let body = MultipartSpec::new(vec![("reason".to_string(), reason.to_string())]);
        let spec = RequestSpec::post(action(EVIDENCE, id, "reject"))
            .multipart(body)
            .invalidates(LINK_INVALIDATES);
        self.transport.send(spec).await
    }

    /// Upload a replacement file as a new version. The version number goes
    /// from `M.m` to `M.(m+1)`, or to `(M+1).0` when `major`.
    pub async fn create_version(
        &self,
        id: &EvidenceId,
        file: &UploadFile,
        description: Option<&str>,
        major: bool,
    ) -> Result<Evidence> {
        file.validate()?;
        let mut fields = Vec::new();
        if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
            fields.push(("description".to_string(), description.to_string()));
        }
        // Any non-empty form value reads as true server-side
        if major {
            fields.push(("major_version".to_string(), "true".to_string()));
        }
        let body = with_file(MultipartSpec::new(fields), file);
        let spec = RequestSpec::post(action(EVIDENCE, id, "create_version"))
            .multipart(body)
            .invalidates(&[PREFIX]);
        self.transport.send(spec).await
    }

    /// Earlier and later versions of the record.
    pub async fn versions(&self, id: &EvidenceId) -> Result<Vec<EvidenceSummary>> {
        self.transport
            .get(&action(EVIDENCE, id, "versions"), &ListQuery::new())
            .await
    }

    /// The 50 most recent accesses. Never cached, since reading the
    /// evidence itself adds entries.
    pub async fn access_logs(&self, id: &EvidenceId) -> Result<Vec<AccessLog>> {
        self.transport
            .get_fresh(&action(EVIDENCE, id, "access_logs"), &ListQuery::new())
            .await
    }

    pub async fn analytics(&self) -> Result<EvidenceAnalytics> {
        self.transport
            .get(&route(EVIDENCE, "analytics"), &ListQuery::new())
            .await
    }

    pub async fn storage_quota(&self) -> Result<StorageQuota> {
        self.transport
            .get(&route(EVIDENCE, "storage_quota"), &ListQuery::new())
            .await
    }

    /// Evidence past its validity end date.
    pub async fn expired(&self) -> Result<Vec<EvidenceSummary>> {
        self.transport
            .get(&route(EVIDENCE, "expired"), &ListQuery::new())
            .await
    }

    pub async fn pending_approval(&self) -> Result<Vec<EvidenceSummary>> {
        self.transport
            .get(&route(EVIDENCE, "pending_approval"), &ListQuery::new())
            .await
    }

    /// Evidence not linked to any control.
    pub async fn unlinked(&self) -> Result<Vec<EvidenceSummary>> {
        self.transport
            .get(&route(EVIDENCE, "unlinked"), &ListQuery::new())
            .await
    }
}

/// Evidence to applied-control links.
pub struct EvidenceLinksApi<'a> {
    transport: &'a Transport,
}

impl EvidenceLinksApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Page<EvidenceLink>> {
        self.transport.get(LINKS, query).await
    }

    pub async fn link(&self, request: &NewEvidenceLink) -> Result<EvidenceLink> {
        let spec = RequestSpec::post(LINKS)
            .json(request)?
            .invalidates(LINK_INVALIDATES);
        self.transport.send(spec).await
    }

    pub async fn unlink(&self, id: &EvidenceLinkId) -> Result<()> {
        let spec = RequestSpec::delete(detail(LINKS, id)).invalidates(LINK_INVALIDATES);
        self.transport.send_no_content(spec).await
    }

    /// Link every evidence item to every control. Existing links are
    /// skipped by the server.
    pub async fn bulk_link(&self, request: &BulkLinkRequest) -> Result<BulkLinkResponse> {
        if request.evidence_ids.is_empty() || request.control_ids.is_empty() {
            return Err(CoreError::invalid(
                "bulk_link",
                "evidence_ids and control_ids are required",
            )
            .into());
        }
        let spec = RequestSpec::post(route(LINKS, "bulk_link"))
            .json(request)?
            .invalidates(LINK_INVALIDATES);
        self.transport.send(spec).await
    }
}

/// Discussion threads on evidence.
pub struct CommentsApi<'a> {
    transport: &'a Transport,
}

impl CommentsApi<'_> {
    pub async fn list(&self, evidence: &EvidenceId) -> Result<Page<EvidenceComment>> {
        let query = ListQuery::new().filter("evidence", evidence);
        self.transport.get(COMMENTS, &query).await
    }

    pub async fn add(&self, comment: &NewComment) -> Result<EvidenceComment> {
        validation::require_non_blank("comment", &comment.comment)?;
        let spec = RequestSpec::post(COMMENTS)
            .json(comment)?
            .invalidates(&[COMMENTS, EVIDENCE]);
        self.transport.send(spec).await
    }

    pub async fn delete(&self, id: &CommentId) -> Result<()> {
        let spec = RequestSpec::delete(detail(COMMENTS, id)).invalidates(&[COMMENTS, EVIDENCE]);
        self.transport.send_no_content(spec).await
    }
}
