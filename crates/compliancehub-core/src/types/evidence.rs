//! Evidence files, control links, comments and analytics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::decimal;
use crate::ids::{AppliedControlId, CommentId, CompanyId, EvidenceId, EvidenceLinkId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Policy,
    Procedure,
    Screenshot,
    Report,
    Log,
    Certificate,
    Configuration,
    ScanResult,
    AuditReport,
    TrainingRecord,
    #[default]
    Other,
    #[serde(other)]
    Unknown,
}

impl EvidenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceType::Policy => "policy",
            EvidenceType::Procedure => "procedure",
            EvidenceType::Screenshot => "screenshot",
            EvidenceType::Report => "report",
            EvidenceType::Log => "log",
            EvidenceType::Certificate => "certificate",
            EvidenceType::Configuration => "configuration",
            EvidenceType::ScanResult => "scan_result",
            EvidenceType::AuditReport => "audit_report",
            EvidenceType::TrainingRecord => "training_record",
            EvidenceType::Other => "other",
            EvidenceType::Unknown => "unknown",
        }
    }
}

/// Review state of an evidence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    NeedsUpdate,
    #[serde(other)]
    Unknown,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
            VerificationStatus::NeedsUpdate => "needs_update",
            VerificationStatus::Unknown => "unknown",
        }
    }
}

/// An evidence record with file metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: EvidenceId,
    #[serde(default)]
    pub company: Option<CompanyId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Storage path of the file on the server
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub file_size_display: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_extension: String,
    #[serde(default)]
    pub file_hash: String,
    #[serde(default)]
    pub evidence_type: EvidenceType,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub validity_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub validity_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub uploaded_by: Option<UserId>,
    #[serde(default)]
    pub uploaded_by_email: Option<String>,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub verified_by: Option<UserId>,
    #[serde(default)]
    pub verified_by_email: Option<String>,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verification_notes: String,
    #[serde(default)]
    pub is_confidential: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub previous_version: Option<EvidenceId>,
    #[serde(default)]
    pub linked_controls_count: u32,
    #[serde(default)]
    pub is_expired: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An evidence record as listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSummary {
    pub id: EvidenceId,
    pub name: String,
    #[serde(default)]
    pub evidence_type: EvidenceType,
    #[serde(default)]
    pub file_extension: String,
    #[serde(default)]
    pub file_size_display: String,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub uploaded_by_email: Option<String>,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub validity_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Text fields sent alongside the file in an evidence upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceUpload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub evidence_type: EvidenceType,
    #[serde(default)]
    pub validity_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub validity_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_confidential: bool,
}

impl EvidenceUpload {
    pub fn new(name: impl Into<String>, evidence_type: EvidenceType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            evidence_type,
            validity_start_date: None,
            validity_end_date: None,
            is_confidential: false,
        }
    }

    /// Multipart text fields, in a stable order. Unset optional fields are
    /// left out.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("name".to_string(), self.name.clone()),
            ("evidence_type".to_string(), self.evidence_type.as_str().to_string()),
        ];
        if !self.description.is_empty() {
            fields.push(("description".to_string(), self.description.clone()));
        }
        if let Some(d) = self.validity_start_date {
            fields.push(("validity_start_date".to_string(), d.to_string()));
        }
        if let Some(d) = self.validity_end_date {
            fields.push(("validity_end_date".to_string(), d.to_string()));
        }
        if self.is_confidential {
            fields.push(("is_confidential".to_string(), "true".to_string()));
        }
        fields
    }
}

/// Editable metadata of an evidence record. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_type: Option<EvidenceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_confidential: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// How a piece of evidence supports a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    #[default]
    Implementation,
    Testing,
    Monitoring,
    Documentation,
    Audit,
    #[serde(other)]
    Unknown,
}

/// A link between evidence and an applied control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceLink {
    pub id: EvidenceLinkId,
    pub applied_control: AppliedControlId,
    #[serde(default)]
    pub control_code: String,
    #[serde(default)]
    pub control_name: String,
    pub evidence: EvidenceId,
    #[serde(default)]
    pub evidence_name: String,
    #[serde(default)]
    pub link_type: LinkType,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub linked_by: Option<UserId>,
    #[serde(default)]
    pub linked_by_email: Option<String>,
    #[serde(default)]
    pub relevance_score: Option<u8>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST evidence/control-evidence-links/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvidenceLink {
    pub applied_control: AppliedControlId,
    pub evidence: EvidenceId,
    pub link_type: LinkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<u8>,
}

/// Body of `POST evidence/control-evidence-links/bulk_link/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkLinkRequest {
    pub evidence_ids: Vec<EvidenceId>,
    pub control_ids: Vec<AppliedControlId>,
    pub link_type: LinkType,
}

/// Response of `bulk_link`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkLinkResponse {
    #[serde(default)]
    pub message: String,
    pub created_count: u32,
}

/// A comment on evidence. Top-level comments carry their replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceComment {
    pub id: CommentId,
    pub evidence: EvidenceId,
    #[serde(default)]
    pub author: Option<UserId>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub author_name: String,
    pub comment: String,
    #[serde(default)]
    pub parent: Option<CommentId>,
    #[serde(default)]
    pub replies: Vec<EvidenceComment>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST evidence/comments/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub evidence: EvidenceId,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<CommentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    View,
    Download,
    Preview,
    #[serde(other)]
    Unknown,
}

/// One access to an evidence file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessLog {
    pub id: String,
    pub evidence: EvidenceId,
    #[serde(default)]
    pub evidence_name: String,
    #[serde(default)]
    pub accessed_by: Option<UserId>,
    #[serde(default)]
    pub accessed_by_email: Option<String>,
    pub access_type: AccessType,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Company storage usage against the plan quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageQuota {
    #[serde(deserialize_with = "decimal::deserialize")]
    pub used_mb: f64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub quota_mb: f64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub available_mb: f64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub usage_percentage: f64,
    pub is_over_quota: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCount {
    pub evidence_type: EvidenceType,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationCount {
    pub verification_status: VerificationStatus,
    pub count: u32,
}

/// Response of `evidence/evidence/analytics/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceAnalytics {
    #[serde(default)]
    pub total_evidence: u32,
    #[serde(default)]
    pub by_type: Vec<TypeCount>,
    #[serde(default)]
    pub by_status: Vec<VerificationCount>,
    #[serde(default)]
    pub expired_count: u32,
    #[serde(default)]
    pub unlinked_count: u32,
    #[serde(default)]
    pub storage: Option<StorageQuota>,
}

/// A downloaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedFile {
    /// Name from `Content-Disposition`, if the server sent one
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_skip_unset() {
        let upload = EvidenceUpload::new("Access review Q1", EvidenceType::AuditReport);
        assert_eq!(
            upload.form_fields(),
            vec![
                ("name".to_string(), "Access review Q1".to_string()),
                ("evidence_type".to_string(), "audit_report".to_string()),
            ]
        );
    }

    #[test]
    fn test_form_fields_include_dates() {
        let mut upload = EvidenceUpload::new("Pen test", EvidenceType::ScanResult);
        upload.validity_end_date = NaiveDate::from_ymd_opt(2026, 1, 31);
        upload.is_confidential = true;
        let fields = upload.form_fields();
        assert!(fields.contains(&("validity_end_date".to_string(), "2026-01-31".to_string())));
        assert!(fields.contains(&("is_confidential".to_string(), "true".to_string())));
    }

    #[test]
    fn test_comment_replies_nest() {
        let c: EvidenceComment = serde_json::from_value(serde_json::json!({
            "id": "cm-1", "evidence": "e-1", "comment": "Needs signature",
            "author_name": "Ada Lovelace",
            "replies": [{"id": "cm-2", "evidence": "e-1", "comment": "Done", "parent": "cm-1", "replies": []}]
        }))
        .unwrap();
        assert_eq!(c.replies.len(), 1);
        assert_eq!(c.replies[0].parent, Some(CommentId::from("cm-1")));
    }

    #[test]
    fn test_quota_parses_numbers() {
        let q: StorageQuota = serde_json::from_value(serde_json::json!({
            "used_mb": 120.5, "quota_mb": 1024, "available_mb": 903.5,
            "usage_percentage": 11.77, "is_over_quota": false
        }))
        .unwrap();
        assert_eq!(q.quota_mb, 1024.0);
        assert!(!q.is_over_quota);
    }
}
